use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use raboneko_core::{LogType, Product};

use crate::api::{GuildMember, User};

/// Application command option type for string-valued options.
const OPTION_TYPE_STRING: u8 = 3;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommandChoice {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommandOption {
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: String,
    pub description: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<CommandChoice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommandRegistration {
    pub name: String,
    pub description: String,
    pub dm_permission: bool,
    pub options: Vec<CommandOption>,
}

/// The `/progress` registration payload. Choices carry enum wire values so
/// the invocation can be parsed back without free-text matching.
pub fn progress_command() -> CommandRegistration {
    CommandRegistration {
        name: "progress".to_owned(),
        description: "Track progress for Fyra projects, per week".to_owned(),
        dm_permission: false,
        options: vec![
            CommandOption {
                kind: OPTION_TYPE_STRING,
                name: "product".to_owned(),
                description: "The product the log is for".to_owned(),
                required: true,
                choices: Product::ALL
                    .into_iter()
                    .map(|product| CommandChoice {
                        name: product.label().to_owned(),
                        value: product.wire().to_string(),
                    })
                    .collect(),
            },
            CommandOption {
                kind: OPTION_TYPE_STRING,
                name: "type".to_owned(),
                description: "The type of progress log".to_owned(),
                required: true,
                choices: LogType::ALL
                    .into_iter()
                    .map(|log_type| CommandChoice {
                        name: log_type.label().to_owned(),
                        value: log_type.wire().to_string(),
                    })
                    .collect(),
            },
            CommandOption {
                kind: OPTION_TYPE_STRING,
                name: "summary".to_owned(),
                description: "The summary of your progress".to_owned(),
                required: true,
                choices: Vec::new(),
            },
        ],
    }
}

/// One received slash-command invocation, as delivered by the gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandInvocation {
    pub command: String,
    pub interaction_token: String,
    pub guild_id: Option<String>,
    pub channel_id: String,
    pub user: User,
    /// Present only when the command was invoked from inside a guild.
    pub member: Option<GuildMember>,
    pub options: Vec<InvocationOption>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvocationOption {
    pub name: String,
    pub value: String,
}

impl CommandInvocation {
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|option| option.name == name)
            .map(|option| option.value.as_str())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("unsupported command `{0}`")]
    UnsupportedCommand(String),
    #[error("missing required option `{0}`")]
    MissingOption(&'static str),
    #[error("option `{name}` carried an unknown value `{value}`")]
    UnknownChoice { name: &'static str, value: String },
}

/// Validated `/progress` arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressArgs {
    pub product: Product,
    pub log_type: LogType,
    pub summary: String,
}

/// Parses and validates the choice values. The command framework promises to
/// only deliver declared choices, but that promise is not trusted here:
/// unknown ordinals are rejected instead of decoded into a broken variant.
pub fn parse_progress_args(invocation: &CommandInvocation) -> Result<ProgressArgs, CommandParseError> {
    if invocation.command != "progress" {
        return Err(CommandParseError::UnsupportedCommand(invocation.command.clone()));
    }

    let product_raw = invocation
        .option("product")
        .ok_or(CommandParseError::MissingOption("product"))?;
    let product = product_raw
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|wire| Product::from_wire(wire).ok())
        .ok_or_else(|| CommandParseError::UnknownChoice {
            name: "product",
            value: product_raw.to_owned(),
        })?;

    let log_type_raw = invocation
        .option("type")
        .ok_or(CommandParseError::MissingOption("type"))?;
    let log_type = log_type_raw
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|wire| LogType::from_wire(wire).ok())
        .ok_or_else(|| CommandParseError::UnknownChoice {
            name: "type",
            value: log_type_raw.to_owned(),
        })?;

    let summary = invocation
        .option("summary")
        .ok_or(CommandParseError::MissingOption("summary"))?
        .to_owned();

    Ok(ProgressArgs { product, log_type, summary })
}

#[derive(Debug, Error)]
pub enum CommandServiceError {
    #[error(transparent)]
    Parse(#[from] CommandParseError),
    #[error("persistence failed: {0}")]
    Persistence(String),
    #[error("chat api failed: {0}")]
    Api(String),
    #[error("channel `{0}` is not a text channel")]
    NotATextChannel(String),
}

/// The `/progress` flow behind the dispatcher: validate, persist, preview,
/// forward. Implementations own their repository and api handles.
#[async_trait]
pub trait ProgressCommandService: Send + Sync {
    async fn submit_progress(
        &self,
        invocation: &CommandInvocation,
    ) -> Result<(), CommandServiceError>;
}

#[derive(Default)]
pub struct NoopProgressCommandService;

#[async_trait]
impl ProgressCommandService for NoopProgressCommandService {
    async fn submit_progress(
        &self,
        invocation: &CommandInvocation,
    ) -> Result<(), CommandServiceError> {
        parse_progress_args(invocation)?;
        Ok(())
    }
}
