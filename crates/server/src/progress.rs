use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use raboneko_core::NewProgressLog;
use raboneko_db::ProgressLogRepository;
use raboneko_discord::api::{ApiError, DiscordApi, OutgoingMessage};
use raboneko_discord::commands::{
    parse_progress_args, CommandInvocation, CommandServiceError, ProgressCommandService,
};
use raboneko_discord::embed::{Embed, EmbedBuilder, COLOR_GREEN};

const CONFUSED_REPLY: &str = "Sorry, I couldn't understand your request for some reason >_<";
const SUBMITTED_REPLY: &str = "Thanks for submitting your progress log! I'll add it to our weekly report :3\nFor now, here's a preview of your log:";
const FORWARD_CONTENT: &str = "Yay, a progress log just got submitted~";

/// The `/progress` flow: validate the invoker, persist the log, answer with
/// a preview, and forward the same preview to the updates channel.
pub struct ProgressService<R, A> {
    repository: Arc<R>,
    api: Arc<A>,
    updates_channel_id: String,
}

impl<R, A> ProgressService<R, A>
where
    R: ProgressLogRepository,
    A: DiscordApi,
{
    pub fn new(repository: Arc<R>, api: Arc<A>, updates_channel_id: impl Into<String>) -> Self {
        Self { repository, api, updates_channel_id: updates_channel_id.into() }
    }

    async fn friendly_reply(&self, invocation: &CommandInvocation) -> Result<(), ApiError> {
        self.api
            .create_followup(&invocation.interaction_token, &OutgoingMessage::text(CONFUSED_REPLY))
            .await
    }
}

#[async_trait]
impl<R, A> ProgressCommandService for ProgressService<R, A>
where
    R: ProgressLogRepository + 'static,
    A: DiscordApi + 'static,
{
    async fn submit_progress(
        &self,
        invocation: &CommandInvocation,
    ) -> Result<(), CommandServiceError> {
        // A missing member means the invocation did not come from inside the
        // guild (a DM or a malformed context). Friendly reply, no write.
        let Some(member) = &invocation.member else {
            self.friendly_reply(invocation)
                .await
                .map_err(|error| CommandServiceError::Api(error.to_string()))?;
            return Ok(());
        };

        let args = match parse_progress_args(invocation) {
            Ok(args) => args,
            Err(error) => {
                warn!(user_id = %invocation.user.id, error = %error, "rejecting malformed progress submission");
                self.friendly_reply(invocation)
                    .await
                    .map_err(|error| CommandServiceError::Api(error.to_string()))?;
                return Ok(());
            }
        };

        let log = self
            .repository
            .create(NewProgressLog {
                user_id: invocation.user.id.clone(),
                log_type: args.log_type,
                product: args.product,
                summary: args.summary,
            })
            .await
            .map_err(|error| CommandServiceError::Persistence(error.to_string()))?;

        info!(log_id = log.id, product = log.product.label(), "progress log submitted");

        let preview = preview_embed(member.display_name(), member.user.avatar_url(), &log);

        self.api
            .create_followup(
                &invocation.interaction_token,
                &OutgoingMessage::text(SUBMITTED_REPLY).with_embed(preview.clone()),
            )
            .await
            .map_err(|error| CommandServiceError::Api(error.to_string()))?;

        let updates = self
            .api
            .fetch_channel(&self.updates_channel_id)
            .await
            .map_err(|error| CommandServiceError::Api(error.to_string()))?;
        if !updates.is_text() {
            return Err(CommandServiceError::NotATextChannel(self.updates_channel_id.clone()));
        }

        self.api
            .create_message(
                &self.updates_channel_id,
                &OutgoingMessage::text(FORWARD_CONTENT).with_embed(preview),
            )
            .await
            .map_err(|error| CommandServiceError::Api(error.to_string()))?;

        Ok(())
    }
}

fn preview_embed(
    display_name: &str,
    avatar_url: Option<String>,
    log: &raboneko_core::ProgressLog,
) -> Embed {
    EmbedBuilder::new()
        .title("Progress Log Submitted")
        .color(COLOR_GREEN)
        .author(display_name, avatar_url)
        .description(log.summary.clone())
        .footer(format!("ID: #{}", log.id))
        .inline_field("Product", log.product.label())
        .inline_field("Type", log.log_type.label())
        .build()
}
