use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::commands::CommandRegistration;
use crate::embed::Embed;

pub const API_BASE_URL: &str = "https://discord.com/api/v10";
const CDN_BASE_URL: &str = "https://cdn.discordapp.com";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl User {
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar
            .as_ref()
            .map(|hash| format!("{CDN_BASE_URL}/avatars/{}/{hash}.png", self.id))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct GuildMember {
    pub user: User,
    #[serde(default)]
    pub nick: Option<String>,
}

impl GuildMember {
    /// Guild-scoped display name: nickname, then global name, then username.
    pub fn display_name(&self) -> &str {
        self.nick
            .as_deref()
            .or(self.user.global_name.as_deref())
            .unwrap_or(&self.user.username)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "u8")]
pub enum ChannelKind {
    GuildText,
    Dm,
    GuildVoice,
    GroupDm,
    GuildCategory,
    GuildAnnouncement,
    Other(u8),
}

impl From<u8> for ChannelKind {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::GuildText,
            1 => Self::Dm,
            2 => Self::GuildVoice,
            3 => Self::GroupDm,
            4 => Self::GuildCategory,
            5 => Self::GuildAnnouncement,
            other => Self::Other(other),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ChannelKind,
    #[serde(default)]
    pub name: Option<String>,
}

impl Channel {
    pub fn is_text(&self) -> bool {
        matches!(self.kind, ChannelKind::GuildText)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OutgoingMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self { content: Some(content.into()), embeds: Vec::new() }
    }

    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http transport failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api returned {status} for {context}: {body}")]
    Status { context: &'static str, status: u16, body: String },
}

/// Everything the bot consumes from the chat platform. Handlers receive an
/// implementation of this trait; the REST client below is the production one.
#[async_trait]
pub trait DiscordApi: Send + Sync {
    async fn fetch_guild_member(
        &self,
        guild_id: &str,
        user_id: &str,
    ) -> Result<GuildMember, ApiError>;

    async fn fetch_user(&self, user_id: &str) -> Result<User, ApiError>;

    async fn fetch_channel(&self, channel_id: &str) -> Result<Channel, ApiError>;

    async fn create_message(
        &self,
        channel_id: &str,
        message: &OutgoingMessage,
    ) -> Result<(), ApiError>;

    /// Reaction payloads must be a short emoji identifier; anything else is
    /// rejected by the platform with a client error.
    async fn create_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), ApiError>;

    async fn create_followup(
        &self,
        interaction_token: &str,
        message: &OutgoingMessage,
    ) -> Result<(), ApiError>;

    async fn register_guild_command(
        &self,
        guild_id: &str,
        command: &CommandRegistration,
    ) -> Result<(), ApiError>;
}

pub struct HttpDiscordApi {
    client: reqwest::Client,
    base_url: String,
    bot_token: SecretString,
    application_id: String,
}

impl HttpDiscordApi {
    pub fn new(bot_token: SecretString, application_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: API_BASE_URL.to_owned(),
            bot_token,
            application_id: application_id.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn authorization(&self) -> String {
        format!("Bot {}", self.bot_token.expose_secret())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        context: &'static str,
        url: String,
    ) -> Result<T, ApiError> {
        let response = self
            .client
            .get(url)
            .header("Authorization", self.authorization())
            .send()
            .await?;
        let response = check_status(context, response).await?;
        Ok(response.json().await?)
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        context: &'static str,
        url: String,
        body: &B,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .post(url)
            .header("Authorization", self.authorization())
            .json(body)
            .send()
            .await?;
        check_status(context, response).await?;
        Ok(())
    }
}

#[async_trait]
impl DiscordApi for HttpDiscordApi {
    async fn fetch_guild_member(
        &self,
        guild_id: &str,
        user_id: &str,
    ) -> Result<GuildMember, ApiError> {
        let url = format!("{}/guilds/{guild_id}/members/{user_id}", self.base_url);
        self.get_json("fetch guild member", url).await
    }

    async fn fetch_user(&self, user_id: &str) -> Result<User, ApiError> {
        let url = format!("{}/users/{user_id}", self.base_url);
        self.get_json("fetch user", url).await
    }

    async fn fetch_channel(&self, channel_id: &str) -> Result<Channel, ApiError> {
        let url = format!("{}/channels/{channel_id}", self.base_url);
        self.get_json("fetch channel", url).await
    }

    async fn create_message(
        &self,
        channel_id: &str,
        message: &OutgoingMessage,
    ) -> Result<(), ApiError> {
        let url = format!("{}/channels/{channel_id}/messages", self.base_url);
        self.post_json("create message", url, message).await
    }

    async fn create_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), ApiError> {
        let url = format!(
            "{}/channels/{channel_id}/messages/{message_id}/reactions/{}/@me",
            self.base_url,
            percent_encode(emoji)
        );
        let response = self
            .client
            .put(url)
            .header("Authorization", self.authorization())
            .header("Content-Length", 0)
            .send()
            .await?;
        check_status("create reaction", response).await?;
        Ok(())
    }

    async fn create_followup(
        &self,
        interaction_token: &str,
        message: &OutgoingMessage,
    ) -> Result<(), ApiError> {
        let url = format!("{}/webhooks/{}/{interaction_token}", self.base_url, self.application_id);
        self.post_json("create followup", url, message).await
    }

    async fn register_guild_command(
        &self,
        guild_id: &str,
        command: &CommandRegistration,
    ) -> Result<(), ApiError> {
        let url = format!(
            "{}/applications/{}/guilds/{guild_id}/commands",
            self.base_url, self.application_id
        );
        self.post_json("register guild command", url, command).await
    }
}

async fn check_status(
    context: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status { context, status: status.as_u16(), body })
}

fn percent_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len() * 3);
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            other => {
                encoded.push('%');
                encoded.push(hex_digit(other >> 4));
                encoded.push(hex_digit(other & 0x0f));
            }
        }
    }
    encoded
}

fn hex_digit(nibble: u8) -> char {
    match nibble {
        0..=9 => (b'0' + nibble) as char,
        _ => (b'A' + nibble - 10) as char,
    }
}

/// In-memory stand-in with the same contract as the REST client. Lookups
/// answer from seeded fixtures and fail with a 404-shaped error otherwise;
/// every write is recorded for assertions.
#[derive(Default)]
pub struct RecordingDiscordApi {
    state: RwLock<RecordingState>,
}

#[derive(Default)]
struct RecordingState {
    members: HashMap<String, GuildMember>,
    users: HashMap<String, User>,
    channels: HashMap<String, Channel>,
    messages: Vec<(String, OutgoingMessage)>,
    reactions: Vec<(String, String, String)>,
    followups: Vec<(String, OutgoingMessage)>,
    commands: Vec<(String, CommandRegistration)>,
}

impl RecordingDiscordApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_member(&self, guild_id: &str, member: GuildMember) {
        let key = format!("{guild_id}:{}", member.user.id);
        self.state.write().await.members.insert(key, member);
    }

    pub async fn seed_user(&self, user: User) {
        self.state.write().await.users.insert(user.id.clone(), user);
    }

    pub async fn seed_channel(&self, channel: Channel) {
        self.state.write().await.channels.insert(channel.id.clone(), channel);
    }

    pub async fn messages(&self) -> Vec<(String, OutgoingMessage)> {
        self.state.read().await.messages.clone()
    }

    pub async fn reactions(&self) -> Vec<(String, String, String)> {
        self.state.read().await.reactions.clone()
    }

    pub async fn followups(&self) -> Vec<(String, OutgoingMessage)> {
        self.state.read().await.followups.clone()
    }

    pub async fn registered_commands(&self) -> Vec<(String, CommandRegistration)> {
        self.state.read().await.commands.clone()
    }
}

fn not_found(context: &'static str) -> ApiError {
    ApiError::Status { context, status: 404, body: "Not Found".to_owned() }
}

#[async_trait]
impl DiscordApi for RecordingDiscordApi {
    async fn fetch_guild_member(
        &self,
        guild_id: &str,
        user_id: &str,
    ) -> Result<GuildMember, ApiError> {
        let key = format!("{guild_id}:{user_id}");
        self.state
            .read()
            .await
            .members
            .get(&key)
            .cloned()
            .ok_or_else(|| not_found("fetch guild member"))
    }

    async fn fetch_user(&self, user_id: &str) -> Result<User, ApiError> {
        self.state
            .read()
            .await
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| not_found("fetch user"))
    }

    async fn fetch_channel(&self, channel_id: &str) -> Result<Channel, ApiError> {
        self.state
            .read()
            .await
            .channels
            .get(channel_id)
            .cloned()
            .ok_or_else(|| not_found("fetch channel"))
    }

    async fn create_message(
        &self,
        channel_id: &str,
        message: &OutgoingMessage,
    ) -> Result<(), ApiError> {
        self.state.write().await.messages.push((channel_id.to_owned(), message.clone()));
        Ok(())
    }

    async fn create_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), ApiError> {
        let mut state = self.state.write().await;
        state.reactions.push((channel_id.to_owned(), message_id.to_owned(), emoji.to_owned()));

        // Mirror the platform contract: anything longer than a short emoji
        // identifier is rejected with a client error.
        if emoji.chars().count() > 32 {
            return Err(ApiError::Status {
                context: "create reaction",
                status: 400,
                body: "Invalid emoji".to_owned(),
            });
        }

        Ok(())
    }

    async fn create_followup(
        &self,
        interaction_token: &str,
        message: &OutgoingMessage,
    ) -> Result<(), ApiError> {
        self.state
            .write()
            .await
            .followups
            .push((interaction_token.to_owned(), message.clone()));
        Ok(())
    }

    async fn register_guild_command(
        &self,
        guild_id: &str,
        command: &CommandRegistration,
    ) -> Result<(), ApiError> {
        self.state.write().await.commands.push((guild_id.to_owned(), command.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        percent_encode, Channel, ChannelKind, DiscordApi, GuildMember, OutgoingMessage,
        RecordingDiscordApi, User,
    };

    fn user(id: &str, username: &str) -> User {
        User { id: id.to_owned(), username: username.to_owned(), global_name: None, avatar: None }
    }

    #[test]
    fn display_name_prefers_nick_then_global_name_then_username() {
        let mut member = GuildMember {
            user: User {
                global_name: Some("Lea".to_owned()),
                ..user("100", "lea_dev")
            },
            nick: Some("lea (fyra)".to_owned()),
        };
        assert_eq!(member.display_name(), "lea (fyra)");

        member.nick = None;
        assert_eq!(member.display_name(), "Lea");

        member.user.global_name = None;
        assert_eq!(member.display_name(), "lea_dev");
    }

    #[test]
    fn avatar_url_is_only_built_when_a_hash_exists() {
        let mut author = user("100", "lea_dev");
        assert_eq!(author.avatar_url(), None);

        author.avatar = Some("abc123".to_owned());
        assert_eq!(
            author.avatar_url().as_deref(),
            Some("https://cdn.discordapp.com/avatars/100/abc123.png")
        );
    }

    #[test]
    fn channel_kind_decodes_from_raw_type() {
        assert_eq!(ChannelKind::from(0), ChannelKind::GuildText);
        assert_eq!(ChannelKind::from(5), ChannelKind::GuildAnnouncement);
        assert_eq!(ChannelKind::from(13), ChannelKind::Other(13));
    }

    #[test]
    fn only_guild_text_channels_count_as_text() {
        let text = Channel { id: "1".to_owned(), kind: ChannelKind::GuildText, name: None };
        let voice = Channel { id: "2".to_owned(), kind: ChannelKind::GuildVoice, name: None };
        assert!(text.is_text());
        assert!(!voice.is_text());
    }

    #[test]
    fn percent_encode_covers_reserved_and_multibyte_input() {
        assert_eq!(percent_encode("ok-chars_1.2~"), "ok-chars_1.2~");
        assert_eq!(percent_encode("a b"), "a%20b");
        assert_eq!(percent_encode("👍"), "%F0%9F%91%8D");
    }

    #[tokio::test]
    async fn recording_api_answers_from_seeds_and_records_writes() {
        let api = RecordingDiscordApi::new();
        api.seed_user(user("100", "lea_dev")).await;

        assert_eq!(api.fetch_user("100").await.expect("seeded user").username, "lea_dev");
        assert!(api.fetch_user("404").await.is_err());
        assert!(api.fetch_guild_member("1", "100").await.is_err());

        api.create_message("555", &OutgoingMessage::text("hello")).await.expect("send");
        assert_eq!(api.messages().await.len(), 1);
    }

    #[tokio::test]
    async fn recording_api_rejects_oversized_reaction_payloads() {
        let api = RecordingDiscordApi::new();

        api.create_reaction("555", "777", "👍").await.expect("emoji reaction");
        let error = api
            .create_reaction("555", "777", &"lore ".repeat(10))
            .await
            .err()
            .expect("oversized payload must fail");
        assert!(error.to_string().contains("400"));

        // Both attempts are recorded, including the rejected one.
        assert_eq!(api.reactions().await.len(), 2);
    }
}
