use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use raboneko_core::report::{
    format_entry, group_by_product, last_week_window, partition_by_length, ChanceSource,
    EMBED_FIELD_BUDGET,
};
use raboneko_core::ProgressLog;
use raboneko_db::{ProgressLogRepository, RepositoryError};
use raboneko_discord::api::{ApiError, DiscordApi, OutgoingMessage};
use raboneko_discord::embed::{Embed, EmbedField};

pub const NO_PROGRESS_PLACEHOLDER: &str = "*No progress this week.*";
const JOKE_LINE: &str =
    "New face filters on Instagram today. This one's my favorite so far. Nice job team!";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("persistence failed: {0}")]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("channel `{0}` is not a text channel")]
    NotATextChannel(String),
}

#[derive(Clone, Debug, Serialize)]
pub struct ReportSummary {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub log_count: usize,
    pub field_count: usize,
}

/// Queries last week's logs, renders one embed field per product (plus
/// continuation fields when a product overflows the budget), and posts the
/// result to the announcements channel.
pub struct WeeklyReportService<R, A, C> {
    repository: Arc<R>,
    api: Arc<A>,
    chance: C,
    guild_id: String,
    announcements_channel_id: String,
    joke_chance: f64,
}

impl<R, A, C> WeeklyReportService<R, A, C>
where
    R: ProgressLogRepository,
    A: DiscordApi,
    C: ChanceSource,
{
    pub fn new(
        repository: Arc<R>,
        api: Arc<A>,
        chance: C,
        guild_id: impl Into<String>,
        announcements_channel_id: impl Into<String>,
        joke_chance: f64,
    ) -> Self {
        Self {
            repository,
            api,
            chance,
            guild_id: guild_id.into(),
            announcements_channel_id: announcements_channel_id.into(),
            joke_chance,
        }
    }

    pub async fn post_weekly_report(&self, now: DateTime<Utc>) -> Result<ReportSummary, ReportError> {
        let window = last_week_window(now);
        let logs = self.repository.find_in_window(window.start, window.end).await?;
        info!(
            log_count = logs.len(),
            window_start = %window.start,
            window_end = %window.end,
            "generating weekly report"
        );

        let log_count = logs.len();
        let fields = self.render_fields(logs).await?;
        let field_count = fields.len();

        let embed = if fields.is_empty() {
            Embed { description: Some(NO_PROGRESS_PLACEHOLDER.to_owned()), ..Embed::default() }
        } else {
            Embed { fields, ..Embed::default() }
        };

        let mut content = format!(
            "Here is the final report for the week of {} to {}. Great work everyone!",
            window.start.format("%B %-d, %Y"),
            window.end.format("%B %-d, %Y"),
        );
        if self.chance.roll() < self.joke_chance {
            content = JOKE_LINE.to_owned();
        }

        let channel = self.api.fetch_channel(&self.announcements_channel_id).await?;
        if !channel.is_text() {
            return Err(ReportError::NotATextChannel(self.announcements_channel_id.clone()));
        }

        self.api
            .create_message(
                &self.announcements_channel_id,
                &OutgoingMessage { content: Some(content), embeds: vec![embed] },
            )
            .await?;

        Ok(ReportSummary {
            window_start: window.start,
            window_end: window.end,
            log_count,
            field_count,
        })
    }

    async fn render_fields(&self, logs: Vec<ProgressLog>) -> Result<Vec<EmbedField>, ReportError> {
        let mut fields = Vec::new();

        for (product, mut entries) in group_by_product(logs) {
            entries.sort_by_key(|entry| entry.created_at);

            let mut lines = Vec::with_capacity(entries.len());
            for entry in &entries {
                let display_name = self.resolve_display_name(&entry.user_id).await?;
                lines.push(format_entry(&display_name, entry));
            }

            for (index, chunk) in
                partition_by_length(&lines, EMBED_FIELD_BUDGET).into_iter().enumerate()
            {
                let name = if index == 0 {
                    product.label().to_owned()
                } else {
                    format!("{} (continued)", product.label())
                };
                fields.push(EmbedField { name, value: chunk.join("\n"), inline: false });
            }
        }

        Ok(fields)
    }

    async fn resolve_display_name(&self, user_id: &str) -> Result<String, ReportError> {
        match self.api.fetch_guild_member(&self.guild_id, user_id).await {
            Ok(member) => Ok(member.display_name().to_owned()),
            Err(error) => {
                debug!(user_id, error = %error, "member lookup failed; falling back to platform user");
                Ok(self.api.fetch_user(user_id).await?.username)
            }
        }
    }
}
