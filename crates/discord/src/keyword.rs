use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::api::DiscordApi;
use crate::events::{
    EventContext, EventHandler, EventHandlerError, GatewayEnvelope, GatewayEvent, GatewayEventType,
    HandlerResult,
};

/// The canned lore reply. Deliberately used as the reaction payload even
/// though reactions only accept a short emoji identifier; the api rejects it
/// per message and nothing else is affected.
pub const CUTEFISH_LORE: &str = "Ok, wisten up, you! Cutefish used to be part of Ultramarine, until the devewoper just weft, cwosed the website, and weft the GitHub. There's no wevival of Cutefish that wasts wong, and we won't mantain it. If you can pwove to use that a wevival of Cutefish will wast wong, we'll think about it. Now scoot!\nSowwy if you were just saying the word in nowmal convewsation. Keep gowing :3";

static TRIGGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcutefish\b").expect("pattern is valid"));

/// Whole-word, case-insensitive match.
pub fn contains_trigger_word(content: &str) -> bool {
    TRIGGER.is_match(content)
}

pub struct KeywordReactHandler<A> {
    api: Arc<A>,
}

impl<A> KeywordReactHandler<A>
where
    A: DiscordApi,
{
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl<A> EventHandler for KeywordReactHandler<A>
where
    A: DiscordApi + 'static,
{
    fn event_type(&self) -> GatewayEventType {
        GatewayEventType::MessageCreate
    }

    async fn handle(
        &self,
        envelope: &GatewayEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let GatewayEvent::MessageCreate(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        if !contains_trigger_word(&event.content) {
            return Ok(HandlerResult::Processed);
        }

        debug!(channel_id = %event.channel_id, message_id = %event.message_id, "trigger word spotted");
        self.api
            .create_reaction(&event.channel_id, &event.message_id, CUTEFISH_LORE)
            .await?;

        Ok(HandlerResult::Processed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::api::{RecordingDiscordApi, User};
    use crate::events::{EventContext, EventDispatcher, GatewayEnvelope, GatewayEvent, MessageEvent};

    use super::{contains_trigger_word, KeywordReactHandler, CUTEFISH_LORE};

    fn message(content: &str) -> GatewayEnvelope {
        GatewayEnvelope {
            sequence: None,
            event: GatewayEvent::MessageCreate(MessageEvent {
                channel_id: "3333".to_owned(),
                message_id: "4444".to_owned(),
                author: User {
                    id: "100".to_owned(),
                    username: "lea_dev".to_owned(),
                    global_name: None,
                    avatar: None,
                },
                content: content.to_owned(),
            }),
        }
    }

    #[test]
    fn trigger_matches_the_standalone_word_in_any_case() {
        assert!(contains_trigger_word("I miss CuteFish so much"));
        assert!(contains_trigger_word("cutefish"));
        assert!(contains_trigger_word("have you tried cutefish?"));
    }

    #[test]
    fn trigger_enforces_word_boundaries() {
        assert!(!contains_trigger_word("cutefishy"));
        assert!(!contains_trigger_word("acutefish"));
        assert!(!contains_trigger_word("something else entirely"));
    }

    #[tokio::test]
    async fn matching_messages_attempt_the_lore_reaction() {
        let api = Arc::new(RecordingDiscordApi::new());
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(KeywordReactHandler::new(Arc::clone(&api)));

        // The oversized payload fails at the boundary; the dispatcher
        // surfaces the error, which the gateway loop logs per message.
        let result = dispatcher.dispatch(&message("bring back CuteFish"), &EventContext::default()).await;
        assert!(result.is_err());

        let reactions = api.reactions().await;
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].0, "3333");
        assert_eq!(reactions[0].1, "4444");
        assert_eq!(reactions[0].2, CUTEFISH_LORE);
    }

    #[tokio::test]
    async fn non_matching_messages_do_not_touch_the_api() {
        let api = Arc::new(RecordingDiscordApi::new());
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(KeywordReactHandler::new(Arc::clone(&api)));

        let result = dispatcher
            .dispatch(&message("cutefishy is not the word"), &EventContext::default())
            .await;
        assert!(result.is_ok());
        assert!(api.reactions().await.is_empty());
    }
}
