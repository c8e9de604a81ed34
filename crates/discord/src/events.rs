use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use crate::api::{ApiError, User};
use crate::commands::{CommandInvocation, CommandServiceError, ProgressCommandService};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayEnvelope {
    /// Gateway sequence number, when the transport carries one.
    pub sequence: Option<u64>,
    pub event: GatewayEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GatewayEvent {
    InteractionCreate(CommandInvocation),
    MessageCreate(MessageEvent),
    Unsupported { event_type: String },
}

impl GatewayEvent {
    pub fn event_type(&self) -> GatewayEventType {
        match self {
            Self::InteractionCreate(_) => GatewayEventType::InteractionCreate,
            Self::MessageCreate(_) => GatewayEventType::MessageCreate,
            Self::Unsupported { .. } => GatewayEventType::Unsupported,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum GatewayEventType {
    InteractionCreate,
    MessageCreate,
    Unsupported,
}

/// One message posted to a channel the bot can see.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageEvent {
    pub channel_id: String,
    pub message_id: String,
    pub author: User,
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Processed,
    Ignored,
}

#[derive(Debug, Error)]
pub enum EventHandlerError {
    #[error(transparent)]
    Command(#[from] CommandServiceError),
    #[error("reaction attempt failed: {0}")]
    Reaction(#[from] ApiError),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> GatewayEventType;
    async fn handle(
        &self,
        envelope: &GatewayEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<GatewayEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &GatewayEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

pub struct SlashCommandHandler<S> {
    service: S,
}

impl<S> SlashCommandHandler<S>
where
    S: ProgressCommandService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for SlashCommandHandler<S>
where
    S: ProgressCommandService + 'static,
{
    fn event_type(&self) -> GatewayEventType {
        GatewayEventType::InteractionCreate
    }

    async fn handle(
        &self,
        envelope: &GatewayEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let GatewayEvent::InteractionCreate(invocation) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        if invocation.command != "progress" {
            return Ok(HandlerResult::Ignored);
        }

        self.service.submit_progress(invocation).await?;
        Ok(HandlerResult::Processed)
    }
}
