//! Discord integration - gateway-facing bot interface
//!
//! This crate provides the chat-platform boundary for raboneko:
//! - **REST API** (`api`) - typed client behind the `DiscordApi` trait
//! - **Embeds** (`embed`) - rich message builders
//! - **Slash Commands** (`commands`) - `/progress` registration and parsing
//! - **Events** (`events`) - interaction and message dispatch
//! - **Keyword Reaction** (`keyword`) - the CuteFish lore module
//! - **Gateway** (`gateway`) - event-loop runner with reconnection logic
//!
//! Handlers receive an explicit `DiscordApi` handle; there is no ambient
//! client singleton.

pub mod api;
pub mod commands;
pub mod embed;
pub mod events;
pub mod gateway;
pub mod keyword;
