//! Chat bot front end for Siram.
//!
//! Owners text the bot from the phone number stored on their user record:
//!
//! - `status` - status card for their device with the local forecast
//! - `siram` - start a manual watering run
//!
//! Everything else about the bot is push: completion notices from the
//! watcher and the two-hourly status broadcast, both provided by
//! `siram-runtime`. This crate adds the connection lifecycle around them.
//!
//! # Environment Variables
//!
//! Required:
//! - `SIRAM_CREDENTIALS`: service account JSON for the data stores
//!
//! Optional:
//! - `SIRAM_WEATHER_URL`: weather service base URL
//! - `SIRAM_STATE_DIR`: state directory (default `~/.siram`)

pub mod bot;
pub mod console;
pub mod credentials;
pub mod error;
pub mod handlers;
pub mod seed;
pub mod session;

pub use bot::SiramBot;
pub use console::ConsoleTransport;
pub use credentials::CredentialStore;
pub use error::{BotError, Result};
pub use handlers::{Command, CommandHandler};
pub use seed::SeedData;
pub use session::{ChatSession, ChatTransport, DisconnectReason, InboundMessage, SessionEvent};
