//! Service layer for the job feed.
//!
//! This module contains the collaborators the pipeline drives:
//! - Listing sources (`SourceAdapter`, `JsonApiSource`, `HtmlBoardSource`)
//! - Completion backend (`CompletionBackend`, `OpenAiClient`)
//! - Structuring engine (`StructuringEngine`)
//! - Notifications (`Notifier`, `TelegramNotifier`, `LogNotifier`)

pub mod ai;
pub mod notifier;
pub mod sources;
pub mod structuring;

pub use ai::{CompletionBackend, OpenAiClient};
pub use notifier::{LogNotifier, Notifier, TelegramNotifier, build_notifier, render_message};
pub use sources::{HtmlBoardSource, JsonApiSource, SourceAdapter, build_sources};
pub use structuring::{StructuringEngine, decode_response};
