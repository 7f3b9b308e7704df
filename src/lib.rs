//! threadview library exports for testing

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub mod core;
pub mod thread;
pub mod tui;

#[cfg(test)]
pub mod test_support;

/// Where emitted thread events are delivered.
#[derive(Clone, Debug, Default, PartialEq, Eq, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Append to a local JSON-lines outbox
    #[default]
    Jsonl,
    /// POST each event to an HTTP endpoint
    Webhook,
    /// Drop events (logged only)
    None,
}
