//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use crate::core::state::App;
use crate::thread::message::{AssistantForm, AssistantMeta, FormOption};
use crate::thread::{Message, MessageKind, MessageStatus, RenderPolicy};

/// Creates a test App with a trace id and the default render policy.
pub fn test_app() -> App {
    let mut app = App::new(RenderPolicy::default());
    app.trace_id = Some("trace-test".to_string());
    app
}

/// Assistant answer interrupted by a form with the given option values.
pub fn form_message(values: &[&str]) -> Message {
    Message {
        id: None,
        status: MessageStatus::Completed,
        kind: MessageKind::Assistant {
            content: "How should I continue?".into(),
            meta: Some(AssistantMeta {
                form: Some(AssistantForm {
                    options: values
                        .iter()
                        .map(|v| FormOption {
                            value: v.to_string(),
                            variant: None,
                        })
                        .collect(),
                }),
            }),
        },
    }
}

/// Completed trends visualization.
pub fn viz_message() -> Message {
    Message {
        id: None,
        status: MessageStatus::Completed,
        kind: MessageKind::Visualization {
            answer: Some(serde_json::json!({
                "kind": "TrendsQuery",
                "series": [{"event": "$pageview", "math": "dau"}],
                "breakdownFilter": {"breakdown": "$browser"}
            })),
            plan: None,
        },
    }
}
