//! Narrows a [`Message`] into the shape the renderer dispatches on.
//!
//! The wire enum keeps unknown message types around so they survive a
//! round-trip; [`classify`] folds those into [`Variant::Skip`].

use super::message::{AssistantForm, Message, MessageKind};

/// A borrowed, render-ready view of one message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Variant<'a> {
    Human {
        content: &'a str,
    },
    AssistantText {
        content: &'a str,
        /// Only present when the form has at least one option.
        form: Option<&'a AssistantForm>,
    },
    ToolCall {
        content: &'a str,
    },
    Failure {
        content: &'a str,
    },
    Visualization {
        answer: Option<&'a serde_json::Value>,
    },
    Reasoning {
        headline: &'a str,
        substeps: &'a [String],
    },
    Skip,
}

pub fn classify(message: &Message) -> Variant<'_> {
    match &message.kind {
        MessageKind::Human { content } => Variant::Human { content },
        MessageKind::Assistant { content, meta } => Variant::AssistantText {
            content,
            form: meta
                .as_ref()
                .and_then(|m| m.form.as_ref())
                .filter(|form| !form.options.is_empty()),
        },
        MessageKind::ToolCall { content, .. } => Variant::ToolCall { content },
        MessageKind::Failure { content, .. } => Variant::Failure { content },
        MessageKind::Visualization { answer, .. } => Variant::Visualization {
            answer: answer.as_ref(),
        },
        MessageKind::Reasoning { content, substeps } => Variant::Reasoning {
            headline: content,
            substeps,
        },
        MessageKind::Unknown => Variant::Skip,
    }
}

impl Variant<'_> {
    /// Text-bearing assistant variants share one renderer.
    pub fn is_text_answer(&self) -> bool {
        matches!(
            self,
            Variant::AssistantText { .. } | Variant::ToolCall { .. } | Variant::Failure { .. }
        )
    }
}
