//! # Message Render Dispatch
//!
//! Turns one message into a [`Block`]: the UI-agnostic description of what to
//! draw and which actions to offer. Returning `None` means "draw nothing".
//!
//! ```text
//! Human                      → Text (danger border on error)
//! AssistantText/Tool/Failure → Text + action slot (only when completed)
//! Visualization              → Visualization (completed + castable answer only)
//! Reasoning                  → Reasoning (never interactive)
//! Unknown                    → nothing
//! ```

use log::warn;

use super::classify::{Variant, classify};
use super::message::{AssistantForm, ButtonVariant, Message, MessageStatus, Role};
use super::query::{QueryDescriptor, cast_assistant_query};

pub const HUMAN_PLACEHOLDER: &str = "*No text.*";
pub const ANSWER_PLACEHOLDER: &str =
    "*The assistant has failed to generate an answer. Please try again.*";
pub const RETRY_NOTICE: &str =
    "The assistant is generating this answer one more time because the previous attempt has failed.";
pub const DEFAULT_RATE_LIMIT_MARKER: &str = "usage limit";

/// Render-time settings that come from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPolicy {
    /// Failure texts containing any of these hide the retry button.
    pub rate_limit_markers: Vec<String>,
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self {
            rate_limit_markers: vec![DEFAULT_RATE_LIMIT_MARKER.to_string()],
        }
    }
}

impl RenderPolicy {
    pub fn is_rate_limited(&self, content: &str) -> bool {
        self.rate_limit_markers
            .iter()
            .any(|marker| !marker.is_empty() && content.contains(marker.as_str()))
    }
}

/// Where a message sits in the thread.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Last message of its group.
    pub interactable: bool,
    /// Its group is the last group of the thread.
    pub final_group: bool,
    pub policy: &'a RenderPolicy,
}

impl RenderContext<'_> {
    fn retriable(&self) -> bool {
        self.interactable && self.final_group
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Normal,
    Danger,
    Warning,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormButton {
    pub value: String,
    pub variant: ButtonVariant,
}

/// Actions offered beneath a text answer.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionSlot {
    /// "Try again" after a failure.
    Retry,
    /// Canned replies; picking one sends it as a new human turn.
    Form(Vec<FormButton>),
    /// Thumbs up/down, plus "try again" when `retriable`.
    Success { retriable: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Text {
        role: Role,
        content: String,
        tone: Tone,
        action: Option<ActionSlot>,
    },
    Visualization {
        query: QueryDescriptor,
    },
    Reasoning {
        headline: String,
        substeps: Vec<String>,
    },
    /// Fixed notice shown while a failed turn is retried automatically.
    RetryNotice,
}

impl Block {
    pub fn action(&self) -> Option<&ActionSlot> {
        match self {
            Block::Text { action, .. } => action.as_ref(),
            _ => None,
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Block::Text { tone, .. } => *tone,
            Block::RetryNotice => Tone::Warning,
            _ => Tone::Normal,
        }
    }
}

pub fn render(message: &Message, ctx: &RenderContext<'_>) -> Option<Block> {
    let variant = classify(message);
    match variant {
        Variant::Human { content } => Some(Block::Text {
            role: Role::Human,
            content: or_placeholder(content, HUMAN_PLACEHOLDER),
            tone: if message.status == MessageStatus::Error {
                Tone::Danger
            } else {
                Tone::Normal
            },
            action: None,
        }),
        Variant::AssistantText { content, .. }
        | Variant::ToolCall { content }
        | Variant::Failure { content } => {
            let danger = message.status == MessageStatus::Error
                || matches!(variant, Variant::Failure { .. });
            Some(Block::Text {
                role: Role::Assistant,
                content: or_placeholder(content, ANSWER_PLACEHOLDER),
                tone: if danger { Tone::Danger } else { Tone::Normal },
                action: text_action(&variant, message.status, ctx),
            })
        }
        Variant::Visualization { answer } => {
            if message.status != MessageStatus::Completed {
                return None;
            }
            match cast_assistant_query(answer?) {
                Ok(source) => Some(Block::Visualization {
                    query: QueryDescriptor::from_source(source),
                }),
                Err(e) => {
                    warn!("Skipping visualization {:?}: {}", message.id, e);
                    None
                }
            }
        }
        Variant::Reasoning { headline, substeps } => Some(Block::Reasoning {
            headline: headline.to_string(),
            substeps: substeps.to_vec(),
        }),
        Variant::Skip => None,
    }
}

fn text_action(
    variant: &Variant<'_>,
    status: MessageStatus,
    ctx: &RenderContext<'_>,
) -> Option<ActionSlot> {
    if status != MessageStatus::Completed {
        return None;
    }

    match variant {
        Variant::Failure { content }
            if ctx.retriable() && !ctx.policy.is_rate_limited(content) =>
        {
            Some(ActionSlot::Retry)
        }
        Variant::AssistantText { form, .. } if ctx.interactable => match form {
            Some(form) if ctx.final_group => Some(ActionSlot::Form(form_buttons(form))),
            _ => Some(ActionSlot::Success {
                retriable: ctx.retriable(),
            }),
        },
        _ => None,
    }
}

fn form_buttons(form: &AssistantForm) -> Vec<FormButton> {
    form.options
        .iter()
        .map(|option| FormButton {
            value: option.value.clone(),
            variant: option.button_variant(),
        })
        .collect()
}

fn or_placeholder(content: &str, placeholder: &str) -> String {
    if content.is_empty() {
        placeholder.to_string()
    } else {
        content.to_string()
    }
}
