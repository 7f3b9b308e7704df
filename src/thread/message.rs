//! # Thread Messages
//!
//! The wire shape of a conversation as the assistant session hands it over.
//! Every message is a JSON object tagged by `type`:
//!
//! ```text
//! human          → Human { content }
//! ai             → Assistant { content, meta.form? }
//! tool           → ToolCall { content, tool_call_id?, meta.form? }
//! ai/failure     → Failure { content, meta.form? }
//! ai/viz         → Visualization { answer?, plan? }
//! ai/reasoning   → Reasoning { content, substeps[] }
//! anything else  → Unknown (skipped at render time)
//! ```
//!
//! `id` and `status` are shared by every variant and live on [`Message`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a single message.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Still streaming or waiting on the backend.
    #[serde(alias = "loading")]
    Pending,
    /// Snapshots persisted by the session omit the status once a message is done.
    #[default]
    Completed,
    Error,
}

/// Which side of the conversation produced a message.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Assistant,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::Human => "you",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub status: MessageStatus,
    #[serde(flatten)]
    pub kind: MessageKind,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum MessageKind {
    #[serde(rename = "human")]
    Human {
        #[serde(default)]
        content: String,
    },
    #[serde(rename = "ai")]
    Assistant {
        #[serde(default)]
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta: Option<AssistantMeta>,
    },
    #[serde(rename = "tool")]
    ToolCall {
        #[serde(default)]
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_call_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta: Option<AssistantMeta>,
    },
    #[serde(rename = "ai/failure")]
    Failure {
        #[serde(default)]
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta: Option<AssistantMeta>,
    },
    #[serde(rename = "ai/viz")]
    Visualization {
        /// Raw query object produced by the assistant; see `thread::query`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        answer: Option<serde_json::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        plan: Option<String>,
    },
    #[serde(rename = "ai/reasoning")]
    Reasoning {
        #[serde(default)]
        content: String,
        #[serde(default)]
        substeps: Vec<String>,
    },
    /// A message type this build does not know about.
    #[serde(other)]
    Unknown,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct AssistantMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<AssistantForm>,
}

/// Interrupts an answer with a set of canned replies.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct AssistantForm {
    #[serde(default)]
    pub options: Vec<FormOption>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FormOption {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

/// Display emphasis of a form option button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonVariant {
    Primary,
    #[default]
    Secondary,
    Tertiary,
}

impl FormOption {
    /// Unrecognized or missing variants fall back to `Secondary`.
    pub fn button_variant(&self) -> ButtonVariant {
        match self.variant.as_deref() {
            Some("primary") => ButtonVariant::Primary,
            Some("tertiary") => ButtonVariant::Tertiary,
            _ => ButtonVariant::Secondary,
        }
    }
}

impl Message {
    /// Sender side. Unknown kinds are grouped with the assistant.
    pub fn role(&self) -> Role {
        match self.kind {
            MessageKind::Human { .. } => Role::Human,
            _ => Role::Assistant,
        }
    }

    /// Stable key: the message id, or its position in the thread when absent.
    pub fn key(&self, index: usize) -> MessageKey {
        match &self.id {
            Some(id) if !id.is_empty() => MessageKey::Id(id.clone()),
            _ => MessageKey::Index(index),
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self {
            id: None,
            status: MessageStatus::Completed,
            kind: MessageKind::Human {
                content: content.into(),
            },
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: None,
            status: MessageStatus::Completed,
            kind: MessageKind::Assistant {
                content: content.into(),
                meta: None,
            },
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_status(mut self, status: MessageStatus) -> Self {
        self.status = status;
        self
    }
}

/// Identity of a rendered message across re-renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageKey {
    Id(String),
    Index(usize),
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKey::Id(id) => write!(f, "{id}"),
            MessageKey::Index(i) => write!(f, "#{i}"),
        }
    }
}
