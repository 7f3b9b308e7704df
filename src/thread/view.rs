//! # Thread Container
//!
//! Builds the complete view of a thread from explicit props. The view is
//! recomputed from scratch on every update; nothing is patched incrementally.

use std::collections::HashSet;

use super::group::group_messages;
use super::message::{Message, MessageKey, MessageStatus, Role};
use super::render::{Block, RenderContext, RenderPolicy, render};

/// Everything the container needs. No ambient state is read.
#[derive(Debug, Clone, Copy)]
pub struct ThreadProps<'a> {
    pub messages: &'a [Message],
    pub trace_id: Option<&'a str>,
    pub policy: &'a RenderPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMessage {
    pub key: MessageKey,
    /// Position in the thread.
    pub index: usize,
    pub block: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupView {
    pub role: Role,
    pub first_index: usize,
    pub is_final: bool,
    /// Messages that rendered to something; skipped ones are absent.
    pub messages: Vec<RenderedMessage>,
    /// Show the "retrying automatically" notice under this group.
    pub retry_notice: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ThreadView {
    pub groups: Vec<GroupView>,
    pub trace_id: Option<String>,
}

/// One entry of the flattened view, in display order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewRow<'a> {
    Message {
        group: usize,
        role: Role,
        message: &'a RenderedMessage,
    },
    Notice {
        group: usize,
    },
}

pub fn build_thread_view(props: ThreadProps<'_>) -> ThreadView {
    let groups = group_messages(props.messages);
    let group_count = groups.len();
    let keys = message_keys(props.messages);
    let last_failed = props
        .messages
        .last()
        .is_some_and(|m| m.status == MessageStatus::Error);

    let groups = groups
        .into_iter()
        .enumerate()
        .map(|(group_index, group)| {
            let is_final = group_index + 1 == group_count;
            let last_in_group = group.messages.len() - 1;
            let messages = group
                .messages
                .iter()
                .enumerate()
                .filter_map(|(offset, message)| {
                    let ctx = RenderContext {
                        interactable: offset == last_in_group,
                        final_group: is_final,
                        policy: props.policy,
                    };
                    let index = group.first_index + offset;
                    render(message, &ctx).map(|block| RenderedMessage {
                        key: keys[index].clone(),
                        index,
                        block,
                    })
                })
                .collect();

            GroupView {
                role: group.role,
                first_index: group.first_index,
                is_final,
                messages,
                retry_notice: is_final && last_failed,
            }
        })
        .collect();

    ThreadView {
        groups,
        trace_id: props.trace_id.map(str::to_string),
    }
}

/// Keys for every message. A repeated id keys the later message by its
/// position so each message keeps its own feedback.
fn message_keys(messages: &[Message]) -> Vec<MessageKey> {
    let mut seen = HashSet::new();
    messages
        .iter()
        .enumerate()
        .map(|(index, message)| match message.key(index) {
            MessageKey::Id(id) if !seen.insert(id.clone()) => MessageKey::Index(index),
            key => key,
        })
        .collect()
}

impl ThreadView {
    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.messages.is_empty() && !g.retry_notice)
    }

    pub fn find(&self, key: &MessageKey) -> Option<&RenderedMessage> {
        self.groups
            .iter()
            .flat_map(|g| g.messages.iter())
            .find(|m| &m.key == key)
    }

    pub fn rows(&self) -> Vec<ViewRow<'_>> {
        let mut rows = Vec::new();
        for (group, view) in self.groups.iter().enumerate() {
            rows.extend(view.messages.iter().map(|message| ViewRow::Message {
                group,
                role: view.role,
                message,
            }));
            if view.retry_notice {
                rows.push(ViewRow::Notice { group });
            }
        }
        rows
    }
}

impl ViewRow<'_> {
    pub fn key(&self) -> Option<&MessageKey> {
        match self {
            ViewRow::Message { message, .. } => Some(&message.key),
            ViewRow::Notice { .. } => None,
        }
    }

    pub fn block(&self) -> &Block {
        const NOTICE: &Block = &Block::RetryNotice;
        match self {
            ViewRow::Message { message, .. } => &message.block,
            ViewRow::Notice { .. } => NOTICE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread::message::MessageKind;
    use crate::thread::render::ActionSlot;

    fn view(messages: &[Message]) -> ThreadView {
        let policy = RenderPolicy::default();
        build_thread_view(ThreadProps {
            messages,
            trace_id: Some("trace"),
            policy: &policy,
        })
    }

    #[test]
    fn repeated_ids_fall_back_to_position() {
        let thread = vec![
            Message::human("hi").with_id("m"),
            Message::assistant("hello").with_id("m"),
        ];
        let view = view(&thread);

        let keys: Vec<&MessageKey> = view
            .groups
            .iter()
            .flat_map(|g| g.messages.iter().map(|m| &m.key))
            .collect();
        assert_eq!(keys, [&MessageKey::Id("m".into()), &MessageKey::Index(1)]);
        assert_eq!(
            view.find(&MessageKey::Index(1)).map(|m| m.index),
            Some(1)
        );
    }

    #[test]
    fn hi_hello_scenario() {
        let thread = vec![Message::human("hi"), Message::assistant("hello")];
        let view = view(&thread);

        assert_eq!(view.groups.len(), 2);
        assert_eq!(view.groups[0].role, Role::Human);
        assert_eq!(view.groups[1].role, Role::Assistant);
        assert!(view.groups[1].is_final);
        assert_eq!(
            view.groups[1].messages[0].block.action(),
            Some(&ActionSlot::Success { retriable: true })
        );
        assert!(!view.groups.iter().any(|g| g.retry_notice));
        assert_eq!(view.trace_id.as_deref(), Some("trace"));
    }

    #[test]
    fn only_last_message_of_group_is_interactable() {
        let thread = vec![
            Message::human("q"),
            Message::assistant("first"),
            Message::assistant("second"),
        ];
        let view = view(&thread);
        let assistant = &view.groups[1].messages;
        assert_eq!(assistant[0].block.action(), None);
        assert!(assistant[1].block.action().is_some());
    }

    #[test]
    fn earlier_assistant_groups_are_not_retriable() {
        let thread = vec![
            Message::human("q1"),
            Message::assistant("a1"),
            Message::human("q2"),
            Message::assistant("a2"),
        ];
        let view = view(&thread);
        assert_eq!(
            view.groups[1].messages[0].block.action(),
            Some(&ActionSlot::Success { retriable: false })
        );
        assert_eq!(
            view.groups[3].messages[0].block.action(),
            Some(&ActionSlot::Success { retriable: true })
        );
    }

    #[test]
    fn failed_last_message_adds_one_notice() {
        let variants = [
            Message::human("retry me").with_status(MessageStatus::Error),
            Message::assistant("partial").with_status(MessageStatus::Error),
            Message {
                id: None,
                status: MessageStatus::Error,
                kind: MessageKind::Unknown,
            },
        ];
        for last in variants {
            let thread = vec![
                Message::human("q"),
                Message::assistant("a").with_status(MessageStatus::Error),
                Message::human("q2"),
                last,
            ];
            let view = view(&thread);
            let notices = view
                .rows()
                .iter()
                .filter(|r| matches!(r, ViewRow::Notice { .. }))
                .count();
            assert_eq!(notices, 1);
            // The notice comes last, right after the final group
            assert!(matches!(view.rows().last(), Some(ViewRow::Notice { .. })));
            assert!(view.groups.last().unwrap().retry_notice);
        }
    }

    #[test]
    fn skipped_messages_keep_thread_indices() {
        let thread = vec![
            Message::human("q"),
            Message {
                id: None,
                status: MessageStatus::Completed,
                kind: MessageKind::Unknown,
            },
            Message::assistant("a").with_id("a-1"),
        ];
        let view = view(&thread);
        let rendered = &view.groups[1].messages;
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].index, 2);
        assert_eq!(rendered[0].key, MessageKey::Id("a-1".into()));
        assert!(view.find(&MessageKey::Id("a-1".into())).is_some());
        assert!(view.find(&MessageKey::Index(1)).is_none());
    }

    #[test]
    fn empty_thread_is_empty_view() {
        let view = view(&[]);
        assert!(view.groups.is_empty());
        assert!(view.is_empty());
        assert!(view.rows().is_empty());
    }
}
