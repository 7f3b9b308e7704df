//! # Application State
//!
//! Core state for threadview. Domain logic only, no TUI types.
//!
//! ```text
//! App
//! ├── messages: Vec<Message>             // latest thread snapshot
//! ├── trace_id: Option<String>           // correlates ratings/feedback
//! ├── title: String                      // shown in the title bar
//! ├── policy: RenderPolicy               // rate-limit markers
//! ├── status_message: String             // status bar text
//! ├── feedback: HashMap<key, machine>    // per-answer rating state
//! └── expanded_summaries: HashSet<key>   // visualization detail panels
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::collections::{HashMap, HashSet};

use crate::core::config::ResolvedConfig;
use crate::thread::{
    ActionSlot, Block, FeedbackMachine, Message, MessageKey, RenderPolicy, ThreadProps,
    ThreadView, build_thread_view,
};

pub struct App {
    pub messages: Vec<Message>,
    pub trace_id: Option<String>,
    pub title: String,
    pub policy: RenderPolicy,
    pub status_message: String,
    /// Rating machines, one per mounted success-actions slot.
    pub feedback: HashMap<MessageKey, FeedbackMachine>,
    pub expanded_summaries: HashSet<MessageKey>,
}

impl App {
    pub fn new(policy: RenderPolicy) -> Self {
        Self {
            messages: Vec::new(),
            trace_id: None,
            title: String::from("Untitled"),
            policy,
            status_message: String::from("Waiting for thread"),
            feedback: HashMap::new(),
            expanded_summaries: HashSet::new(),
        }
    }

    pub fn from_config(config: &ResolvedConfig) -> Self {
        let mut app = Self::new(RenderPolicy {
            rate_limit_markers: config.rate_limit_markers.clone(),
        });
        app.trace_id = config.trace_id.clone();
        app
    }

    /// Fresh view of the current snapshot.
    pub fn view(&self) -> ThreadView {
        build_thread_view(ThreadProps {
            messages: &self.messages,
            trace_id: self.trace_id.as_deref(),
            policy: &self.policy,
        })
    }

    /// Rating state for a message; untouched answers read as a fresh machine.
    pub fn feedback_for(&self, key: &MessageKey) -> FeedbackMachine {
        self.feedback.get(key).copied().unwrap_or_default()
    }

    pub fn summary_expanded(&self, key: &MessageKey) -> bool {
        self.expanded_summaries.contains(key)
    }

    /// Drop per-message UI state whose owning block is no longer on screen.
    pub(crate) fn prune_unmounted(&mut self, view: &ThreadView) {
        self.feedback.retain(|key, _| {
            view.find(key)
                .is_some_and(|m| matches!(m.block.action(), Some(ActionSlot::Success { .. })))
        });
        self.expanded_summaries.retain(|key| {
            view.find(key)
                .is_some_and(|m| matches!(m.block, Block::Visualization { .. }))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_app;

    #[test]
    fn test_app_new_defaults() {
        let app = test_app();
        assert!(app.messages.is_empty());
        assert_eq!(app.trace_id.as_deref(), Some("trace-test"));
        assert!(app.feedback.is_empty());
        assert_eq!(app.policy, RenderPolicy::default());
    }

    #[test]
    fn feedback_for_unknown_key_is_fresh() {
        let app = test_app();
        assert_eq!(
            app.feedback_for(&MessageKey::Index(0)),
            FeedbackMachine::new()
        );
    }

    #[test]
    fn prune_drops_state_for_unmounted_messages() {
        let mut app = test_app();
        app.messages = vec![Message::human("q"), Message::assistant("a").with_id("a1")];
        app.feedback
            .insert(MessageKey::Id("a1".into()), FeedbackMachine::new());
        app.feedback
            .insert(MessageKey::Id("gone".into()), FeedbackMachine::new());
        app.expanded_summaries.insert(MessageKey::Id("a1".into()));

        let view = app.view();
        app.prune_unmounted(&view);

        assert!(app.feedback.contains_key(&MessageKey::Id("a1".into())));
        assert!(!app.feedback.contains_key(&MessageKey::Id("gone".into())));
        // a1 is a text answer, not a visualization
        assert!(app.expanded_summaries.is_empty());
    }
}
