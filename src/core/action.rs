//! # Actions
//!
//! Everything that can happen in threadview becomes an `Action`.
//! User presses `+` on an answer? That's `Action::Rate`.
//! The snapshot file changed? That's `Action::ThreadLoaded`.
//!
//! The `update()` function applies an action to the state and returns an
//! `Effect` describing the I/O the caller should perform. No side effects here.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```

use log::{debug, info};

use crate::thread::{
    ActionSlot, Block, FeedbackStatus, Message, MessageKey, Rating, ThreadEvent,
};

use super::state::App;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A new snapshot of the thread arrived.
    ThreadLoaded {
        messages: Vec<Message>,
        trace_id: Option<String>,
        title: String,
    },
    Rate { key: MessageKey, rating: Rating },
    SubmitFeedback { key: MessageKey, text: String },
    DismissFeedback { key: MessageKey },
    /// Pick form option `index` (zero-based) under `key`.
    ChooseOption { key: MessageKey, index: usize },
    Retry { key: MessageKey },
    ToggleSummary { key: MessageKey },
    OpenInsight { key: MessageKey },
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    /// Deliver this event to the sink (fire-and-forget).
    Emit(ThreadEvent),
    Quit,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    debug!("update: {:?}", action);
    match action {
        Action::ThreadLoaded {
            messages,
            trace_id,
            title,
        } => {
            info!("Thread loaded: {} messages", messages.len());
            app.messages = messages;
            // The snapshot knows its own trace better than the command line
            if let Some(trace_id) = trace_id {
                if let Some(current) = app.trace_id.as_deref()
                    && current != trace_id
                {
                    info!("Snapshot trace id {} replaces {}", trace_id, current);
                }
                app.trace_id = Some(trace_id);
            }
            app.title = title;
            let view = app.view();
            app.prune_unmounted(&view);
            app.status_message = format!("{} messages", app.messages.len());
            Effect::None
        }
        Action::Rate { key, rating } => {
            if !has_success_actions(app, &key) {
                app.status_message = "Nothing to rate here".into();
                return Effect::None;
            }
            let trace_id = app.trace_id.clone();
            let machine = app.feedback.entry(key).or_default();
            match machine.submit_rating(rating, trace_id.as_deref()) {
                Some(event) => {
                    app.status_message = match rating {
                        Rating::Good => "Rated: good answer".into(),
                        Rating::Bad => "Rated: bad answer".into(),
                    };
                    Effect::Emit(event)
                }
                None => {
                    app.status_message = if trace_id.is_none() {
                        "No trace id, rating unavailable".into()
                    } else {
                        "Already rated".into()
                    };
                    Effect::None
                }
            }
        }
        Action::SubmitFeedback { key, text } => {
            let trace_id = app.trace_id.clone();
            let Some(machine) = app.feedback.get_mut(&key) else {
                return Effect::None;
            };
            if machine.status() != FeedbackStatus::Pending {
                return Effect::None;
            }
            match machine.submit_feedback(&text, trace_id.as_deref()) {
                Some(event) => {
                    app.status_message = "Thank you for your feedback!".into();
                    Effect::Emit(event)
                }
                None => Effect::None,
            }
        }
        Action::DismissFeedback { key } => {
            if let Some(machine) = app.feedback.get_mut(&key) {
                machine.dismiss();
            }
            Effect::None
        }
        Action::ChooseOption { key, index } => {
            let view = app.view();
            let option = view
                .find(&key)
                .and_then(|m| match m.block.action() {
                    Some(ActionSlot::Form(buttons)) => buttons.get(index),
                    _ => None,
                })
                .map(|button| button.value.clone());
            match option {
                Some(text) => {
                    app.status_message = format!("Sent: {text}");
                    Effect::Emit(ThreadEvent::ResubmitText { text })
                }
                None => {
                    app.status_message = "No such option".into();
                    Effect::None
                }
            }
        }
        Action::Retry { key } => {
            let retriable = app.view().find(&key).is_some_and(|m| {
                matches!(
                    m.block.action(),
                    Some(ActionSlot::Retry | ActionSlot::Success { retriable: true })
                )
            });
            if retriable {
                app.status_message = "Retrying last answer".into();
                Effect::Emit(ThreadEvent::RetryLastTurn)
            } else {
                app.status_message = "Retry is not available here".into();
                Effect::None
            }
        }
        Action::ToggleSummary { key } => {
            if !is_visualization(app, &key) {
                app.status_message = "No visualization here".into();
            } else if !app.expanded_summaries.remove(&key) {
                app.expanded_summaries.insert(key);
            }
            Effect::None
        }
        Action::OpenInsight { key } => {
            let query = app.view().find(&key).and_then(|m| match &m.block {
                Block::Visualization { query } => Some(query.clone()),
                _ => None,
            });
            match query {
                Some(query) => {
                    app.status_message = format!("Opening {} as new insight", query.heading());
                    Effect::Emit(ThreadEvent::OpenInsight { query })
                }
                None => {
                    app.status_message = "No visualization here".into();
                    Effect::None
                }
            }
        }
        Action::Quit => Effect::Quit,
    }
}

fn has_success_actions(app: &App, key: &MessageKey) -> bool {
    app.view()
        .find(key)
        .is_some_and(|m| matches!(m.block.action(), Some(ActionSlot::Success { .. })))
}

fn is_visualization(app: &App, key: &MessageKey) -> bool {
    app.view()
        .find(key)
        .is_some_and(|m| matches!(m.block, Block::Visualization { .. }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{form_message, test_app, viz_message};
    use crate::thread::MessageStatus;

    fn loaded(messages: Vec<Message>) -> App {
        let mut app = test_app();
        update(
            &mut app,
            Action::ThreadLoaded {
                messages,
                trace_id: None,
                title: "t".into(),
            },
        );
        app
    }

    fn key(i: usize) -> MessageKey {
        MessageKey::Index(i)
    }

    #[test]
    fn snapshot_trace_id_takes_precedence() {
        let mut app = test_app();
        let load = |app: &mut App, trace_id: Option<&str>| {
            update(
                app,
                Action::ThreadLoaded {
                    messages: vec![Message::human("hi")],
                    trace_id: trace_id.map(str::to_string),
                    title: "t".into(),
                },
            )
        };

        load(&mut app, None);
        assert_eq!(app.trace_id.as_deref(), Some("trace-test"));

        load(&mut app, Some("from-snapshot"));
        assert_eq!(app.trace_id.as_deref(), Some("from-snapshot"));

        // A later snapshot without one keeps the last known id
        load(&mut app, None);
        assert_eq!(app.trace_id.as_deref(), Some("from-snapshot"));
    }

    #[test]
    fn duplicate_ids_do_not_hide_the_answer() {
        let mut app = loaded(vec![
            Message::human("hi").with_id("m"),
            Message::assistant("hello").with_id("m"),
        ]);

        let effect = update(
            &mut app,
            Action::Rate {
                key: key(1),
                rating: Rating::Good,
            },
        );
        assert!(matches!(effect, Effect::Emit(ThreadEvent::SubmitRating { .. })));
        assert_eq!(app.feedback_for(&key(1)).rating(), Some(Rating::Good));
    }

    #[test]
    fn rating_emits_once() {
        let mut app = loaded(vec![Message::human("hi"), Message::assistant("hello")]);
        let effect = update(
            &mut app,
            Action::Rate {
                key: key(1),
                rating: Rating::Good,
            },
        );
        assert_eq!(
            effect,
            Effect::Emit(ThreadEvent::SubmitRating {
                trace_id: "trace-test".into(),
                rating: Rating::Good,
            })
        );
        let again = update(
            &mut app,
            Action::Rate {
                key: key(1),
                rating: Rating::Bad,
            },
        );
        assert_eq!(again, Effect::None);
        assert_eq!(app.feedback_for(&key(1)).rating(), Some(Rating::Good));
    }

    #[test]
    fn rating_a_human_message_is_a_no_op() {
        let mut app = loaded(vec![Message::human("hi"), Message::assistant("hello")]);
        let effect = update(
            &mut app,
            Action::Rate {
                key: key(0),
                rating: Rating::Good,
            },
        );
        assert_eq!(effect, Effect::None);
        assert!(app.feedback.is_empty());
    }

    #[test]
    fn bad_rating_then_feedback() {
        let mut app = loaded(vec![Message::human("hi"), Message::assistant("hello")]);
        update(
            &mut app,
            Action::Rate {
                key: key(1),
                rating: Rating::Bad,
            },
        );
        assert_eq!(app.feedback_for(&key(1)).status(), FeedbackStatus::Pending);

        let empty = update(
            &mut app,
            Action::SubmitFeedback {
                key: key(1),
                text: String::new(),
            },
        );
        assert_eq!(empty, Effect::None);
        assert_eq!(app.feedback_for(&key(1)).status(), FeedbackStatus::Pending);

        let sent = update(
            &mut app,
            Action::SubmitFeedback {
                key: key(1),
                text: "Wrong numbers".into(),
            },
        );
        assert_eq!(
            sent,
            Effect::Emit(ThreadEvent::SubmitFeedback {
                trace_id: "trace-test".into(),
                text: "Wrong numbers".into(),
            })
        );
        assert_eq!(app.feedback_for(&key(1)).status(), FeedbackStatus::Submitted);

        update(&mut app, Action::DismissFeedback { key: key(1) });
        assert_eq!(app.feedback_for(&key(1)).status(), FeedbackStatus::Hidden);
    }

    #[test]
    fn form_option_resubmits_value() {
        let mut app = loaded(vec![Message::human("hi"), form_message(&["Yes", "No"])]);
        let effect = update(&mut app, Action::ChooseOption { key: key(1), index: 1 });
        assert_eq!(
            effect,
            Effect::Emit(ThreadEvent::ResubmitText { text: "No".into() })
        );
        let out_of_range = update(&mut app, Action::ChooseOption { key: key(1), index: 5 });
        assert_eq!(out_of_range, Effect::None);
    }

    #[test]
    fn retry_only_where_offered() {
        let mut app = loaded(vec![
            Message::human("q1"),
            Message::assistant("a1"),
            Message::human("q2"),
            Message::assistant("a2"),
        ]);
        assert_eq!(update(&mut app, Action::Retry { key: key(1) }), Effect::None);
        assert_eq!(
            update(&mut app, Action::Retry { key: key(3) }),
            Effect::Emit(ThreadEvent::RetryLastTurn)
        );
    }

    #[test]
    fn summary_toggle_and_open_insight() {
        let mut app = loaded(vec![Message::human("q"), viz_message()]);
        update(&mut app, Action::ToggleSummary { key: key(1) });
        assert!(app.summary_expanded(&key(1)));
        update(&mut app, Action::ToggleSummary { key: key(1) });
        assert!(!app.summary_expanded(&key(1)));

        match update(&mut app, Action::OpenInsight { key: key(1) }) {
            Effect::Emit(ThreadEvent::OpenInsight { query }) => {
                assert_eq!(query.heading(), "Trends");
            }
            other => panic!("expected OpenInsight, got {other:?}"),
        }
        // Toggling a text message does nothing
        update(&mut app, Action::ToggleSummary { key: key(0) });
        assert!(!app.summary_expanded(&key(0)));
        assert_eq!(app.status_message, "No visualization here");
    }

    #[test]
    fn reload_unmounts_rating_state() {
        let mut app = loaded(vec![Message::human("hi"), Message::assistant("hello")]);
        update(
            &mut app,
            Action::Rate {
                key: key(1),
                rating: Rating::Bad,
            },
        );
        assert!(app.feedback.contains_key(&key(1)));

        // The answer is now followed by another turn and is still rendered,
        // but its slot moves: it keeps success actions (non-retriable).
        update(
            &mut app,
            Action::ThreadLoaded {
                messages: vec![
                    Message::human("hi"),
                    Message::assistant("hello"),
                    Message::human("again"),
                ],
                trace_id: None,
                title: "t".into(),
            },
        );
        assert!(app.feedback.contains_key(&key(1)));

        // The answer turned into a pending message: no more action slot.
        update(
            &mut app,
            Action::ThreadLoaded {
                messages: vec![
                    Message::human("hi"),
                    Message::assistant("hello").with_status(MessageStatus::Pending),
                ],
                trace_id: None,
                title: "t".into(),
            },
        );
        assert!(!app.feedback.contains_key(&key(1)));
    }

    #[test]
    fn reload_keeps_configured_trace_when_snapshot_has_none() {
        let app = loaded(vec![Message::human("hi")]);
        assert_eq!(app.trace_id.as_deref(), Some("trace-test"));
    }

    #[test]
    fn quit_effect() {
        let mut app = test_app();
        assert_eq!(update(&mut app, Action::Quit), Effect::Quit);
    }
}
