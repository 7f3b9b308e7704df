//! Events this layer hands to the outside world.
//!
//! They are values, not callbacks: the reducer returns them and the adapter
//! forwards them to an event sink.

use serde::{Deserialize, Serialize};

use super::query::QueryDescriptor;

/// Thumbs-up / thumbs-down quality rating.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Good,
    Bad,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ThreadEvent {
    /// Send `text` as a new human turn (form option picked).
    ResubmitText { text: String },
    /// Quality metric for the answer identified by `trace_id`.
    SubmitRating { trace_id: String, rating: Rating },
    SubmitFeedback { trace_id: String, text: String },
    /// Regenerate the last assistant turn.
    RetryLastTurn,
    /// Open the visualization's query in the insight editor.
    OpenInsight { query: QueryDescriptor },
}

impl ThreadEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ThreadEvent::ResubmitText { .. } => "resubmit_text",
            ThreadEvent::SubmitRating { .. } => "submit_rating",
            ThreadEvent::SubmitFeedback { .. } => "submit_feedback",
            ThreadEvent::RetryLastTurn => "retry_last_turn",
            ThreadEvent::OpenInsight { .. } => "open_insight",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_serialize_with_tag() {
        let rating = ThreadEvent::SubmitRating {
            trace_id: "t-1".into(),
            rating: Rating::Bad,
        };
        assert_eq!(
            serde_json::to_value(&rating).unwrap(),
            json!({"event": "submit_rating", "trace_id": "t-1", "rating": "bad"})
        );
        assert_eq!(
            serde_json::to_value(ThreadEvent::RetryLastTurn).unwrap(),
            json!({"event": "retry_last_turn"})
        );
    }

    #[test]
    fn name_matches_serialized_tag() {
        let events = [
            ThreadEvent::ResubmitText { text: "Yes".into() },
            ThreadEvent::SubmitFeedback {
                trace_id: "t".into(),
                text: "meh".into(),
            },
            ThreadEvent::RetryLastTurn,
        ];
        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["event"], event.name());
        }
    }
}
