//! # Rating & Feedback
//!
//! Per-answer state behind the thumbs-up/down buttons:
//!
//! ```text
//!            submit_rating(Good)
//! (unrated, hidden) ───────────────▶ (good, hidden)
//!        │
//!        │ submit_rating(Bad)
//!        ▼                 submit_feedback(text)
//!   (bad, pending) ──────────────────────────────▶ (bad, submitted)
//!
//! dismiss(): feedback → hidden from any state
//! ```
//!
//! A rating is first-write-wins. Nothing here talks to the network: accepted
//! transitions return the [`ThreadEvent`] the caller should deliver.

use super::events::{Rating, ThreadEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedbackStatus {
    #[default]
    Hidden,
    /// Waiting for the user to explain a bad rating.
    Pending,
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeedbackMachine {
    rating: Option<Rating>,
    status: FeedbackStatus,
}

impl FeedbackMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rating(&self) -> Option<Rating> {
        self.rating
    }

    pub fn status(&self) -> FeedbackStatus {
        self.status
    }

    /// Rate the answer. Ignored once rated or without a trace to attach it to.
    pub fn submit_rating(&mut self, value: Rating, trace_id: Option<&str>) -> Option<ThreadEvent> {
        if self.rating.is_some() {
            return None;
        }
        let trace_id = trace_id.filter(|t| !t.is_empty())?;

        self.rating = Some(value);
        if value == Rating::Bad {
            self.status = FeedbackStatus::Pending;
        }
        Some(ThreadEvent::SubmitRating {
            trace_id: trace_id.to_string(),
            rating: value,
        })
    }

    /// Send free-text feedback. Blank text is ignored.
    pub fn submit_feedback(&mut self, text: &str, trace_id: Option<&str>) -> Option<ThreadEvent> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let trace_id = trace_id.filter(|t| !t.is_empty())?;

        self.status = FeedbackStatus::Submitted;
        Some(ThreadEvent::SubmitFeedback {
            trace_id: trace_id.to_string(),
            text: text.to_string(),
        })
    }

    pub fn dismiss(&mut self) {
        self.status = FeedbackStatus::Hidden;
    }

    /// Which rating buttons are still on screen: the chosen one stays, the
    /// other disappears.
    pub fn visible_ratings(&self) -> &'static [Rating] {
        match self.rating {
            None => &[Rating::Good, Rating::Bad],
            Some(Rating::Good) => &[Rating::Good],
            Some(Rating::Bad) => &[Rating::Bad],
        }
    }
}
