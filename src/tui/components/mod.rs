//! # TUI Components
//!
//! All UI components for the terminal viewer.
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Created fresh each frame from the current `ThreadView`:
//! - `TitleBar`: thread title, status, trace id
//! - `MessageCard`: text answers, reasoning steps, the retry notice
//! - `VisualizationCard`: an assistant-built query and its definition
//!
//! ### Stateful Components (Event-Driven)
//!
//! Components that own local state and emit events:
//! - `MessageList`: scrollable thread with layout caching
//! - `FeedbackInput`: free-text feedback after a bad rating
//!
//! Components receive data as props, never by reaching into `App`:
//!
//! ```rust,ignore
//! TitleBar::new(&app.title, &app.status_message, app.trace_id.as_deref())
//!     .render(frame, area);
//! ```
//!
//! ```text
//! components/
//! ├── mod.rs
//! ├── title_bar.rs
//! ├── message.rs         (MessageCard)
//! ├── visualization.rs   (VisualizationCard)
//! ├── message_list.rs
//! └── feedback_input.rs
//! ```

pub mod feedback_input;
pub mod message;
pub mod message_list;
mod title_bar;
pub mod visualization;

pub use feedback_input::{FeedbackInput, FeedbackInputEvent};
pub use message_list::{MessageList, MessageListState};
pub use title_bar::TitleBar;
