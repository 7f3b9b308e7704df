//! # Thread View Model
//!
//! Pure functions from a conversation snapshot to what should be on screen.
//!
//! ```text
//! &[Message] ──▶ group_messages ──▶ classify ──▶ render ──▶ ThreadView
//!                                                  │
//!                              FeedbackMachine ◀───┘ (success actions)
//! ```
//!
//! ## Modules
//!
//! - [`message`]: wire data model (serde)
//! - [`classify`]: narrows a message into a render variant
//! - [`group`]: maximal same-sender runs
//! - [`render`]: per-message dispatch into a [`render::Block`]
//! - [`view`]: the thread container
//! - [`feedback`]: rating/feedback state machine
//! - [`query`]: visualization query descriptors
//! - [`events`]: outbound events

pub mod classify;
pub mod events;
pub mod feedback;
pub mod group;
pub mod message;
pub mod query;
pub mod render;
pub mod view;

pub use events::{Rating, ThreadEvent};
pub use feedback::{FeedbackMachine, FeedbackStatus};
pub use message::{Message, MessageKey, MessageKind, MessageStatus, Role};
pub use query::QueryDescriptor;
pub use render::{ActionSlot, Block, RenderPolicy, Tone};
pub use view::{ThreadProps, ThreadView, ViewRow, build_thread_view};
