//! # Core Application Logic
//!
//! Threadview's business logic. It knows nothing about any specific UI
//! technology; the rendering rules themselves live in [`crate::thread`].
//!
//! ```text
//!   snapshot file ──▶ snapshot::load_snapshot ──▶ Action::ThreadLoaded
//!                                                        │
//!   key press ──▶ Action ──▶ update(&mut App, action) ◀──┘
//!                                   │
//!                                   ▼
//!                      Effect::Emit(event) ──▶ Deliveries::dispatch
//! ```
//!
//! ## Modules
//!
//! - [`state`]: The `App` struct, all viewer state in one place
//! - [`action`]: The `Action` enum and the `update()` reducer
//! - [`config`]: `~/.threadview/config.toml` loading and resolution
//! - [`snapshot`]: Reading thread snapshots from disk
//! - [`sink`]: Delivering emitted events (JSONL outbox, webhook)

pub mod action;
pub mod config;
pub mod sink;
pub mod snapshot;
pub mod state;
