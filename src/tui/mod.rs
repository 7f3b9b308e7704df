//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the thread,
//! and translates keyboard events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Redraw Strategy
//!
//! The event loop redraws only when something changed:
//!
//! - **Animating** (a reasoning spinner is on screen): draws every ~80ms.
//! - **Idle**: sleeps up to the snapshot poll interval, redrawing on events,
//!   terminal resize, or a reloaded snapshot.
//!
//! ## Key Targets
//!
//! Keys act on the selected row when it offers that action. With nothing
//! (or something unrelated) selected, they act on the last row that does,
//! which is almost always the latest answer.

mod component;
mod components;
mod event;
pub mod markdown;
mod ui;

use log::{debug, info, warn};
use std::io::stdout;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use crossterm::cursor::{SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;

use crate::core::action::{Action, Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::sink::{self, Deliveries, EventSink};
use crate::core::snapshot::{self, ThreadSnapshot};
use crate::core::state::App;
use crate::thread::{ActionSlot, Block, FeedbackStatus, MessageKey, Rating, ViewRow};
use crate::tui::component::EventHandler;
use crate::tui::components::{FeedbackInput, FeedbackInputEvent, MessageListState};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

const ANIMATION_INTERVAL: Duration = Duration::from_millis(80);

/// Modal input mode: determines how keyboard events are interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    /// Navigate rows and trigger actions with single keys.
    Browse,
    /// Typing feedback for the bad rating on `key`.
    Feedback { key: MessageKey },
}

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub message_list: MessageListState,
    pub feedback_input: FeedbackInput,
    pub input_mode: InputMode,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            message_list: MessageListState::new(),
            feedback_input: FeedbackInput::new(),
            input_mode: InputMode::Browse,
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Kitty keyboard protocol is ignored by terminals that lack it
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Show
        );
    }
}

/// Watches the snapshot file and reloads it when its mtime moves.
struct SnapshotWatcher {
    path: PathBuf,
    last_mtime: Option<SystemTime>,
    last_check: Instant,
    interval: Duration,
}

impl SnapshotWatcher {
    fn new(path: PathBuf, interval: Duration) -> Self {
        Self {
            last_mtime: snapshot::snapshot_mtime(&path),
            path,
            last_check: Instant::now(),
            interval,
        }
    }

    /// A freshly parsed snapshot if the file changed since the last poll.
    /// Unparseable rewrites are logged and skipped; the previous thread stays.
    fn poll(&mut self) -> Option<ThreadSnapshot> {
        if self.last_check.elapsed() < self.interval {
            return None;
        }
        self.last_check = Instant::now();

        let mtime = snapshot::snapshot_mtime(&self.path);
        if mtime.is_none() || mtime == self.last_mtime {
            return None;
        }
        self.last_mtime = mtime;

        match snapshot::load_snapshot(&self.path) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Keeping previous thread, reload failed: {}", e);
                None
            }
        }
    }
}

fn loaded(snapshot: ThreadSnapshot) -> Action {
    let title = snapshot.display_title();
    Action::ThreadLoaded {
        messages: snapshot.messages,
        trace_id: snapshot.trace_id,
        title,
    }
}

/// Run the viewer until the user quits. Returns the deliveries still in
/// flight so the caller can drain them before the runtime shuts down.
pub fn run(config: ResolvedConfig, thread_file: PathBuf) -> std::io::Result<Deliveries> {
    let sink: Arc<dyn EventSink> =
        sink::build_sink(&config).map_err(|e| std::io::Error::other(e.to_string()))?;
    let initial = snapshot::load_snapshot(&thread_file).map_err(|e| {
        std::io::Error::other(format!("cannot open {}: {}", thread_file.display(), e))
    })?;

    let mut app = App::from_config(&config);
    update(&mut app, loaded(initial));
    let mut tui = TuiState::new();
    let mut watcher = SnapshotWatcher::new(
        thread_file,
        Duration::from_millis(config.poll_interval_ms),
    );

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    let start_time = Instant::now();
    let mut needs_redraw = true;
    let mut deliveries = Deliveries::new();

    loop {
        if let Some(snapshot) = watcher.poll() {
            info!("Snapshot changed, reloading");
            update(&mut app, loaded(snapshot));
            tui.message_list.invalidate_from(0);
            tui.message_list.selected_index = None;
            tui.message_list.form_cursor = 0;
            leave_stale_feedback_mode(&app, &mut tui);
            needs_redraw = true;
        }

        let view = app.view();
        let rows = view.rows();
        let animating = rows
            .iter()
            .any(|r| matches!(r.block(), Block::Reasoning { .. }));
        if animating {
            needs_redraw = true;
        }

        if needs_redraw {
            let spinner_frame = (start_time.elapsed().as_secs_f32() * 12.0) as usize;
            terminal.draw(|f| ui::draw_ui(f, &app, &rows, &mut tui, spinner_frame))?;
            needs_redraw = false;
        }

        let timeout = if animating {
            ANIMATION_INTERVAL
        } else {
            watcher.interval
        };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }

        let mut should_quit = false;
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if matches!(event, TuiEvent::Resize) {
                continue;
            }

            // Rows are rebuilt per event: earlier events may have changed them
            let view = app.view();
            let rows = view.rows();

            if let TuiEvent::MouseMove(_, row) | TuiEvent::MouseClick(_, row) = event {
                let frame_area = terminal.get_frame().area();
                let hit = ui::hit_test_message(
                    row,
                    frame_area,
                    tui.message_list.scroll_state.offset().y,
                    &tui.message_list.layout.prefix_heights,
                    ui::footer_height(&tui, frame_area.width),
                );
                if hit.is_some() || matches!(event, TuiEvent::MouseMove(..)) {
                    tui.message_list.selected_index = hit;
                }
                continue;
            }

            if matches!(
                event,
                TuiEvent::ScrollUp
                    | TuiEvent::ScrollDown
                    | TuiEvent::ScrollPageUp
                    | TuiEvent::ScrollPageDown
                    | TuiEvent::ScrollToBottom
            ) {
                tui.message_list.handle_event(&event);
                continue;
            }

            let mode = tui.input_mode.clone();
            let action = match (mode, &event) {
                (_, TuiEvent::ForceQuit) => Some(Action::Quit),
                (InputMode::Feedback { key }, _) => feedback_action(&mut tui, key, &event),
                (InputMode::Browse, TuiEvent::CursorUp) => {
                    tui.message_list.select_previous(rows.len());
                    None
                }
                (InputMode::Browse, TuiEvent::CursorDown) => {
                    tui.message_list.select_next(rows.len());
                    None
                }
                (InputMode::Browse, TuiEvent::Home) => {
                    if !rows.is_empty() {
                        tui.message_list.selected_index = Some(0);
                        tui.message_list.scroll_to_selected();
                    }
                    None
                }
                (InputMode::Browse, TuiEvent::CursorLeft | TuiEvent::CursorRight) => {
                    let delta = if event == TuiEvent::CursorLeft { -1 } else { 1 };
                    let list = &mut tui.message_list;
                    list.form_cursor =
                        step_form_cursor(&rows, list.selected_index, list.form_cursor, delta);
                    None
                }
                (InputMode::Browse, _) => browse_action(
                    &app,
                    &rows,
                    tui.message_list.selected_index,
                    tui.message_list.form_cursor,
                    &event,
                ),
            };

            let Some(action) = action else {
                continue;
            };
            let touched = action_key(&action).and_then(|key| row_of(&rows, key));
            let rated_bad = match &action {
                Action::Rate {
                    key,
                    rating: Rating::Bad,
                } => Some(key.clone()),
                _ => None,
            };

            match update(&mut app, action) {
                Effect::None => {}
                Effect::Emit(thread_event) => {
                    deliveries.dispatch(sink.clone(), thread_event);
                }
                Effect::Quit => should_quit = true,
            }
            tui.message_list.invalidate_from(touched.unwrap_or(0));

            if let Some(key) = rated_bad
                && app.feedback_for(&key).status() == FeedbackStatus::Pending
            {
                debug!("Collecting feedback for {}", key);
                tui.feedback_input = FeedbackInput::new();
                tui.input_mode = InputMode::Feedback { key };
            }
            leave_stale_feedback_mode(&app, &mut tui);
        }

        if should_quit {
            break;
        }
    }

    ratatui::restore();
    Ok(deliveries)
}

/// Back to browsing once the answer being explained no longer wants feedback.
fn leave_stale_feedback_mode(app: &App, tui: &mut TuiState) {
    if let InputMode::Feedback { key } = &tui.input_mode
        && app.feedback_for(key).status() != FeedbackStatus::Pending
    {
        tui.input_mode = InputMode::Browse;
        tui.feedback_input = FeedbackInput::new();
    }
}

fn feedback_action(tui: &mut TuiState, key: MessageKey, event: &TuiEvent) -> Option<Action> {
    match tui.feedback_input.handle_event(event)? {
        FeedbackInputEvent::Submit(text) => {
            if text.trim().is_empty() {
                return None;
            }
            Some(Action::SubmitFeedback { key, text })
        }
        FeedbackInputEvent::Dismiss => Some(Action::DismissFeedback { key }),
        FeedbackInputEvent::ContentChanged => None,
    }
}

/// Map a Browse-mode key to the action it triggers, if any.
fn browse_action(
    app: &App,
    rows: &[ViewRow<'_>],
    selected: Option<usize>,
    form_cursor: usize,
    event: &TuiEvent,
) -> Option<Action> {
    let c = match event {
        TuiEvent::Escape => return Some(Action::Quit),
        TuiEvent::Submit => {
            let (key, len) = target_form(rows, selected)?;
            return (form_cursor < len).then_some(Action::ChooseOption {
                key,
                index: form_cursor,
            });
        }
        TuiEvent::InputChar(c) => *c,
        _ => return None,
    };
    match c {
        'q' => Some(Action::Quit),
        '+' | '=' => target_key(rows, selected, |b| {
            matches!(b.action(), Some(ActionSlot::Success { .. }))
        })
        .map(|key| Action::Rate {
            key,
            rating: Rating::Good,
        }),
        '-' => target_key(rows, selected, |b| {
            matches!(b.action(), Some(ActionSlot::Success { .. }))
        })
        .map(|key| Action::Rate {
            key,
            rating: Rating::Bad,
        }),
        'r' => target_key(rows, selected, |b| {
            matches!(
                b.action(),
                Some(ActionSlot::Retry | ActionSlot::Success { retriable: true })
            )
        })
        .map(|key| Action::Retry { key }),
        '1'..='9' => {
            let index = c as usize - '1' as usize;
            target_key(rows, selected, |b| {
                matches!(b.action(), Some(ActionSlot::Form(buttons)) if index < buttons.len())
            })
            .map(|key| Action::ChooseOption { key, index })
        }
        's' => target_key(rows, selected, |b| matches!(b, Block::Visualization { .. }))
            .map(|key| Action::ToggleSummary { key }),
        'o' => target_key(rows, selected, |b| matches!(b, Block::Visualization { .. }))
            .map(|key| Action::OpenInsight { key }),
        'x' => target_key(rows, selected, |b| {
            matches!(b.action(), Some(ActionSlot::Success { .. }))
        })
        .filter(|key| app.feedback_for(key).status() != FeedbackStatus::Hidden)
        .map(|key| Action::DismissFeedback { key }),
        _ => None,
    }
}

/// Form targeted by the option keys, with its option count.
fn target_form(rows: &[ViewRow<'_>], selected: Option<usize>) -> Option<(MessageKey, usize)> {
    let key = target_key(rows, selected, |b| matches!(b.action(), Some(ActionSlot::Form(_))))?;
    let len = rows
        .iter()
        .find(|row| row.key() == Some(&key))
        .and_then(|row| match row.block().action() {
            Some(ActionSlot::Form(buttons)) => Some(buttons.len()),
            _ => None,
        })?;
    Some((key, len))
}

/// Move the form cursor by `delta`, staying on the targeted form's options.
fn step_form_cursor(
    rows: &[ViewRow<'_>],
    selected: Option<usize>,
    cursor: usize,
    delta: isize,
) -> usize {
    match target_form(rows, selected) {
        Some((_, len)) if len > 0 => cursor.saturating_add_signed(delta).min(len - 1),
        _ => 0,
    }
}

/// The selected row if it matches, else the last matching row.
fn target_key(
    rows: &[ViewRow<'_>],
    selected: Option<usize>,
    wants: impl Fn(&Block) -> bool,
) -> Option<MessageKey> {
    let selected_row = selected
        .and_then(|i| rows.get(i))
        .filter(|row| wants(row.block()));
    selected_row
        .or_else(|| rows.iter().rev().find(|row| wants(row.block())))
        .and_then(|row| row.key().cloned())
}

fn row_of(rows: &[ViewRow<'_>], key: &MessageKey) -> Option<usize> {
    rows.iter().position(|row| row.key() == Some(key))
}

fn action_key(action: &Action) -> Option<&MessageKey> {
    match action {
        Action::Rate { key, .. }
        | Action::SubmitFeedback { key, .. }
        | Action::DismissFeedback { key }
        | Action::ChooseOption { key, .. }
        | Action::Retry { key }
        | Action::ToggleSummary { key }
        | Action::OpenInsight { key } => Some(key),
        Action::ThreadLoaded { .. } | Action::Quit => None,
    }
}
