//! # Event Sinks
//!
//! Delivery of [`ThreadEvent`]s to whoever acts on them (the assistant
//! session, analytics capture). Delivery is fire-and-forget:
//! [`Deliveries::dispatch`] spawns a task and returns immediately. Failures
//! are logged, never retried. On quit the pending tasks are drained with a
//! bounded wait.
//!
//! ```text
//! update() ─▶ Effect::Emit(event) ─▶ Deliveries::dispatch() ─▶ JoinSet ─▶ sink.deliver()
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::SinkKind;
use crate::core::config::ResolvedConfig;
use crate::thread::ThreadEvent;

/// An event stamped for delivery.
#[derive(Serialize, Debug, Clone)]
pub struct EventRecord {
    pub id: Uuid,
    pub emitted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: ThreadEvent,
}

impl EventRecord {
    pub fn new(event: ThreadEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            emitted_at: Utc::now(),
            event,
        }
    }
}

#[derive(Debug)]
pub enum SinkError {
    /// Sink misconfigured (e.g. webhook kind without a URL).
    Config(String),
    Io(std::io::Error),
    Network(String),
    /// Endpoint answered with a non-success status.
    Api { status: u16, message: String },
    Serialize(serde_json::Error),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::Config(msg) => write!(f, "sink config error: {msg}"),
            SinkError::Io(e) => write!(f, "sink I/O error: {e}"),
            SinkError::Network(msg) => write!(f, "network error: {msg}"),
            SinkError::Api { status, message } => {
                write!(f, "sink error (HTTP {status}): {message}")
            }
            SinkError::Serialize(e) => write!(f, "serialize error: {e}"),
        }
    }
}

impl std::error::Error for SinkError {}

#[async_trait]
pub trait EventSink: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    async fn deliver(&self, record: &EventRecord) -> Result<(), SinkError>;
}

/// Appends one JSON record per line.
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl EventSink for JsonlSink {
    fn name(&self) -> &str {
        "jsonl"
    }

    async fn deliver(&self, record: &EventRecord) -> Result<(), SinkError> {
        let mut line = serde_json::to_string(record).map_err(SinkError::Serialize)?;
        line.push('\n');

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(SinkError::Io)?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(SinkError::Io)?;
        file.write_all(line.as_bytes())
            .await
            .map_err(SinkError::Io)?;
        file.flush().await.map_err(SinkError::Io)?;
        Ok(())
    }
}

/// POSTs each record as JSON.
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: String, timeout: Duration) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SinkError::Config(e.to_string()))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl EventSink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn deliver(&self, record: &EventRecord) -> Result<(), SinkError> {
        let response = self
            .client
            .post(&self.url)
            .json(record)
            .send()
            .await
            .map_err(|e| SinkError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SinkError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

/// Discards events.
pub struct NoopSink;

#[async_trait]
impl EventSink for NoopSink {
    fn name(&self) -> &str {
        "none"
    }

    async fn deliver(&self, record: &EventRecord) -> Result<(), SinkError> {
        debug!("Dropping event {} ({})", record.event.name(), record.id);
        Ok(())
    }
}

/// Build the sink selected by the resolved config.
pub fn build_sink(config: &ResolvedConfig) -> Result<Arc<dyn EventSink>, SinkError> {
    match config.sink {
        SinkKind::Jsonl => Ok(Arc::new(JsonlSink::new(config.outbox_path.clone()))),
        SinkKind::Webhook => {
            let url = config.webhook_url.clone().ok_or_else(|| {
                SinkError::Config(
                    "webhook sink needs a URL (config [sink].webhook_url or THREADVIEW_WEBHOOK_URL)"
                        .into(),
                )
            })?;
            Ok(Arc::new(WebhookSink::new(
                url,
                Duration::from_secs(config.webhook_timeout_secs),
            )?))
        }
        SinkKind::None => Ok(Arc::new(NoopSink)),
    }
}

/// Background deliveries still in flight.
///
/// Each emitted event gets its own task. Dropping the runtime aborts
/// whatever has not finished, so the owner calls [`Deliveries::drain`]
/// before shutting down.
#[derive(Default)]
pub struct Deliveries {
    tasks: JoinSet<()>,
}

impl Deliveries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` in the background. Must be called inside a tokio runtime.
    pub fn dispatch(&mut self, sink: Arc<dyn EventSink>, event: ThreadEvent) {
        // Reap finished tasks so the set only holds pending ones
        while self.tasks.try_join_next().is_some() {}

        let record = EventRecord::new(event);
        info!(
            "Dispatching {} ({}) via {}",
            record.event.name(),
            record.id,
            sink.name()
        );
        self.tasks.spawn(async move {
            if let Err(e) = sink.deliver(&record).await {
                warn!(
                    "Failed to deliver {} ({}) via {}: {}",
                    record.event.name(),
                    record.id,
                    sink.name(),
                    e
                );
            }
        });
    }

    /// Number of deliveries not yet reaped.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Wait up to `timeout` for outstanding deliveries, then abort the rest.
    /// Returns how many were abandoned.
    pub async fn drain(mut self, timeout: Duration) -> usize {
        if self.tasks.is_empty() {
            return 0;
        }
        debug!("Waiting for {} pending deliveries", self.tasks.len());
        let joined = tokio::time::timeout(timeout, async {
            while self.tasks.join_next().await.is_some() {}
        })
        .await;

        match joined {
            Ok(()) => 0,
            Err(_) => {
                let abandoned = self.tasks.len();
                warn!(
                    "Gave up on {} undelivered event(s) after {:?}",
                    abandoned, timeout
                );
                self.tasks.abort_all();
                abandoned
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread::Rating;

    #[test]
    fn record_flattens_event() {
        let record = EventRecord::new(ThreadEvent::SubmitRating {
            trace_id: "t".into(),
            rating: Rating::Good,
        });
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["event"], "submit_rating");
        assert_eq!(value["rating"], "good");
        assert!(value["id"].is_string());
        assert!(value["emitted_at"].is_string());
    }

    #[test]
    fn noop_sink_accepts_everything() {
        let record = EventRecord::new(ThreadEvent::RetryLastTurn);
        tokio_test::block_on(async {
            assert!(NoopSink.deliver(&record).await.is_ok());
        });
    }

    #[test]
    fn jsonl_sink_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("outbox.jsonl");
        let sink = JsonlSink::new(path.clone());

        tokio_test::block_on(async {
            sink.deliver(&EventRecord::new(ThreadEvent::RetryLastTurn))
                .await
                .unwrap();
            sink.deliver(&EventRecord::new(ThreadEvent::ResubmitText {
                text: "Yes".into(),
            }))
            .await
            .unwrap();
        });

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["event"], "resubmit_text");
        assert_eq!(second["text"], "Yes");
    }

    #[test]
    fn webhook_kind_without_url_is_config_error() {
        let config = ResolvedConfig {
            trace_id: None,
            log_level: log::LevelFilter::Info,
            poll_interval_ms: 500,
            rate_limit_markers: vec![],
            sink: SinkKind::Webhook,
            outbox_path: PathBuf::from("unused.jsonl"),
            webhook_url: None,
            webhook_timeout_secs: 1,
        };
        assert!(matches!(build_sink(&config), Err(SinkError::Config(_))));
    }

    #[tokio::test]
    async fn dispatch_delivers_in_background() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outbox.jsonl");
        let sink: Arc<dyn EventSink> = Arc::new(JsonlSink::new(path.clone()));

        let mut deliveries = Deliveries::new();
        deliveries.dispatch(sink, ThreadEvent::RetryLastTurn);
        assert_eq!(deliveries.drain(Duration::from_secs(5)).await, 0);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("retry_last_turn"));
    }

    #[test]
    fn drained_events_survive_runtime_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outbox.jsonl");
        let sink: Arc<dyn EventSink> = Arc::new(JsonlSink::new(path.clone()));

        let rt = tokio::runtime::Runtime::new().unwrap();
        let abandoned = rt.block_on(async {
            let mut deliveries = Deliveries::new();
            deliveries.dispatch(
                sink,
                ThreadEvent::SubmitRating {
                    trace_id: "t".into(),
                    rating: Rating::Good,
                },
            );
            // Quit right after the emit
            deliveries.drain(Duration::from_secs(5)).await
        });
        drop(rt);

        assert_eq!(abandoned, 0);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("submit_rating"));
    }

    struct StalledSink;

    #[async_trait]
    impl EventSink for StalledSink {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn deliver(&self, _record: &EventRecord) -> Result<(), SinkError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn drain_gives_up_after_timeout() {
        let mut deliveries = Deliveries::new();
        deliveries.dispatch(Arc::new(StalledSink), ThreadEvent::RetryLastTurn);
        deliveries.dispatch(Arc::new(NoopSink), ThreadEvent::RetryLastTurn);
        assert_eq!(deliveries.pending(), 2);

        let abandoned = deliveries.drain(Duration::from_millis(50)).await;
        assert_eq!(abandoned, 1);
    }

    #[tokio::test]
    async fn drain_with_nothing_pending_returns_immediately() {
        assert_eq!(Deliveries::new().drain(Duration::ZERO).await, 0);
    }
}
