use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use simplelog::{ConfigBuilder, WriteLogger};
use threadview::SinkKind;
use threadview::core::config::{self, CliOverrides};
use threadview::tui;

#[derive(Parser)]
#[command(name = "threadview", about = "Terminal viewer for AI assistant threads")]
struct Args {
    /// Thread snapshot to display (JSON, reloaded when it changes)
    thread_file: PathBuf,

    /// Trace id attached to ratings and feedback. A snapshot that carries its
    /// own trace_id takes precedence.
    #[arg(long)]
    trace_id: Option<String>,

    /// Where emitted events are delivered
    #[arg(long, value_enum)]
    sink: Option<SinkKind>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let file_config = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: {e}, using defaults");
            config::ThreadviewConfig::default()
        }
    };
    let resolved = config::resolve(
        &file_config,
        &CliOverrides {
            trace_id: args.trace_id.as_deref(),
            sink: args.sink.clone(),
        },
    );

    // Initialize file logger - writes to threadview.log in current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create("threadview.log") {
        let _ = WriteLogger::init(resolved.log_level, log_config, log_file);
    }

    log::info!(
        "threadview starting: file={}, sink={:?}, trace_id={:?}, poll={}ms",
        args.thread_file.display(),
        resolved.sink,
        resolved.trace_id,
        resolved.poll_interval_ms
    );

    let drain_timeout = Duration::from_secs(resolved.webhook_timeout_secs);
    let deliveries = tui::run(resolved, args.thread_file)?;
    deliveries.drain(drain_timeout).await;
    Ok(())
}
