//! RichNotes entrypoint.
//!
//! Wires the two halves of a note session — the host task that owns
//! the file and the view task that owns the editable document — over
//! bounded in-process channels, plus the file watcher feeding the
//! host. Runs until Ctrl-C, then shuts the view down first so its
//! pending autosave flushes through the host before the channels
//! close.

use anyhow::Result;
use clap::Parser;
use note_host::{spawn_note_watcher, DocumentSynchronizer, NoPicker};
use note_protocol::{session_channels, CHANNEL_CAP};
use note_view::ViewEvent;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "richnotes", version, about = "Rich-text note session")]
struct Args {
    /// Note file to open.
    pub note: PathBuf,
    /// Optional configuration file path (overrides discovery of
    /// `richnotes.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Seed the note with starter content when the file does not
    /// exist yet.
    #[arg(long)]
    pub create: bool,
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = Path::new(".");
    let log_path = log_dir.join("richnotes.log");
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(log_dir, "richnotes.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .try_init()
    {
        Ok(_) => Some(guard),
        // Global subscriber already installed; drop the guard so the
        // writer shuts down.
        Err(_) => None,
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = configure_logging();
    install_panic_hook();

    let args = Args::parse();
    let config = note_config::load_from(args.config.clone())?;
    info!(
        target: "runtime",
        note = %args.note.display(),
        quiet_ms = config.autosave.quiet_ms,
        config_override = args.config.is_some(),
        "startup"
    );

    if args.create && !args.note.exists() {
        DocumentSynchronizer::create_note(&args.note)?;
    }

    let ((view_tx, view_rx), (host_tx, host_rx)) = session_channels();
    let (watch_tx, watch_rx) = mpsc::channel(CHANNEL_CAP);
    // Dropping the watcher stops the notifications, so it lives for
    // the whole session.
    let _watcher = spawn_note_watcher(&args.note, watch_tx)?;

    let host = tokio::spawn(note_host::run(
        args.note.clone(),
        Box::new(NoPicker),
        host_tx,
        view_rx,
        watch_rx,
    ));

    let (events_tx, events_rx) = mpsc::channel::<ViewEvent>(CHANNEL_CAP);
    let view = tokio::spawn(note_view::run(
        view_tx,
        host_rx,
        events_rx,
        config.quiet_window(),
        config.status_linger(),
    ));

    tokio::signal::ctrl_c().await?;
    info!(target: "runtime", "shutdown");

    // View first: its teardown flushes a dirty document as one last
    // save, which the host still drains before its channel closes.
    let _ = events_tx.send(ViewEvent::Shutdown).await;
    if let Err(e) = view.await? {
        error!(target: "runtime", %e, "view_task_failed");
    }
    if let Err(e) = host.await? {
        error!(target: "runtime", %e, "host_task_failed");
    }
    Ok(())
}
