#![forbid(unsafe_code)]

mod color;
mod config;
mod constants;
mod engine;
mod error;
mod event_handler;
mod font;
mod font_discovery;
mod hotkeys;
mod icon;
mod persistence;
mod pointer;
mod tray;
mod types;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{error, info, warn, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use config::Configuration;
use engine::{initial_configuration, ProfileEngine};
use event_handler::{App, Command, Flow};
use font::FontRenderer;
use hotkeys::EvdevBinder;
use icon::{BaseGlyph, IconCompositor};
use persistence::ConfigFile;
use pointer::X11PointerSink;
use tray::TrayPresenter;

/// Turns SIGINT/SIGTERM into `Command::Quit` so shutdown runs on the dispatcher
fn spawn_signal_listener(sender: UnboundedSender<Command>) -> Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM]).context("Failed to register signal handlers")?;
    std::thread::spawn(move || {
        for signal in signals.forever() {
            info!(signal, "Received termination signal");
            if sender.send(Command::Quit).is_err() {
                break;
            }
        }
    });
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let (tx, mut rx) = mpsc::unbounded_channel();

    let sink = X11PointerSink::connect()?;
    let binder = EvdevBinder::spawn(tx.clone());
    let source = ConfigFile::default_location();
    info!(path = %source.path().display(), "Using configuration file");

    let (configuration, startup_error) = match initial_configuration(&sink, &source) {
        Ok(configuration) => (configuration, None),
        Err(e) => {
            error!(error = %e, "Failed to load configuration, starting without profiles");
            (Configuration::default(), Some(format!("Configuration error: {e}")))
        }
    };

    let engine = ProfileEngine::new(sink, binder, configuration);

    let rasterizer = FontRenderer::from_system_font(constants::icon::FONT_SIZE)
        .inspect_err(|e| warn!(error = %e, "No numeral font, tray shows the plain icon"))
        .ok();
    let compositor = IconCompositor::new(rasterizer, BaseGlyph::bundled()?);

    let mut app = App::new(engine, source, compositor);
    if let Some(message) = startup_error {
        app.report(message);
    }

    let mut presenter = TrayPresenter::spawn(tx.clone(), app.view())
        .await
        .context("Failed to create system tray icon")?;

    spawn_signal_listener(tx)?;

    while let Some(command) = rx.recv().await {
        match app.handle(command) {
            Flow::Continue(view) => {
                if let Err(e) = presenter.show(view).await {
                    error!(error = %e, "Failed to refresh tray icon");
                }
            }
            Flow::Quit => break,
        }
    }

    app.shutdown();
    presenter.shutdown().await;
    info!("Exiting");
    Ok(())
}
