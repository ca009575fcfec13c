//! Sound Menu
//!
//! Tray utility that switches the output device of individual applications
//! through SoundVolumeView.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sound_menu::audio_tool::SoundVolumeView;
use sound_menu::cli::{Args, Settings};
use sound_menu::config::AppConfig;
use sound_menu::paths::AppPaths;
use sound_menu::refresher::Refresher;
use sound_menu::tray::TrayCommand;
use sound_menu::Engine;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse_normalized();

    let paths = match &args.config {
        Some(config) => AppPaths::with_config(config.clone()),
        None => AppPaths::detect(),
    };
    paths.ensure_directories()?;

    let _log_guard = init_logging(&args.log_level, &paths.logs_dir)?;

    info!("Starting Sound Menu v{}...", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration file: {} ({})",
        paths.config.display(),
        if paths.is_portable { "portable" } else { "installed" }
    );

    let config = AppConfig::load_or_default(&paths.config).await;
    let settings = Settings::from_args(&args);
    debug!(?settings, "Resolved settings");

    let favorites_file = paths.favorites_file(&config);
    let tool = Arc::new(SoundVolumeView::new(config.tool.clone()));
    let engine = Arc::new(Engine::new(tool, settings));

    engine.load_favorites(&favorites_file).await;
    engine.refresh_logged().await;

    let refresher = Refresher::spawn(Arc::clone(&engine), config.refresh_interval());

    let (command_tx, command_rx) = mpsc::unbounded_channel::<TrayCommand>();
    let tray = ui::start(&engine, &config, command_tx.clone())?;

    run_app(&engine, command_rx, shutdown_signal()).await;

    // Cleanup
    info!("Shutting down...");
    drop(command_tx);
    tray.stop();
    refresher.stop().await;

    match engine.save_favorites(&favorites_file).await {
        Ok(true) => debug!("Favorites written to {}", favorites_file.display()),
        Ok(false) => {}
        Err(e) => warn!("{:#}", anyhow::Error::new(e)),
    }

    info!("Sound Menu shutdown complete");
    Ok(())
}

async fn run_app(
    engine: &Engine,
    mut commands: mpsc::UnboundedReceiver<TrayCommand>,
    shutdown: impl std::future::Future<Output = ()>,
) {
    info!("Ready");
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(command) = commands.recv() => {
                if !handle_command(engine, command).await {
                    info!("Exit selected");
                    break;
                }
            }

            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping event loop");
                break;
            }
        }
    }
}

/// Returns false when the application should exit
async fn handle_command(engine: &Engine, command: TrayCommand) -> bool {
    debug!(?command, "Tray command");
    match command {
        TrayCommand::Action(action) => engine.dispatch(action).await,
        TrayCommand::Refresh => engine.refresh_logged().await,
        TrayCommand::ToggleFavoriteMode => engine.toggle_favorite_mode(),
        TrayCommand::ToggleEditMode => engine.toggle_edit_mode(),
        TrayCommand::ClearFavorites => engine.clear_favorites(),
        TrayCommand::OpenVolumeSettings => engine.open_volume_settings().await,
        TrayCommand::OpenToolWindow => engine.open_tool_window().await,
        TrayCommand::Shutdown => return false,
    }
    true
}

fn init_logging(level: &str, logs_dir: &Path) -> Result<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::daily(logs_dir, "sound-menu.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .try_init()?;

    Ok(guard)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(windows)]
mod ui {
    use super::*;
    use sound_menu::tray::{build_menu, double_click_command, TrayManager, TrayUpdate};
    use std::thread::JoinHandle;

    pub struct TrayHandle {
        update_tx: crossbeam::channel::Sender<TrayUpdate>,
        thread: JoinHandle<()>,
    }

    impl TrayHandle {
        pub fn stop(self) {
            let _ = self.update_tx.send(TrayUpdate::Quit);
            if self.thread.join().is_err() {
                warn!("Tray thread panicked");
            }
        }
    }

    /// Start the tray thread and feed it a menu after every engine change
    pub fn start(
        engine: &Arc<Engine>,
        config: &AppConfig,
        command_tx: mpsc::UnboundedSender<TrayCommand>,
    ) -> Result<TrayHandle> {
        let (update_tx, update_rx) = crossbeam::channel::unbounded();

        let listener_tx = update_tx.clone();
        engine.subscribe(move |snapshot| {
            let _ = listener_tx.send(TrayUpdate::Menu(build_menu(snapshot)));
        });
        update_tx.send(TrayUpdate::Menu(build_menu(&engine.snapshot())))?;

        let manager = TrayManager::new(
            update_rx,
            command_tx,
            config.tray.clone(),
            double_click_command(&engine.settings()),
        );
        let thread = std::thread::Builder::new()
            .name("tray".into())
            .spawn(move || {
                if let Err(e) = manager.run() {
                    warn!("Tray manager error: {}", e);
                }
            })?;

        info!("System tray started");
        Ok(TrayHandle { update_tx, thread })
    }
}

#[cfg(not(windows))]
mod ui {
    use super::*;

    pub struct TrayHandle;

    impl TrayHandle {
        pub fn stop(self) {}
    }

    /// No native tray; log what the menu would show
    pub fn start(
        engine: &Arc<Engine>,
        _config: &AppConfig,
        _command_tx: mpsc::UnboundedSender<TrayCommand>,
    ) -> Result<TrayHandle> {
        engine.subscribe(|snapshot| {
            debug!(
                apps = snapshot.apps.len(),
                favorite_groups = snapshot.favorites.groups.len(),
                full = snapshot.modes.is_full(),
                "State changed"
            );
        });
        info!("No system tray on this platform, running headless");
        Ok(TrayHandle)
    }
}
