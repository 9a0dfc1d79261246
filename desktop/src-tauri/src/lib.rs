mod commands;
mod logging;
mod updater;
mod window;

use logging::{current_log_path, setup_logging};
use updater::{DialogPrompt, TauriUpdateChannel};
use window::TauriShellWindow;

#[cfg(test)]
mod tests;

use std::path::Path;
use std::sync::Arc;

use md_config::{Config, ConfigError};
use md_shell::{
    BackendLauncher, ContentLoader, DiagnosticLog, HostInfo, LaunchPaths, LifecycleContext,
    LoadSettings, OsProcessHost, ProcessSupervisor, ReadinessProbe, SupervisorPolicy,
    UpdateCoordinator, UpdateSettings, install_panic_hook, spawn_readiness_watch,
};
use tauri::webview::PageLoadEvent;
use tauri::{Manager, RunEvent};
use tracing::{error, info, warn};

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app, _argv, _cwd| {
            // Focus existing window on second instance attempt
            window::focus_main_window(app);
        }))
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_updater::Builder::new().build())
        .setup(|app| {
            let app_data_dir = app.path().app_data_dir()?;
            std::fs::create_dir_all(&app_data_dir)?;

            let (config, config_error) = load_config(&app_data_dir);

            let logs_dir = app_data_dir.join(&config.logging.directory);
            setup_logging(&logs_dir, config.logging.level)?;

            info!("Starting MeaDocs v{}", app.package_info().version);
            info!("Log file: {}", current_log_path(&logs_dir).display());
            if let Some(e) = config_error {
                warn!("Invalid configuration, using defaults: {e}");
            }
            config.log_summary();

            let diagnostics = DiagnosticLog::open(logs_dir.join(&config.logging.diagnostic_file));
            install_panic_hook(diagnostics.clone());

            let mode = config.run_mode();
            let project_dir = match &config.launcher.project_dir {
                Some(dir) => dir.clone(),
                None => std::env::current_dir()?,
            };
            let launcher = BackendLauncher::new(
                mode,
                LaunchPaths {
                    project_dir,
                    resources_dir: app.path().resource_dir()?,
                },
                config.launcher.clone(),
            );

            let lifecycle = LifecycleContext::new();
            let supervisor = ProcessSupervisor::new(
                Arc::new(OsProcessHost),
                Arc::new(launcher),
                lifecycle.clone(),
                diagnostics.clone(),
                SupervisorPolicy::from(&config.supervisor),
            );
            app.manage(supervisor.clone());

            #[cfg(unix)]
            spawn_signal_listener(app.handle().clone(), supervisor.clone());

            let probe = ReadinessProbe::from_config(&config.backend, &config.readiness)?;
            let loader = ContentLoader::new(
                Arc::new(TauriShellWindow::new(app.handle().clone())),
                probe.url().clone(),
                LoadSettings::from(&config.readiness),
                lifecycle.clone(),
            );
            app.manage(loader.clone());

            let host_info = HostInfo::current(app.package_info().version.to_string());
            window::create_main_window(app.handle(), &host_info, &loader.confirmation_script())?;

            // Window creation and backend spawn are independent
            let starter = supervisor.clone();
            tauri::async_runtime::spawn(async move {
                if let Err(e) = starter.start().await {
                    error!("Failed to start backend: {e}");
                    error!("{}", e.recovery_hint());
                }
            });

            let states = supervisor.subscribe();
            let watch_lifecycle = lifecycle.clone();
            tauri::async_runtime::spawn(async move {
                let watch = spawn_readiness_watch(states, probe, watch_lifecycle, move |event| {
                    info!("Backend generation {} ready, loading UI", event.generation);
                    loader.load();
                });
                watch.await.ok();
            });

            let coordinator = UpdateCoordinator::new(
                TauriUpdateChannel::new(app.handle().clone()),
                DialogPrompt::new(app.handle().clone()),
                mode,
                UpdateSettings::from(&config.updates),
                diagnostics,
            );
            tauri::async_runtime::spawn(async move {
                let outcome = coordinator.run().await;
                info!("Update check finished: {outcome:?}");
            });

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![commands::backend_page_loaded])
        .on_page_load(|webview, payload| {
            if webview.label() != window::MAIN_WINDOW_LABEL {
                return;
            }
            let Some(loader) = webview.app_handle().try_state::<ContentLoader>() else {
                return;
            };

            match payload.event() {
                PageLoadEvent::Started => {
                    if window::is_backend_page(loader.url(), payload.url()) {
                        loader.page_started();
                    }
                }
                // Error pages finish on their own URL, so every finish is checked
                PageLoadEvent::Finished => {
                    let loader = loader.inner().clone();
                    tauri::async_runtime::spawn(async move {
                        loader.page_finished();
                    });
                }
            }
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app_handle, event| {
            if let RunEvent::ExitRequested { code, .. } = event {
                info!("Exit requested (code: {:?})", code);

                if let Some(supervisor) = app_handle.try_state::<ProcessSupervisor>() {
                    let supervisor = supervisor.inner().clone();
                    match tauri::async_runtime::block_on(supervisor.shutdown()) {
                        Ok(outcome) => info!("Backend shutdown: {outcome:?}"),
                        Err(e) => error!("Failed to stop backend: {e}"),
                    }
                }
            }
        });
}

/// Load and validate configuration, falling back to defaults when invalid.
///
/// The error is returned alongside so it can be logged once logging is up.
pub(crate) fn load_config(app_data_dir: &Path) -> (Config, Option<ConfigError>) {
    let config_dir = Config::config_dir_or(app_data_dir);

    match Config::load_from(&config_dir).and_then(|config| config.validate().map(|()| config)) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    }
}

/// Turn SIGINT/SIGTERM into an orderly shutdown.
#[cfg(unix)]
fn spawn_signal_listener(app_handle: tauri::AppHandle, supervisor: ProcessSupervisor) {
    std::thread::spawn(move || {
        use signal_hook::consts::{SIGINT, SIGTERM};
        use signal_hook::iterator::Signals;

        let mut signals = match Signals::new([SIGINT, SIGTERM]) {
            Ok(s) => s,
            Err(e) => {
                error!("Failed to register signal handlers: {e}");
                return;
            }
        };

        if let Some(sig) = signals.forever().next() {
            info!("Received signal {sig}, shutting down...");

            match tauri::async_runtime::block_on(supervisor.shutdown()) {
                Ok(outcome) => info!("Backend shutdown on signal {sig}: {outcome:?}"),
                Err(e) => error!("Failed to stop backend on signal: {e}"),
            }

            app_handle.exit(0);
        }
    });
}
