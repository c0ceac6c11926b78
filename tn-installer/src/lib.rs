use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tn_connect::{
    server, ConnectCache, ConnectManager, HttpFinalizer, JsonFileCache, MemoryCache,
    SystemIdentity, TokioSpawner,
};
use tn_core::cli::{Cli, Command};
use tn_core::disk::{format_size_binary, Disk};
use tn_core::settings::InstallerSettings;
use tn_hal::{
    CommandInstaller, DiskInventory, DryRunHal, HostInfo, InstallProcedure, LinuxHal,
    SystemActions,
};
use tn_tui::ConsoleDialog;
use tn_workflow::{ConsoleSettings, MainMenu, MenuExit};

/// Exit status that hands the console over to the login shell wrapper.
pub const SHELL_EXIT_CODE: u8 = 1;

const DRY_RUN_STEP_DELAY: Duration = Duration::from_millis(400);

pub fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    tn_core::logging::init_with(cli.log_file.clone());
    let settings = load_settings(&cli)?;
    log::info!(
        "{} {} installer starting (dry_run={})",
        settings.vendor,
        settings.version,
        cli.dry_run
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(dispatch(cli, settings))
}

/// Settings file plus command line overrides.
pub fn load_settings(cli: &Cli) -> anyhow::Result<InstallerSettings> {
    let mut settings = InstallerSettings::load(&cli.config)?;
    if let Some(listen) = cli.listen {
        settings.listen = listen;
    }
    Ok(settings)
}

async fn dispatch(cli: Cli, settings: InstallerSettings) -> anyhow::Result<ExitCode> {
    let hal = LinuxHal::new();
    match cli.command.clone().unwrap_or(Command::Menu) {
        Command::Disks => {
            let disks = hal.list_disks().await.context("Disk inventory failed")?;
            print!("{}", disk_report(&disks));
            Ok(ExitCode::SUCCESS)
        }
        Command::Serve => {
            let manager = connect_manager(&settings, &hal)?;
            let listener = server::bind(settings.listen).await?;
            server::serve(listener, manager).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Menu => {
            let api = match start_api(&settings, &hal).await {
                Ok(handle) => Some(handle),
                Err(err) => {
                    log::error!("Provisioning API unavailable: {:#}", err);
                    None
                }
            };

            let console = ConsoleSettings::from(&settings);
            let exit = if cli.dry_run {
                let dry = DryRunHal::new(DRY_RUN_STEP_DELAY);
                run_menu(&hal, &dry, &dry, console).await?
            } else {
                let installer = CommandInstaller::new(settings.install_command.clone());
                run_menu(&hal, &installer, &hal, console).await?
            };

            if let Some(api) = api {
                api.abort();
            }
            Ok(match exit {
                MenuExit::Shell => ExitCode::from(SHELL_EXIT_CODE),
                MenuExit::PowerAction => ExitCode::SUCCESS,
            })
        }
    }
}

async fn run_menu<I, P>(
    hal: &LinuxHal,
    installer: &I,
    power: &P,
    settings: ConsoleSettings,
) -> anyhow::Result<MenuExit>
where
    I: InstallProcedure,
    P: SystemActions,
{
    let dialog = ConsoleDialog::new();
    MainMenu::new(&dialog, hal, installer, power, settings)
        .run()
        .await
}

async fn start_api(
    settings: &InstallerSettings,
    hal: &LinuxHal,
) -> anyhow::Result<tokio::task::JoinHandle<anyhow::Result<()>>> {
    let manager = connect_manager(settings, hal)?;
    let listener = server::bind(settings.listen).await?;
    Ok(tokio::spawn(server::serve(listener, manager)))
}

/// Wire the enrollment manager to the host and the configured cache file.
pub fn connect_manager(
    settings: &InstallerSettings,
    hal: &LinuxHal,
) -> anyhow::Result<Arc<ConnectManager>> {
    let cache: Arc<dyn ConnectCache> =
        match JsonFileCache::create(&settings.connect_cache_path, settings.connect.clone()) {
            Ok(cache) => Arc::new(cache),
            Err(err) => {
                log::warn!("{}; keeping enrollment state in memory", err);
                Arc::new(MemoryCache::new(settings.connect.clone()))
            }
        };
    let finalizer = Arc::new(HttpFinalizer::new(cache.clone())?);
    let identity = SystemIdentity {
        version: settings.version.clone(),
        model: hal.product_model(),
    };
    Ok(Arc::new(ConnectManager::new(
        cache,
        Arc::new(hal.clone()),
        finalizer,
        Arc::new(TokioSpawner),
        identity,
    )))
}

/// One line per disk: name, model, label, size and the pools found on it.
pub fn disk_report(disks: &[Disk]) -> String {
    if disks.is_empty() {
        return "No drives available\n".to_string();
    }
    let mut out = String::new();
    for disk in disks {
        let pools: Vec<&str> = disk.zfs_members.iter().map(|m| m.pool.as_str()).collect();
        out.push_str(&format!(
            "{:<10} {:<24} {:<20} {:>10}  {}\n",
            disk.name,
            disk.model,
            disk.label,
            format_size_binary(disk.size),
            if pools.is_empty() {
                "-".to_string()
            } else {
                pools.join(",")
            }
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;
    use tn_core::disk::BOOT_POOL;

    #[test]
    fn listen_flag_overrides_settings_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("installer.toml");
        std::fs::write(&path, "vendor = \"HexOS\"\nlisten = \"127.0.0.1:7000\"\n").unwrap();

        let cli = Cli::parse_from([
            "tn-installer",
            "--config",
            path.to_str().unwrap(),
            "--listen",
            "127.0.0.1:7100",
            "serve",
        ]);
        let settings = load_settings(&cli).unwrap();
        assert_eq!(settings.vendor, "HexOS");
        assert_eq!(
            settings.listen,
            "127.0.0.1:7100".parse::<std::net::SocketAddr>().unwrap()
        );
    }

    #[test]
    fn invalid_settings_are_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("installer.toml");
        std::fs::write(&path, "listen = 5\n").unwrap();
        let cli = Cli::parse_from(["tn-installer", "--config", path.to_str().unwrap()]);
        let err = load_settings(&cli).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid settings"));
    }

    #[test]
    fn report_lists_pools() {
        let disks = vec![
            Disk::new("sda", "DiskA", 1 << 30).with_pool(BOOT_POOL),
            Disk::new("sdb", "DiskB", 2 << 30),
        ];
        let report = disk_report(&disks);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("sda"));
        assert!(lines[0].ends_with("boot-pool"));
        assert!(lines[1].ends_with('-'));
        assert_eq!(disk_report(&[]), "No drives available\n");
    }

    #[tokio::test]
    async fn manager_uses_settings_cache_path() {
        let dir = tempdir().unwrap();
        let settings = InstallerSettings {
            connect_cache_path: dir.path().join("connect.json"),
            ..InstallerSettings::default()
        };
        let hal = LinuxHal::with_root(PathBuf::from(dir.path()));
        let manager = connect_manager(&settings, &hal).unwrap();
        let config = manager.config().unwrap();
        assert!(!config.enabled);
        assert_eq!(config.tnc_base_url, settings.connect.tnc_base_url);
        assert!(settings.connect_cache_path.exists());
    }
}
