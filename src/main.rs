use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

use wlan_keeper::{
    config::{self, Config, WatchSettings},
    connection, interface,
    logging::{self, LogLevel},
    scan, Monitor, Netsh,
};

#[derive(Parser)]
#[command(name = "wlan-keeper")]
#[command(about = "Keep a wireless interface connected to one network")]
#[command(version)]
struct Cli {
    /// Config file to use (defaults to <config dir>/wlan-keeper/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the interface and reconnect whenever the network drops
    Watch {
        /// SSID of the network to stay connected to
        #[arg(short, long)]
        ssid: Option<String>,

        /// Interface to watch (defaults to the first wireless interface)
        #[arg(short, long)]
        interface: Option<String>,

        /// Time between checks, e.g. 15s, 1m, 1m30s
        #[arg(short = 'n', long, value_parser = config::parse_duration)]
        interval: Option<Duration>,

        /// Stop after this many checks (runs until interrupted by default)
        #[arg(long)]
        max_checks: Option<usize>,
    },

    /// Show interface status
    Status {
        /// Interface to show (defaults to all interfaces)
        #[arg(short, long)]
        interface: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List wireless interfaces
    ListInterfaces,

    /// List networks visible to an interface
    Scan {
        /// Interface to use (defaults to the first wireless interface)
        #[arg(short, long)]
        interface: Option<String>,
    },

    /// Send a single connect command using the saved profile
    Connect {
        /// SSID of the network to connect to
        ssid: String,

        /// Interface to use (defaults to the first wireless interface)
        #[arg(short, long)]
        interface: Option<String>,
    },

    /// Save watch defaults to the config file
    SaveConfig {
        /// SSID of the network to stay connected to
        #[arg(short, long)]
        ssid: Option<String>,

        /// Interface to watch
        #[arg(short, long)]
        interface: Option<String>,

        /// Time between checks, e.g. 15s, 1m
        #[arg(short = 'n', long, value_parser = config::parse_duration)]
        interval: Option<Duration>,
    },

    /// Show saved configuration
    ShowConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = config_file(cli.config.as_deref()).and_then(|path| Config::load_from(&path));

    // Logging settings may come from the config file, so set up logging with
    // whatever loaded before reporting a config error.
    let file_config = loaded.as_ref().cloned().unwrap_or_default();
    let level = cli.log_level.or(file_config.log_level).unwrap_or_default();
    let log_file = cli.log_file.clone().or(file_config.log_file);
    logging::init(level, log_file.as_deref());

    let result = match loaded {
        Ok(cfg) => run(cli, cfg).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, cfg: Config) -> Result<()> {
    match cli.command {
        Commands::Watch {
            ssid,
            interface,
            interval,
            max_checks,
        } => cmd_watch(&cfg, ssid, interface, interval, max_checks).await,
        Commands::Status { interface, json } => {
            cmd_status(interface.or(cfg.interface).as_deref(), json).await
        }
        Commands::ListInterfaces => cmd_list_interfaces().await,
        Commands::Scan { interface } => cmd_scan(interface.or(cfg.interface).as_deref()).await,
        Commands::Connect { ssid, interface } => {
            cmd_connect(&ssid, interface.or(cfg.interface).as_deref()).await
        }
        Commands::SaveConfig {
            ssid,
            interface,
            interval,
        } => cmd_save_config(
            cfg,
            cli.config.as_deref(),
            ssid,
            interface,
            interval,
            cli.log_file,
            cli.log_level,
        ),
        Commands::ShowConfig => cmd_show_config(&cfg, cli.config.as_deref()),
    }
}

fn config_file(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(p) => Ok(p.to_path_buf()),
        None => config::config_path(),
    }
}

async fn cmd_watch(
    cfg: &Config,
    ssid: Option<String>,
    interface: Option<String>,
    interval: Option<Duration>,
    max_checks: Option<usize>,
) -> Result<()> {
    let settings = WatchSettings::resolve(ssid, interface, interval, cfg)?;

    info!(
        ssid = %settings.ssid,
        interface = ?settings.interface,
        interval = %config::format_duration(settings.interval),
        "Starting wlan-keeper"
    );

    let runner = Netsh::new();
    if settings.interface.is_none() {
        info!("No interface given, detecting");
    }
    let iface = interface::resolve_interface(&runner, settings.interface.as_deref())
        .await
        .context("Could not detect a wireless interface, pass --interface")?;
    info!(interface = %iface, "Using interface");

    let monitor = Monitor::new(runner, settings.ssid, iface);
    match max_checks {
        Some(n) => {
            monitor.run_ticks(settings.interval, n).await;
            Ok(())
        }
        None => monitor.run(settings.interval).await,
    }
}

async fn cmd_status(interface: Option<&str>, json: bool) -> Result<()> {
    let runner = Netsh::new();
    let mut interfaces = interface::list_interfaces(&runner).await?;

    if let Some(name) = interface {
        interfaces.retain(|i| i.name == name);
        if interfaces.is_empty() {
            anyhow::bail!("Interface '{}' not found", name);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&interfaces)?);
        return Ok(());
    }

    if interfaces.is_empty() {
        println!("No wireless interfaces found.");
        return Ok(());
    }

    for (i, status) in interfaces.iter().enumerate() {
        if i > 0 {
            println!();
        }
        connection::display_status(status);
    }

    Ok(())
}

async fn cmd_list_interfaces() -> Result<()> {
    let runner = Netsh::new();
    let interfaces = interface::list_interfaces(&runner).await?;

    if interfaces.is_empty() {
        println!("No wireless interfaces found.");
        return Ok(());
    }

    println!("{:<24} {:<16} {}", "INTERFACE", "STATE", "SSID");
    println!("{}", "-".repeat(60));

    for iface in interfaces {
        println!(
            "{:<24} {:<16} {}",
            iface.name,
            iface.state.as_deref().unwrap_or("-"),
            iface.ssid.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

async fn cmd_scan(interface: Option<&str>) -> Result<()> {
    let runner = Netsh::new();
    let iface = interface::resolve_interface(&runner, interface).await?;
    println!("Scanning on interface: {}", iface);
    println!();

    let networks = scan::scan_networks(&runner, &iface)
        .await
        .context("Failed to scan for networks")?;
    scan::display_networks(&networks);

    Ok(())
}

async fn cmd_connect(ssid: &str, interface: Option<&str>) -> Result<()> {
    let runner = Netsh::new();
    let iface = interface::resolve_interface(&runner, interface).await?;
    println!("Connecting to '{}' on interface {}...", ssid, iface);

    connection::connect(&runner, ssid, &iface)
        .await
        .with_context(|| format!("Failed to connect to '{}'", ssid))?;
    println!("Connect command accepted. Run 'wlan-keeper status' to confirm.");

    Ok(())
}

fn cmd_save_config(
    mut cfg: Config,
    path: Option<&Path>,
    ssid: Option<String>,
    interface: Option<String>,
    interval: Option<Duration>,
    log_file: Option<PathBuf>,
    log_level: Option<LogLevel>,
) -> Result<()> {
    if ssid.is_some() {
        cfg.ssid = ssid;
    }
    if interface.is_some() {
        cfg.interface = interface;
    }
    if let Some(interval) = interval {
        cfg.interval = Some(config::format_duration(interval));
    }
    if log_file.is_some() {
        cfg.log_file = log_file;
    }
    if log_level.is_some() {
        cfg.log_level = log_level;
    }

    let path = config_file(path)?;
    cfg.save_to(&path)?;
    println!("Saved configuration to {}", path.display());

    Ok(())
}

fn cmd_show_config(cfg: &Config, path: Option<&Path>) -> Result<()> {
    let path = config_file(path)?;
    println!("Config file: {}", path.display());
    println!();

    let or_dash = |v: Option<&str>| v.unwrap_or("-").to_string();
    let interval = match cfg.interval()? {
        Some(d) => config::format_duration(d),
        None => format!("{} (default)", config::format_duration(config::DEFAULT_INTERVAL)),
    };
    let log_level = cfg
        .log_level
        .map(|l| format!("{:?}", l).to_lowercase())
        .unwrap_or_else(|| "info (default)".to_string());

    println!("{:<12} {}", "SSID", or_dash(cfg.ssid.as_deref()));
    println!("{:<12} {}", "INTERFACE", cfg.interface.as_deref().unwrap_or("auto"));
    println!("{:<12} {}", "INTERVAL", interval);
    println!(
        "{:<12} {}",
        "LOG FILE",
        cfg.log_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stderr".to_string())
    );
    println!("{:<12} {}", "LOG LEVEL", log_level);

    Ok(())
}
