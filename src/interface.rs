use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::connection::{self, InterfaceStatus};
use crate::error::WlanError;
use crate::labels;
use crate::runner::CommandRunner;

/// Return the first non-empty interface name in `wlan show interfaces` output.
pub fn first_interface_name(text: &str) -> Option<String> {
    text.lines()
        .filter_map(labels::split_field)
        .filter(|(label, _)| labels::has_label(label, labels::NAME))
        .map(|(_, value)| value)
        .find(|value| !value.is_empty())
        .map(String::from)
}

/// Auto-detect the first wireless interface on the system.
///
/// This does not check that the adapter is enabled; later commands fail on
/// their own if it is not usable.
pub async fn detect_interface<R: CommandRunner>(runner: &R) -> Result<String> {
    debug!("Detecting wireless interface");
    let stdout = connection::show_interfaces(runner)
        .await
        .context("Failed to list wireless interfaces")?;

    let name = first_interface_name(&stdout).ok_or(WlanError::NoInterfaceFound)?;
    info!(interface = %name, "Detected wireless interface");
    Ok(name)
}

/// List every wireless interface with its current status.
pub async fn list_interfaces<R: CommandRunner>(runner: &R) -> Result<Vec<InterfaceStatus>> {
    let stdout = connection::show_interfaces(runner)
        .await
        .context("Failed to list wireless interfaces")?;
    Ok(connection::parse_interfaces(&stdout))
}

/// Resolve interface: use provided name or auto-detect the first adapter
pub async fn resolve_interface<R: CommandRunner>(
    runner: &R,
    interface: Option<&str>,
) -> Result<String> {
    match interface.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => Ok(name.to_string()),
        None => detect_interface(runner).await,
    }
}
