//! Network visibility scanning.
//!
//! Uses `netsh wlan show networks interface=<name> mode=bssid`, whose entries
//! look like:
//!
//! ```text
//! SSID 1 : home_5G
//!     Network type            : Infrastructure
//!     Authentication          : WPA2-Personal
//!     BSSID 1                 : 3c:84:6a:12:34:56
//!          Signal             : 92%
//! ```
//!
//! When nothing is in range `netsh` exits non-zero with a "no wireless
//! networks are currently visible" message. That is an expected condition and
//! is reported as an empty scan, not an error.

use tracing::{debug, info};

use crate::error::WlanError;
use crate::labels;
use crate::runner::{CommandRunner, DEFAULT_TIMEOUT};

/// Extract visible SSIDs from `wlan show networks` output.
///
/// Order follows the output. Hidden networks (empty SSID) and duplicates are
/// skipped.
pub fn parse_networks(text: &str) -> Vec<String> {
    let mut networks: Vec<String> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if !trimmed.starts_with(labels::SCAN_SSID_ENTRY) {
            continue;
        }

        let Some((_, ssid)) = labels::split_field(trimmed) else {
            continue;
        };

        if ssid.is_empty() || networks.iter().any(|n| n == ssid) {
            continue;
        }
        networks.push(ssid.to_string());
    }

    networks
}

/// Scan for networks visible to `interface`.
pub async fn scan_networks<R: CommandRunner>(
    runner: &R,
    interface: &str,
) -> Result<Vec<String>, WlanError> {
    let interface_arg = format!("interface={interface}");
    let result = runner
        .run(
            &["wlan", "show", "networks", &interface_arg, "mode=bssid"],
            DEFAULT_TIMEOUT,
        )
        .await;

    match result {
        Ok(output) => Ok(parse_networks(&output.stdout)),
        Err(WlanError::CommandFailed {
            ref stdout,
            ref stderr,
            ..
        }) if labels::says_no_networks_visible(stderr)
            || labels::says_no_networks_visible(stdout) =>
        {
            info!(interface, "No wireless networks visible on interface");
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

/// Check whether `target_ssid` is currently in range of `interface`.
pub async fn is_network_visible<R: CommandRunner>(
    runner: &R,
    target_ssid: &str,
    interface: &str,
) -> Result<bool, WlanError> {
    debug!(ssid = target_ssid, interface, "Checking network visibility");
    let networks = scan_networks(runner, interface).await?;

    for ssid in &networks {
        debug!(visible = %ssid, "Scanned network");
        if ssid == target_ssid {
            info!(ssid = target_ssid, interface, "Target network is visible");
            return Ok(true);
        }
    }

    info!(ssid = target_ssid, interface, "Target network not visible");
    Ok(false)
}

/// Print scanned SSIDs one per line.
pub fn display_networks(networks: &[String]) {
    if networks.is_empty() {
        println!("No networks found.");
        return;
    }

    println!("SSID");
    println!("{}", "-".repeat(32));
    for ssid in networks {
        println!("{}", ssid);
    }
}
