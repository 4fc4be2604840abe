//! Interface status and reconnection.
//!
//! Status comes from `netsh wlan show interfaces`, which prints one block per
//! wireless adapter:
//!
//! ```text
//!     名称                   : WLAN
//!     描述                   : Intel(R) Wi-Fi 6 AX201 160MHz
//!     状态                   : 已连接
//!     SSID                   : home_5G
//!     AP BSSID               : 3c:84:6a:12:34:56
//!     信号                   : 92%
//! ```
//!
//! The text is parsed into [`InterfaceStatus`] snapshots. Parsing never fails:
//! anything missing simply reads as "not connected", which the poll loop
//! treats as retryable. Only the command itself can produce an error.
//!
//! Reconnection runs `netsh wlan connect`. A zero exit status means the
//! request was accepted, not that the interface is associated; the next poll
//! confirms the outcome.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::error::WlanError;
use crate::labels;
use crate::runner::{CommandRunner, CONNECT_TIMEOUT, DEFAULT_TIMEOUT};

/// One interface block from `wlan show interfaces`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InterfaceStatus {
    /// Adapter name as the OS reports it (e.g. "WLAN", "Wi-Fi").
    pub name: String,

    /// Raw localized state (e.g. "connected", "已连接", "disconnected").
    pub state: Option<String>,

    /// Network the interface is associated with, if any.
    pub ssid: Option<String>,

    /// Access point identifier of the association.
    pub bssid: Option<String>,

    /// Signal quality as printed (e.g. "92%").
    pub signal: Option<String>,
}

/// How an interface relates to the target network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Association {
    /// Associated with the target and in the connected state.
    ConnectedToTarget,
    /// The target SSID is reported but the state is something else,
    /// e.g. "authenticating".
    PresentNotConnected,
    /// Not associated with the target at all.
    NotConnected,
}

impl InterfaceStatus {
    pub fn is_connected(&self) -> bool {
        self.state.as_deref().is_some_and(labels::is_connected_state)
    }

    pub fn association(&self, target_ssid: &str) -> Association {
        match self.ssid.as_deref() {
            Some(ssid) if ssid == target_ssid => {
                if self.is_connected() {
                    Association::ConnectedToTarget
                } else {
                    Association::PresentNotConnected
                }
            }
            _ => Association::NotConnected,
        }
    }
}

/// Parse `wlan show interfaces` output into one snapshot per interface block.
///
/// Lines before the first name label (the "There is 1 interface" banner) and
/// lines without a recognized label are ignored. The first value seen for a
/// field within a block wins.
pub fn parse_interfaces(text: &str) -> Vec<InterfaceStatus> {
    let mut interfaces: Vec<InterfaceStatus> = Vec::new();

    for line in text.lines() {
        let Some((label, value)) = labels::split_field(line) else {
            continue;
        };

        if labels::has_label(label, labels::NAME) {
            interfaces.push(InterfaceStatus {
                name: value.to_string(),
                ..Default::default()
            });
            continue;
        }

        let Some(current) = interfaces.last_mut() else {
            continue;
        };

        if label.contains(labels::BSSID) {
            set_once(&mut current.bssid, value);
        } else if label.starts_with(labels::SSID) {
            set_once(&mut current.ssid, value);
        } else if labels::has_label(label, labels::STATE) {
            set_once(&mut current.state, value);
        } else if labels::has_label(label, labels::SIGNAL) {
            set_once(&mut current.signal, value);
        }
    }

    interfaces
}

fn set_once(field: &mut Option<String>, value: &str) {
    if field.is_none() && !value.is_empty() {
        *field = Some(value.to_string());
    }
}

/// Find the snapshot for `interface` in `wlan show interfaces` output.
pub fn find_interface(text: &str, interface: &str) -> Option<InterfaceStatus> {
    parse_interfaces(text)
        .into_iter()
        .find(|status| status.name == interface)
}

/// Decide from raw output whether `interface` is connected to `target_ssid`.
///
/// A missing block, or a block without SSID or state, is "not connected".
pub fn is_connected_to(text: &str, target_ssid: &str, interface: &str) -> bool {
    let Some(status) = find_interface(text, interface) else {
        debug!(interface, "Interface not present in status output");
        return false;
    };

    match status.association(target_ssid) {
        Association::ConnectedToTarget => {
            debug!(ssid = target_ssid, state = ?status.state, "Target network connected");
            true
        }
        Association::PresentNotConnected => {
            debug!(
                ssid = target_ssid,
                state = ?status.state,
                "Target network present but not in the connected state"
            );
            false
        }
        Association::NotConnected => {
            debug!(
                target = target_ssid,
                current = ?status.ssid,
                state = ?status.state,
                "Not associated with target network"
            );
            false
        }
    }
}

/// Run `netsh wlan show interfaces` and return its raw output.
pub async fn show_interfaces<R: CommandRunner>(runner: &R) -> Result<String, WlanError> {
    let output = runner
        .run(&["wlan", "show", "interfaces"], DEFAULT_TIMEOUT)
        .await?;
    Ok(output.stdout)
}

/// Query the current status of `interface`.
///
/// Returns `Ok(None)` when the interface does not appear in the output.
pub async fn status<R: CommandRunner>(
    runner: &R,
    interface: &str,
) -> Result<Option<InterfaceStatus>> {
    let stdout = show_interfaces(runner)
        .await
        .context("Failed to query interface status")?;
    Ok(find_interface(&stdout, interface))
}

/// Check whether `interface` is connected to `target_ssid`.
///
/// Only a failing or timed-out command is an error.
pub async fn is_connected<R: CommandRunner>(
    runner: &R,
    target_ssid: &str,
    interface: &str,
) -> Result<bool, WlanError> {
    debug!(ssid = target_ssid, interface, "Checking connection status");
    let stdout = show_interfaces(runner).await?;
    Ok(is_connected_to(&stdout, target_ssid, interface))
}

/// Ask `netsh` to connect `interface` to `ssid` using its saved profile.
///
/// Success means the request was accepted; the association completes
/// asynchronously.
pub async fn connect<R: CommandRunner>(
    runner: &R,
    ssid: &str,
    interface: &str,
) -> Result<(), WlanError> {
    info!(ssid, interface, "Sending connect command");

    let name_arg = format!("name={ssid}");
    let interface_arg = format!("interface={interface}");
    let result = runner
        .run(
            &["wlan", "connect", &name_arg, &interface_arg],
            CONNECT_TIMEOUT,
        )
        .await;

    match result {
        Ok(_) => {
            info!(ssid, "Connect command accepted");
            Ok(())
        }
        Err(e) => {
            error!(ssid, interface, error = %e, "Connect command failed");
            Err(e)
        }
    }
}

/// Print an interface snapshot in a human-readable layout.
///
/// ```text
/// Interface: WLAN
/// State:     已连接
/// SSID:      home_5G
/// BSSID:     3c:84:6a:12:34:56
/// Signal:    92%
/// ```
pub fn display_status(status: &InterfaceStatus) {
    println!("Interface: {}", status.name);
    println!("State:     {}", status.state.as_deref().unwrap_or("unknown"));
    println!("SSID:      {}", status.ssid.as_deref().unwrap_or("(none)"));

    if let Some(ref bssid) = status.bssid {
        println!("BSSID:     {}", bssid);
    }

    if let Some(ref signal) = status.signal {
        println!("Signal:    {}", signal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::CommandOutput;
    use crate::runner::testing::{MockResponder, Reply, expect};

    const ZH_CONNECTED: &str = "
系统上有 1 个接口:

    名称                   : WLAN
    描述                   : Intel(R) Wi-Fi 6 AX201 160MHz
    GUID                   : 0b8a2d37-6d7c-4d4b-9d0d-1e7f0c0f9d11
    物理地址               : a4:c3:f0:11:22:33
    界面类型               : 主要
    状态                   : 已连接
    SSID                   : home_5G
    AP BSSID               : 3c:84:6a:12:34:56
    频带                   : 5 GHz
    通道                   : 149
    网络类型               : 结构
    无线电类型             : 802.11ac
    身份验证               : WPA2 - 个人
    密码                   : CCMP
    连接模式               : 自动连接
    接收速率(Mbps)         : 866.7
    传输速率 (Mbps)        : 866.7
    信号                   : 92%
    配置文件               : home_5G

    承载网络状态  : 不可用
";

    const EN_TWO_INTERFACES: &str = "
There are 2 interfaces on the system:

    Name                   : Wi-Fi
    Description            : Intel(R) Wireless-AC 9560
    GUID                   : 5e3c2f1a-0000-4c1b-8a9e-7d3f2b1c0a99
    Physical address       : 10:02:b5:aa:bb:cc
    State                  : disconnected
    Radio status           : Hardware On
                             Software On

    Name                   : Wi-Fi 2
    Description            : TP-Link Wireless USB Adapter
    GUID                   : 9f1d2c3b-1111-4a5b-9c8d-0e1f2a3b4c5d
    Physical address       : 50:3e:aa:dd:ee:ff
    State                  : connected
    SSID                   : office
    BSSID                  : 00:11:22:33:44:55
    Network type           : Infrastructure
    Signal                 : 71%
    Profile                : office

    Hosted network status  : Not available
";

    #[test]
    fn connected_to_target_in_chinese_output() {
        assert!(is_connected_to(ZH_CONNECTED, "home_5G", "WLAN"));
    }

    #[test]
    fn other_ssid_is_not_connected() {
        let text = ZH_CONNECTED.replace("home_5G", "neighbor_ap");
        assert!(!is_connected_to(&text, "home_5G", "WLAN"));
    }

    #[test]
    fn bssid_line_is_never_an_ssid_source() {
        // The SSID line is gone; only the BSSID line carries an "SSID" substring.
        let text: String = ZH_CONNECTED
            .lines()
            .filter(|l| !l.trim_start().starts_with("SSID"))
            .map(|l| format!("{l}\n"))
            .collect();

        let status = find_interface(&text, "WLAN").unwrap();
        assert_eq!(status.ssid, None);
        assert_eq!(status.bssid.as_deref(), Some("3c:84:6a:12:34:56"));
        assert!(!is_connected_to(&text, "3c:84:6a:12:34:56", "WLAN"));
    }

    #[test]
    fn bssid_before_ssid_does_not_shadow_it() {
        let text = "
    Name                   : Wi-Fi
    State                  : connected
    BSSID                  : 00:11:22:33:44:55
    SSID                   : office
";
        let status = find_interface(text, "Wi-Fi").unwrap();
        assert_eq!(status.ssid.as_deref(), Some("office"));
        assert!(is_connected_to(text, "office", "Wi-Fi"));
    }

    #[test]
    fn only_the_requested_block_is_inspected() {
        assert!(is_connected_to(EN_TWO_INTERFACES, "office", "Wi-Fi 2"));
        assert!(!is_connected_to(EN_TWO_INTERFACES, "office", "Wi-Fi"));
    }

    #[test]
    fn missing_interface_is_not_connected() {
        assert!(!is_connected_to(ZH_CONNECTED, "home_5G", "Wi-Fi"));
        assert!(!is_connected_to("", "home_5G", "WLAN"));
        assert!(!is_connected_to("garbage without labels", "home_5G", "WLAN"));
    }

    #[test]
    fn transitional_state_is_present_not_connected() {
        let text = ZH_CONNECTED.replace("已连接", "正在验证");
        let status = find_interface(&text, "WLAN").unwrap();
        assert_eq!(status.association("home_5G"), Association::PresentNotConnected);
        assert!(!is_connected_to(&text, "home_5G", "WLAN"));
    }

    #[test]
    fn parses_every_block() {
        let interfaces = parse_interfaces(EN_TWO_INTERFACES);
        assert_eq!(interfaces.len(), 2);

        assert_eq!(interfaces[0].name, "Wi-Fi");
        assert_eq!(interfaces[0].state.as_deref(), Some("disconnected"));
        assert_eq!(interfaces[0].ssid, None);
        assert_eq!(interfaces[0].association("office"), Association::NotConnected);

        assert_eq!(interfaces[1].name, "Wi-Fi 2");
        assert_eq!(interfaces[1].ssid.as_deref(), Some("office"));
        assert_eq!(interfaces[1].bssid.as_deref(), Some("00:11:22:33:44:55"));
        assert_eq!(interfaces[1].signal.as_deref(), Some("71%"));
    }

    #[test]
    fn hosted_network_status_is_not_a_state() {
        let status = find_interface(EN_TWO_INTERFACES, "Wi-Fi").unwrap();
        assert_eq!(status.state.as_deref(), Some("disconnected"));
    }

    #[tokio::test]
    async fn is_connected_reports_scenario_result() {
        let mut runner = MockResponder::new();
        expect(&mut runner, "wlan show interfaces", Reply::Ok(ZH_CONNECTED.into()), 2);
        assert!(is_connected(&runner, "home_5G", "WLAN").await.unwrap());
        assert!(!is_connected(&runner, "other", "WLAN").await.unwrap());
    }

    #[tokio::test]
    async fn is_connected_propagates_command_failure() {
        let mut runner = MockResponder::new();
        expect(
            &mut runner,
            "wlan show interfaces",
            Reply::fail_stderr("The Wireless AutoConfig Service (wlansvc) is not running."),
            1,
        );
        let err = is_connected(&runner, "home_5G", "WLAN").await.unwrap_err();
        assert!(matches!(err, WlanError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn connect_uses_extended_timeout() {
        let mut runner = MockResponder::new();
        runner
            .expect_respond()
            .withf(|args, timeout| {
                args == &["wlan", "connect", "name=home_5G", "interface=WLAN"]
                    && *timeout == CONNECT_TIMEOUT
            })
            .times(1)
            .returning(|_, _| Ok(CommandOutput::default()));

        connect(&runner, "home_5G", "WLAN").await.unwrap();
    }

    #[tokio::test]
    async fn connect_failure_is_returned() {
        let mut runner = MockResponder::new();
        expect(
            &mut runner,
            "wlan connect name=home_5G",
            Reply::Fail {
                code: 1,
                stdout: "There is no profile \"home_5G\" assigned to the specified interface.".into(),
                stderr: String::new(),
            },
            1,
        );
        let err = connect(&runner, "home_5G", "WLAN").await.unwrap_err();
        assert!(err.to_string().contains("no profile"));
    }

    #[tokio::test]
    async fn status_returns_none_for_unknown_interface() {
        let mut runner = MockResponder::new();
        expect(&mut runner, "wlan show interfaces", Reply::Ok(EN_TWO_INTERFACES.into()), 2);
        assert!(status(&runner, "Ethernet").await.unwrap().is_none());
        let s = status(&runner, "Wi-Fi 2").await.unwrap().unwrap();
        assert_eq!(s.ssid.as_deref(), Some("office"));
    }
}
