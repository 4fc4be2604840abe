//! Localized labels found in `netsh wlan` output.
//!
//! `netsh` prints human-readable `Label : value` lines whose labels follow the
//! display language of the system. Only English and Simplified Chinese are
//! recognized. Extending a set here is enough to support another language;
//! nothing outside the parsers depends on the spellings.

/// Label that opens an interface block in `wlan show interfaces`.
pub const NAME: &[&str] = &["Name", "名称"];

/// Association state label.
pub const STATE: &[&str] = &["State", "状态"];

/// Network name label. It is a substring of `BSSID`, see [`BSSID`].
pub const SSID: &str = "SSID";

/// Access-point identifier label. A line containing it is never an SSID.
pub const BSSID: &str = "BSSID";

/// Signal quality label.
pub const SIGNAL: &[&str] = &["Signal", "信号"];

/// State values meaning the interface is associated.
pub const CONNECTED: &[&str] = &["connected", "已连接"];

/// Scan list entry prefix, as in `SSID 1 : home_5G`.
pub const SCAN_SSID_ENTRY: &str = "SSID ";

/// Diagnostics printed by `wlan show networks` when nothing is in range.
pub const NO_NETWORKS_VISIBLE: &[&str] = &[
    "No wireless networks are currently visible",
    "没有无线网络可见",
];

/// Split a trimmed `Label : value` line at its first colon.
///
/// Returns `None` for lines without a colon. The value keeps any further
/// colons, which matters for BSSIDs and SSIDs containing `:`.
pub fn split_field(line: &str) -> Option<(&str, &str)> {
    let (label, value) = line.trim().split_once(':')?;
    Some((label.trim(), value.trim()))
}

/// True if `label` begins with any of `labels`.
pub fn has_label(label: &str, labels: &[&str]) -> bool {
    labels.iter().any(|l| label.starts_with(l))
}

/// True if `state` is one of the recognized connected tokens.
pub fn is_connected_state(state: &str) -> bool {
    CONNECTED.iter().any(|c| state.eq_ignore_ascii_case(c))
}

/// True if `text` contains a recognized "no networks visible" phrasing.
pub fn says_no_networks_visible(text: &str) -> bool {
    NO_NETWORKS_VISIBLE.iter().any(|p| text.contains(p))
}
