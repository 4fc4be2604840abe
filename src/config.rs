use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::WlanError;
use crate::logging::LogLevel;

/// Default time between two status checks.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    /// Poll interval in text form, e.g. "15s" or "1m".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// The configured interval, parsed. `None` if unset.
    pub fn interval(&self) -> Result<Option<Duration>, WlanError> {
        self.interval.as_deref().map(parse_duration).transpose()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join("wlan-keeper").join("config.toml"))
}

/// Effective settings for the poll loop after merging CLI flags over the
/// config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSettings {
    pub ssid: String,
    /// `None` means auto-detect.
    pub interface: Option<String>,
    pub interval: Duration,
}

impl WatchSettings {
    /// Command-line values win over the config file, which wins over
    /// defaults. A missing or blank SSID is a configuration error.
    pub fn resolve(
        ssid: Option<String>,
        interface: Option<String>,
        interval: Option<Duration>,
        config: &Config,
    ) -> Result<Self, WlanError> {
        let ssid = non_blank(ssid)
            .or_else(|| non_blank(config.ssid.clone()))
            .ok_or(WlanError::MissingSsid)?;

        let interface = non_blank(interface).or_else(|| non_blank(config.interface.clone()));

        let interval = match interval {
            Some(interval) => interval,
            None => config.interval()?.unwrap_or(DEFAULT_INTERVAL),
        };
        if interval.is_zero() {
            return Err(WlanError::InvalidDuration("0s".to_string()));
        }

        Ok(Self {
            ssid,
            interface,
            interval,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Nanoseconds in one of the unit suffixes a duration segment may carry.
fn unit_nanos(unit: &str) -> Option<u128> {
    let nanos = match unit {
        "ns" => 1,
        "us" | "\u{b5}s" | "\u{3bc}s" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3600 * NANOS_PER_SEC,
        _ => return None,
    };
    Some(nanos)
}

fn leading_digits(text: &str) -> usize {
    text.find(|c: char| !c.is_ascii_digit()).unwrap_or(text.len())
}

/// Parse a duration such as `15s`, `500ms`, `1.5m` or `1h2m3.5s`.
///
/// Segments are a decimal number followed by one of `ns`, `us`, `ms`, `s`,
/// `m` or `h`. A bare integer is taken as seconds. Zero is rejected because
/// the poll loop cannot run on a zero period.
pub fn parse_duration(input: &str) -> Result<Duration, WlanError> {
    let invalid = || WlanError::InvalidDuration(input.to_string());
    let text = input.trim();

    if text.is_empty() {
        return Err(invalid());
    }
    if let Ok(secs) = text.parse::<u64>() {
        return match secs {
            0 => Err(invalid()),
            secs => Ok(Duration::from_secs(secs)),
        };
    }

    let mut total: u128 = 0;
    let mut rest = text;

    while !rest.is_empty() {
        let (whole, after) = rest.split_at(leading_digits(rest));
        let (fraction, after) = match after.strip_prefix('.') {
            Some(after) => after.split_at(leading_digits(after)),
            None => ("", after),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }

        let unit_len = after
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after.len());
        let (unit, after) = after.split_at(unit_len);
        let scale = unit_nanos(unit).ok_or_else(invalid)?;

        let whole: u128 = match whole {
            "" => 0,
            digits => digits.parse().map_err(|_| invalid())?,
        };
        let mut part = whole.checked_mul(scale).ok_or_else(invalid)?;

        // Digits below one nanosecond are dropped.
        let mut place = scale;
        for digit in fraction.bytes() {
            place /= 10;
            if place == 0 {
                break;
            }
            part += u128::from(digit - b'0') * place;
        }

        total = total.checked_add(part).ok_or_else(invalid)?;
        rest = after;
    }

    if total == 0 {
        return Err(invalid());
    }
    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| invalid())?;
    let nanos = (total % NANOS_PER_SEC) as u32;
    Ok(Duration::new(secs, nanos))
}

/// Render a duration in the form [`parse_duration`] accepts.
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.subsec_nanos();
    if nanos != 0 {
        return if nanos % 1_000_000 == 0 {
            format!("{}ms", duration.as_millis())
        } else if nanos % 1_000 == 0 {
            format!("{}us", duration.as_micros())
        } else {
            format!("{}ns", duration.as_nanos())
        };
    }

    let secs = duration.as_secs();
    if secs != 0 && secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs != 0 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}
