use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WlanError {
    #[error("No wireless interface found in 'netsh wlan show interfaces' output")]
    NoInterfaceFound,

    #[error("Failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command '{command}' timed out after {timeout:?}{}", detail(.stderr))]
    CommandTimeout {
        command: String,
        timeout: Duration,
        /// Whatever the process wrote to stderr before it was killed.
        stderr: String,
    },

    #[error("Command '{command}' failed with exit code {}: {}", display_code(.code), diagnostic(.stdout, .stderr))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("No target network configured (pass --ssid or set 'ssid' in the config file)")]
    MissingSsid,

    #[error("Invalid duration '{0}'")]
    InvalidDuration(String),
}

impl WlanError {
    /// True for the timeout variant, which usually means the WLAN service is
    /// hung rather than reporting a real failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, WlanError::CommandTimeout { .. })
    }
}

/// The text netsh explains a failure with: stderr when it has any, otherwise
/// stdout, where netsh prints most of its errors.
fn diagnostic<'a>(stdout: &'a str, stderr: &'a str) -> &'a str {
    match stderr.trim() {
        "" => stdout.trim(),
        stderr => stderr,
    }
}

fn detail(stderr: &str) -> String {
    match stderr.trim() {
        "" => String::new(),
        stderr => format!(": {stderr}"),
    }
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "<none>".to_string(),
    }
}
