// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Attach/detach helper for an external JVM diagnostics toolkit.
//!
//! This runs out-of-band, never on the trace hot path, and shares no state
//! with the tracing core. It resolves a local toolkit installation, verifies
//! the expected artifacts are present, and shells out to the toolkit with a
//! fixed argument list. Anything missing or misplaced surfaces as a typed
//! configuration error to the one operation that asked for it.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info};

/// Artifacts a toolkit installation must contain to be usable.
const REQUIRED_ARTIFACTS: [&str; 3] = [
    "diagtool-launcher.jar",
    "diagtool-agent.jar",
    "diagtool-spy.jar",
];

/// Client artifact used to stop a previously attached session.
const CLIENT_ARTIFACT: &str = "diagtool-client.jar";

#[derive(Debug, Error)]
pub enum AttachError {
    #[error("illegal diagnostics toolkit home: {}", .0.display())]
    InvalidHome(PathBuf),
    #[error("{artifact} does not exist in toolkit home {}", home.display())]
    MissingArtifact {
        artifact: &'static str,
        home: PathBuf,
    },
    #[error("failed to launch diagnostics process: {0}")]
    Io(#[from] std::io::Error),
    #[error("diagnostics process exited with {0}")]
    LaunchFailed(std::process::ExitStatus),
}

/// Configuration for the attach helper, read once from the environment.
#[derive(Debug, Clone)]
pub struct AttachConfig {
    /// Explicit toolkit installation directory; when unset the toolkit is
    /// expected under `<agent_home>/diagtool`.
    pub toolkit_home: Option<PathBuf>,
    /// Directory the agent itself was installed from.
    pub agent_home: PathBuf,
    /// Tunnel server forwarded to the toolkit for remote sessions.
    pub tunnel_server: Option<String>,
    pub session_timeout_secs: Option<u64>,
    /// Comma-separated toolkit commands to disable.
    pub disabled_commands: Option<String>,
    pub service_name: String,
    pub instance_name: String,
}

impl AttachConfig {
    pub fn from_env(agent_home: PathBuf) -> AttachConfig {
        AttachConfig {
            toolkit_home: env::var("DIAG_TOOLKIT_HOME").ok().map(PathBuf::from),
            agent_home,
            tunnel_server: env::var("DIAG_TOOLKIT_TUNNEL_SERVER").ok(),
            session_timeout_secs: env::var("DIAG_TOOLKIT_SESSION_TIMEOUT")
                .ok()
                .and_then(|timeout| timeout.parse::<u64>().ok()),
            disabled_commands: env::var("DIAG_TOOLKIT_DISABLED_COMMANDS").ok(),
            service_name: env::var("TRACE_AGENT_SERVICE_NAME")
                .unwrap_or_else(|_| "unknown-service".to_string()),
            instance_name: env::var("TRACE_AGENT_INSTANCE_NAME")
                .unwrap_or_else(|_| "unknown-instance".to_string()),
        }
    }
}

/// Attaches the diagnostics toolkit to `pid`, exposing its console on
/// `telnet_port`.
pub fn attach_process(config: &AttachConfig, pid: u32, telnet_port: u16) -> Result<(), AttachError> {
    let home = toolkit_home(config)?;
    info!("Diagnostics toolkit home: {}", home.display());

    let args = attach_args(config, &home, pid, telnet_port);

    info!("Trying to attach diagnostics toolkit to process {pid}");
    debug!("Launch args: {args:?}");
    run_toolkit(&args)?;
    info!("Attached diagnostics toolkit to process {pid}");

    Ok(())
}

/// Stops the toolkit session listening on `telnet_port`.
pub fn detach_process(config: &AttachConfig, telnet_port: u16) -> Result<(), AttachError> {
    let home = toolkit_home(config)?;

    let args = detach_args(&home, telnet_port);

    debug!("Stop args: {args:?}");
    run_toolkit(&args)?;
    info!("Stopped diagnostics toolkit session on port {telnet_port}");

    Ok(())
}

/// Resolves and verifies the toolkit installation directory.
fn toolkit_home(config: &AttachConfig) -> Result<PathBuf, AttachError> {
    let home = match &config.toolkit_home {
        Some(home) => home.clone(),
        None => config.agent_home.join("diagtool"),
    };
    verify_toolkit_home(&home)?;
    Ok(home)
}

fn verify_toolkit_home(home: &Path) -> Result<(), AttachError> {
    if !home.is_dir() {
        return Err(AttachError::InvalidHome(home.to_path_buf()));
    }

    for artifact in REQUIRED_ARTIFACTS {
        if !home.join(artifact).exists() {
            return Err(AttachError::MissingArtifact {
                artifact,
                home: home.to_path_buf(),
            });
        }
    }

    Ok(())
}

/// The fixed attach argument list, in the order the toolkit expects.
fn attach_args(config: &AttachConfig, home: &Path, pid: u32, telnet_port: u16) -> Vec<String> {
    let launcher = home.join("diagtool-launcher.jar");
    let agent = home.join("diagtool-agent.jar");

    let mut args = vec![
        "-jar".to_string(),
        launcher.display().to_string(),
        "-pid".to_string(),
        pid.to_string(),
        "-core".to_string(),
        launcher.display().to_string(),
        "-agent".to_string(),
        agent.display().to_string(),
        "-app-name".to_string(),
        config.service_name.clone(),
        "-agent-id".to_string(),
        config.instance_name.clone(),
        "-telnet-port".to_string(),
        telnet_port.to_string(),
        "-http-port".to_string(),
        "-1".to_string(),
    ];

    if let Some(tunnel_server) = &config.tunnel_server {
        args.push("-tunnel-server".to_string());
        args.push(tunnel_server.clone());
    }

    if let Some(timeout) = config.session_timeout_secs {
        args.push("-session-timeout".to_string());
        args.push(timeout.to_string());
    }

    if let Some(disabled) = &config.disabled_commands {
        if !disabled.trim().is_empty() {
            args.push("-disabled-commands".to_string());
            args.push(disabled.clone());
        }
    }

    args
}

/// The fixed stop argument list: the client artifact against the local
/// console port.
fn detach_args(home: &Path, telnet_port: u16) -> Vec<String> {
    vec![
        "-jar".to_string(),
        home.join(CLIENT_ARTIFACT).display().to_string(),
        "-c".to_string(),
        "stop".to_string(),
        "127.0.0.1".to_string(),
        telnet_port.to_string(),
    ]
}

fn run_toolkit(args: &[String]) -> Result<(), AttachError> {
    let status = Command::new("java").args(args).status()?;
    if !status.success() {
        return Err(AttachError::LaunchFailed(status));
    }
    Ok(())
}
