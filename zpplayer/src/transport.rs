//! Processus externe de diffusion audio (AudioIn)
//!
//! `StartTransmissionToGroup` lance le programme configuré s'il ne tourne
//! pas déjà ; `StopTransmissionToGroup` le termine. Un seul processus
//! existe à la fois.

use std::io;
use std::process::Stdio;

use parking_lot::Mutex;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};
use zpconfig::Config;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("cannot start media transport '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot stop media transport: {0}")]
    Kill(#[source] io::Error),
}

pub struct MediaTransport {
    command: String,
    args: Vec<String>,
    child: Mutex<Option<Child>>,
}

impl MediaTransport {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            child: Mutex::new(None),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.get_transport_command(), config.get_transport_args())
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Lance le processus s'il ne tourne pas.
    ///
    /// Retourne `true` si un nouveau processus a été lancé, `false` s'il
    /// était déjà actif. Doit être appelé depuis un runtime tokio.
    pub fn start(&self) -> Result<bool, TransportError> {
        let mut guard = self.child.lock();

        if let Some(child) = guard.as_mut() {
            match child.try_wait() {
                Ok(None) => {
                    debug!("🎬 Media transport already running");
                    return Ok(false);
                }
                Ok(Some(status)) => info!("Media transport exited ({})", status),
                Err(e) => warn!("⚠️ Cannot poll media transport: {}", e),
            }
            *guard = None;
        }

        let child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TransportError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        info!(
            "🎬 Media transport started: {} (pid {:?})",
            self.command,
            child.id()
        );
        *guard = Some(child);
        Ok(true)
    }

    /// Termine le processus s'il existe. Retourne `true` si un processus
    /// a été arrêté.
    pub fn stop(&self) -> Result<bool, TransportError> {
        let Some(mut child) = self.child.lock().take() else {
            return Ok(false);
        };

        match child.try_wait() {
            Ok(Some(_)) => Ok(false),
            _ => {
                child.start_kill().map_err(TransportError::Kill)?;
                info!("👋 Media transport stopped");
                Ok(true)
            }
        }
    }

    pub fn is_running(&self) -> bool {
        match self.child.lock().as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }
}

impl std::fmt::Debug for MediaTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaTransport")
            .field("command", &self.command)
            .field("args", &self.args)
            .finish()
    }
}
