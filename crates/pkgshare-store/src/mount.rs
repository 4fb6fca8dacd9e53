//! Mapping the remote file share to its local drive designator
//!
//! [`ShareMount::ensure_mounted`] probes the share without locking. Only when
//! the probe fails does it take the instance lock, probe again (another
//! caller may have mapped the share while this one waited), and then connect.
//! At most one physical connect is in flight per `ShareMount`.

use crate::{Error, Result};
use std::io;
use std::process::Command;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

/// A local designator bound to a remote share, with credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct ShareBinding {
    /// Drive designator, e.g. `P:`.
    pub local: String,
    /// UNC address of the share, e.g. `\\account.file.core.windows.net\packages`.
    pub remote: String,
    pub user_name: String,
    secret: String,
}

impl ShareBinding {
    pub fn new(
        local: impl Into<String>,
        remote: impl Into<String>,
        user_name: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            local: local.into(),
            remote: remote.into(),
            user_name: user_name.into(),
            secret: secret.into(),
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl std::fmt::Debug for ShareBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShareBinding")
            .field("local", &self.local)
            .field("remote", &self.remote)
            .field("user_name", &self.user_name)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Platform operations behind a share mapping.
pub trait ShareConnector: Send + Sync {
    /// Whether the remote share lists at least one entry.
    ///
    /// An `Err` means the share is not reachable.
    fn has_entries(&self, remote: &str) -> io::Result<bool>;

    /// Physically map `binding.remote` to `binding.local`.
    fn connect(&self, binding: &ShareBinding) -> io::Result<()>;
}

/// Ensures a share is mapped before the store touches it.
pub struct ShareMount {
    connector: Box<dyn ShareConnector>,
    lock: Mutex<()>,
}

impl ShareMount {
    pub fn new(connector: impl ShareConnector + 'static) -> Self {
        Self {
            connector: Box::new(connector),
            lock: Mutex::new(()),
        }
    }

    /// Map the share unless it is already reachable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mount`] when the physical connect fails. The failure
    /// is not retried here.
    pub fn ensure_mounted(&self, binding: &ShareBinding) -> Result<()> {
        if self.is_connected(&binding.remote) {
            return Ok(());
        }

        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_connected(&binding.remote) {
            return Ok(());
        }

        tracing::debug!(
            local = %binding.local,
            remote = %binding.remote,
            user = %binding.user_name,
            "Mapping network share"
        );
        let started = Instant::now();
        match self.connector.connect(binding) {
            Ok(()) => {
                tracing::debug!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Drive mapping successful"
                );
                Ok(())
            }
            Err(source) => {
                tracing::error!(
                    local = %binding.local,
                    remote = %binding.remote,
                    user = %binding.user_name,
                    error = %source,
                    "Failed to map network share"
                );
                Err(Error::Mount {
                    local: binding.local.clone(),
                    remote: binding.remote.clone(),
                    source,
                })
            }
        }
    }

    fn is_connected(&self, remote: &str) -> bool {
        match self.connector.has_entries(remote) {
            Ok(false) => {
                tracing::warn!(
                    remote,
                    "Share is reachable but empty; assuming it is connected and skipping re-mount"
                );
                true
            }
            Ok(true) => {
                tracing::debug!(remote, "Already connected; skipping re-mount");
                true
            }
            Err(e) => {
                tracing::debug!(remote, error = %e, "Share not reachable; will attempt to mount");
                false
            }
        }
    }
}

impl std::fmt::Debug for ShareMount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShareMount").finish_non_exhaustive()
    }
}

/// Maps shares with the Windows `net use` command.
#[derive(Debug, Clone)]
pub struct NetUseConnector {
    program: String,
}

impl NetUseConnector {
    pub fn new() -> Self {
        Self {
            program: "net".to_string(),
        }
    }

    fn run(&self, args: &[&str]) -> io::Result<()> {
        let output = Command::new(&self.program).args(args).output()?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(io::Error::other(format!(
            "`{} {}` exited with {}: {}",
            self.program,
            args.first().copied().unwrap_or_default(),
            output.status,
            stderr.trim()
        )))
    }
}

impl Default for NetUseConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl ShareConnector for NetUseConnector {
    fn has_entries(&self, remote: &str) -> io::Result<bool> {
        Ok(std::fs::read_dir(remote)?.next().transpose()?.is_some())
    }

    fn connect(&self, binding: &ShareBinding) -> io::Result<()> {
        // A dropped connection can leave the designator mapped but dead.
        if let Err(e) = self.run(&["use", &binding.local, "/delete", "/y"]) {
            tracing::debug!(local = %binding.local, error = %e, "No stale mapping removed");
        }

        let user = format!("/user:{}", binding.user_name);
        self.run(&[
            "use",
            &binding.local,
            &binding.remote,
            &user,
            binding.secret(),
            "/persistent:no",
        ])
    }
}
