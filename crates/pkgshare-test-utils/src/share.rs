//! [`ShareConnector`] double that counts probes and connects.

use pkgshare_store::{ShareBinding, ShareConnector};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Default)]
struct Inner {
    connected: AtomicBool,
    fail_connect: AtomicBool,
    entries: AtomicUsize,
    probes: AtomicUsize,
    connects: AtomicUsize,
    connect_delay: Mutex<Duration>,
    last_binding: Mutex<Option<ShareBinding>>,
}

/// Fake share: unreachable until `connect` succeeds.
#[derive(Debug, Clone, Default)]
pub struct FakeConnector {
    inner: Arc<Inner>,
}

impl FakeConnector {
    /// A share that is not mapped yet.
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// A share that is already mapped and has content.
    pub fn connected() -> Self {
        let fake = Self::default();
        fake.inner.connected.store(true, Ordering::SeqCst);
        fake.inner.entries.store(1, Ordering::SeqCst);
        fake
    }

    /// Make every connect attempt fail.
    pub fn failing(self) -> Self {
        self.inner.fail_connect.store(true, Ordering::SeqCst);
        self
    }

    /// Make connect take `delay`, widening the window for racing callers.
    pub fn with_connect_delay(self, delay: Duration) -> Self {
        *self.inner.connect_delay.lock().unwrap() = delay;
        self
    }

    /// Simulate the share connection silently dropping.
    pub fn drop_connection(&self) {
        self.inner.connected.store(false, Ordering::SeqCst);
    }

    pub fn connect_count(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    pub fn probe_count(&self) -> usize {
        self.inner.probes.load(Ordering::SeqCst)
    }

    pub fn last_binding(&self) -> Option<ShareBinding> {
        self.inner.last_binding.lock().unwrap().clone()
    }
}

impl ShareConnector for FakeConnector {
    fn has_entries(&self, remote: &str) -> io::Result<bool> {
        self.inner.probes.fetch_add(1, Ordering::SeqCst);
        if self.inner.connected.load(Ordering::SeqCst) {
            Ok(self.inner.entries.load(Ordering::SeqCst) > 0)
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotConnected,
                format!("{remote} is not reachable"),
            ))
        }
    }

    fn connect(&self, binding: &ShareBinding) -> io::Result<()> {
        self.inner.connects.fetch_add(1, Ordering::SeqCst);
        *self.inner.last_binding.lock().unwrap() = Some(binding.clone());

        let delay = *self.inner.connect_delay.lock().unwrap();
        if !delay.is_zero() {
            thread::sleep(delay);
        }

        if self.inner.fail_connect.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "access denied by share",
            ));
        }
        self.inner.connected.store(true, Ordering::SeqCst);
        Ok(())
    }
}
