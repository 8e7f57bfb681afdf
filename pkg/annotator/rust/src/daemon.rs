// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use log::{info, warn};
use std::io;
use std::thread::{self, JoinHandle};
use tokio::sync::oneshot;

/// Sending half of the single-use exit event.
pub struct ExitSignal {
    tx: Option<oneshot::Sender<()>>,
}

/// Receiving half, moved into the daemon thread.
pub struct ExitWaiter {
    rx: oneshot::Receiver<()>,
}

pub fn exit_signal() -> (ExitSignal, ExitWaiter) {
    let (tx, rx) = oneshot::channel();
    (ExitSignal { tx: Some(tx) }, ExitWaiter { rx })
}

impl ExitSignal {
    /// Fire the signal. Returns `false` if it was already set.
    pub fn set(&mut self) -> bool {
        match self.tx.take() {
            Some(tx) => {
                // The waiter may already be gone if the daemon never started.
                let _ = tx.send(());
                true
            }
            None => false,
        }
    }

    pub fn is_set(&self) -> bool {
        self.tx.is_none()
    }
}

impl ExitWaiter {
    /// Block the current thread until the signal is set or its sender dropped.
    pub fn wait(self) {
        let _ = self.rx.blocking_recv();
    }
}

/// Background worker whose only job is to stay alive until told to exit.
///
/// Its liveness is what the annotator reports as "running".
pub struct Daemon {
    name: String,
    waiter: Option<ExitWaiter>,
    handle: Option<JoinHandle<()>>,
}

impl Daemon {
    /// Create the daemon without starting it.
    pub fn new(name: impl Into<String>, waiter: ExitWaiter) -> Self {
        Self {
            name: name.into(),
            waiter: Some(waiter),
            handle: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_alive(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Start the worker thread. A daemon runs at most once.
    pub fn spawn(&mut self) -> io::Result<()> {
        let waiter = self.waiter.take().ok_or_else(|| {
            io::Error::other(format!("daemon {} has already run", self.name))
        })?;
        let name = self.name.clone();
        let handle = thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || {
                waiter.wait();
                info!("{name} exit");
            })?;
        self.handle = Some(handle);
        Ok(())
    }

    /// Wait for the worker to finish. Only returns promptly once the exit signal is set.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("{} panicked", self.name);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_until_dead(daemon: &Daemon) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if !daemon.is_alive() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn test_not_alive_before_spawn() {
        let (_signal, waiter) = exit_signal();
        let daemon = Daemon::new("test-daemon", waiter);
        assert!(!daemon.is_alive());
        assert_eq!(daemon.name(), "test-daemon");
    }

    #[test]
    fn test_spawn_then_signal() {
        let (mut signal, waiter) = exit_signal();
        let mut daemon = Daemon::new("test-daemon", waiter);

        daemon.spawn().unwrap();
        assert!(daemon.is_alive());

        assert!(signal.set());
        daemon.join();
        assert!(!daemon.is_alive());
    }

    #[test]
    fn test_signal_is_single_use() {
        let (mut signal, _waiter) = exit_signal();
        assert!(!signal.is_set());
        assert!(signal.set());
        assert!(signal.is_set());
        assert!(!signal.set());
    }

    #[test]
    fn test_signal_before_spawn_exits_immediately() {
        let (mut signal, waiter) = exit_signal();
        let mut daemon = Daemon::new("test-daemon", waiter);
        signal.set();

        daemon.spawn().unwrap();
        assert!(wait_until_dead(&daemon));
    }

    #[test]
    fn test_dropped_signal_releases_daemon() {
        let (signal, waiter) = exit_signal();
        let mut daemon = Daemon::new("test-daemon", waiter);
        daemon.spawn().unwrap();

        drop(signal);
        assert!(wait_until_dead(&daemon));
    }

    #[test]
    fn test_spawn_twice_fails() {
        let (mut signal, waiter) = exit_signal();
        let mut daemon = Daemon::new("test-daemon", waiter);
        daemon.spawn().unwrap();
        signal.set();
        daemon.join();

        assert!(daemon.spawn().is_err());
        assert!(!daemon.is_alive());
    }

    #[test]
    fn test_join_without_spawn() {
        let (_signal, waiter) = exit_signal();
        let mut daemon = Daemon::new("test-daemon", waiter);
        daemon.join();
    }
}
