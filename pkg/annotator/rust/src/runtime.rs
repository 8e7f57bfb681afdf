// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! The hosting runtime capability.
//!
//! A hosting runtime (a JVM, an embedded interpreter, ...) is process-wide
//! state: it is booted at most once per process and torn down at most once.
//! [`RuntimeCell`] enforces those rules for implementations, so a second
//! annotator booting the same runtime gets an error instead of a double boot.

use crate::errors::EngineError;
use crate::state::RuntimeState;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Everything a runtime needs to boot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Runtime loader, e.g. the `java` executable.
    pub java: PathBuf,
    /// Maximum heap size, e.g. `3g`.
    pub memory_size: String,
    /// Resources loaded by the runtime, in order.
    pub classpath: Vec<PathBuf>,
}

/// Process-wide boot/teardown of the runtime hosting the engine.
pub trait HostRuntime {
    /// Boot the runtime and block until it is ready for engine work.
    fn boot(&self, launch: &LaunchOptions) -> Result<(), EngineError>;

    /// Tear the runtime down. Returns `false` when nothing was running.
    fn teardown(&self) -> Result<bool, EngineError>;
}

struct Slot<T> {
    state: RuntimeState,
    resource: Option<T>,
}

impl<T> Slot<T> {
    fn advance(&mut self, next: RuntimeState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid runtime transition {} -> {next}",
            self.state
        );
        self.state = next;
    }
}

/// Guarded holder for a runtime's live resource (e.g. the JVM child process).
///
/// Meant to live in a `static` next to the runtime implementation.
pub struct RuntimeCell<T> {
    slot: Mutex<Slot<T>>,
}

impl<T> RuntimeCell<T> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                state: RuntimeState::Vacant,
                resource: None,
            }),
        }
    }

    pub fn state(&self) -> RuntimeState {
        self.lock().state
    }

    /// Run `boot` if the runtime was never booted in this process.
    ///
    /// A failed boot leaves the cell vacant so the caller may try again.
    pub fn boot_with<F>(&self, boot: F) -> Result<(), EngineError>
    where
        F: FnOnce() -> Result<T, EngineError>,
    {
        let mut slot = self.lock();
        match slot.state {
            RuntimeState::Running => return Err(EngineError::AlreadyBooted),
            RuntimeState::TornDown => return Err(EngineError::TornDown),
            RuntimeState::Vacant => {}
        }
        let resource = boot()?;
        slot.resource = Some(resource);
        slot.advance(RuntimeState::Running);
        Ok(())
    }

    /// Run `teardown` on the live resource if the runtime is running.
    ///
    /// The cell is torn down even when `teardown` fails.
    pub fn teardown_with<F>(&self, teardown: F) -> Result<bool, EngineError>
    where
        F: FnOnce(T) -> Result<(), EngineError>,
    {
        let mut slot = self.lock();
        if !slot.state.is_running() {
            return Ok(false);
        }
        slot.advance(RuntimeState::TornDown);
        if let Some(resource) = slot.resource.take() {
            teardown(resource)?;
        }
        Ok(true)
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for RuntimeCell<T> {
    fn default() -> Self {
        Self::new()
    }
}
