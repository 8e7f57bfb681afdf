// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::annotation::Annotation;
use crate::config::{AnnotatorConfig, Settings};
use crate::daemon::{Daemon, ExitSignal, exit_signal};
use crate::decoder::decode;
use crate::engine::{Engine, strip_preamble};
use crate::errors::{EngineError, Error, Result};
use crate::java::{CoreNlpServer, JavaRuntime};
use crate::normalizer::normalize;
use crate::runtime::HostRuntime;
use log::{debug, info, warn};

pub const DAEMON_NAME: &str = "corenlp-annotator-daemon";

/// Supervises one annotation engine hosted in a process-wide runtime.
///
/// The engine starts lazily on the first annotation, or explicitly with
/// [`Annotator::start`]. Once [`Annotator::stop`] has run, the annotator
/// cannot be started again. Dropping the annotator stops it.
///
/// Operations take `&mut self`; share an annotator across threads behind a
/// `Mutex`.
pub struct Annotator<R: HostRuntime, E: Engine> {
    settings: Settings,
    runtime: R,
    engine: E,
    handle: Option<E::Handle>,
    runtime_booted: bool,
    exit: ExitSignal,
    daemon: Daemon,
}

impl Annotator<JavaRuntime, CoreNlpServer> {
    /// Annotator backed by a CoreNLP server in a JVM child process.
    pub fn new(config: &AnnotatorConfig) -> Result<Self> {
        Self::with_engine(
            config,
            JavaRuntime::new(&config.server),
            CoreNlpServer::new(config.server.port),
        )
    }
}

impl<R: HostRuntime, E: Engine> Annotator<R, E> {
    /// Resolve `config` and wire the annotator. Nothing is started.
    pub fn with_engine(config: &AnnotatorConfig, runtime: R, engine: E) -> Result<Self> {
        let settings = config.resolve()?;
        info!(
            "annotator configured (home={}, memory={}, {} classpath entries)",
            settings.corenlp_home.display(),
            settings.launch.memory_size,
            settings.launch.classpath.len()
        );

        let (exit, waiter) = exit_signal();
        Ok(Self {
            settings,
            runtime,
            engine,
            handle: None,
            runtime_booted: false,
            exit,
            daemon: Daemon::new(DAEMON_NAME, waiter),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// True while the daemon is running.
    pub fn is_alive(&self) -> bool {
        self.daemon.is_alive()
    }

    /// Boot the runtime if needed, configure the engine and start the daemon.
    ///
    /// A no-op when already running. Fails with [`EngineError::Stopped`] once
    /// the annotator has been stopped.
    pub fn start(&mut self) -> Result<()> {
        if self.is_alive() {
            debug!("annotator already running");
            return Ok(());
        }
        if self.exit.is_set() {
            return Err(Error::Startup(EngineError::Stopped));
        }

        if !self.runtime_booted {
            info!("booting hosting runtime");
            self.runtime
                .boot(&self.settings.launch)
                .map_err(Error::Startup)?;
            self.runtime_booted = true;
        }

        let handle = self
            .engine
            .configure(&self.settings.properties)
            .map_err(Error::Startup)?;
        self.daemon
            .spawn()
            .map_err(|e| Error::Startup(EngineError::Io(e)))?;
        self.handle = Some(handle);

        info!("annotator started ({})", self.daemon.name());
        Ok(())
    }

    /// Tear down the runtime this annotator booted and stop the daemon.
    ///
    /// Teardown failures are logged, not returned. A second call is a no-op.
    pub fn stop(&mut self) {
        if self.exit.is_set() {
            debug!("annotator already stopped");
            return;
        }

        self.handle = None;
        if self.runtime_booted {
            match self.runtime.teardown() {
                Ok(true) => info!("hosting runtime torn down"),
                Ok(false) => debug!("hosting runtime was not running"),
                Err(e) => warn!("failed to tear down hosting runtime: {e}"),
            }
        }

        self.exit.set();
        self.daemon.join();
        info!("annotator stopped");
    }

    fn ensure_started(&mut self) -> Result<()> {
        if !self.is_alive() {
            info!("annotator not running, starting it");
            self.start()?;
        }
        Ok(())
    }

    /// Annotate `text` and return the engine's XML document without its preamble.
    pub fn annotate_markup(&mut self, text: &str) -> Result<String> {
        self.ensure_started()?;
        let handle = self.handle.as_ref().ok_or_else(|| {
            Error::Annotation(EngineError::Runtime("engine is not configured".to_string()))
        })?;

        debug!("annotating {} bytes", text.len());
        let raw = self
            .engine
            .process(handle, text)
            .map_err(Error::Annotation)?;
        Ok(strip_preamble(&raw)?.to_string())
    }

    /// Annotate `text` into a normalized [`Annotation`] carrying `text` as `raw`.
    pub fn annotate(&mut self, text: &str) -> Result<Annotation> {
        let markup = self.annotate_markup(text)?;
        let annotation = normalize(decode(&markup)?)?;
        Ok(annotation.with_raw(text))
    }
}

impl<R: HostRuntime, E: Engine> Drop for Annotator<R, E> {
    fn drop(&mut self) {
        self.stop();
    }
}
