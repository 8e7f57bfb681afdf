// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! CoreNLP hosted in a JVM child process.
//!
//! The JVM runs the CoreNLP server bound to localhost; annotation requests go
//! through its HTTP endpoint. There is one JVM per process, tracked in a
//! process-wide [`RuntimeCell`].

use crate::config::{Properties, ServerConfig};
use crate::engine::Engine;
use crate::errors::EngineError;
use crate::runtime::{HostRuntime, LaunchOptions, RuntimeCell};
use crate::state::RuntimeState;
use log::{debug, info, warn};
use std::io::{self, Read};
use std::net::TcpListener;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

pub const CORENLP_SERVER_CLASS: &str = "edu.stanford.nlp.pipeline.StanfordCoreNLPServer";

const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(50);
const SIGKILL_TIMEOUT: Duration = Duration::from_secs(10);
/// How long the JVM must outlive its first ready answer.
const READY_SETTLE: Duration = Duration::from_millis(500);

static JVM: RuntimeCell<JvmProcess> = RuntimeCell::new();

/// Lifecycle state of this process's JVM.
pub fn jvm_state() -> RuntimeState {
    JVM.state()
}

struct JvmProcess {
    child: Child,
}

impl JvmProcess {
    /// SIGTERM, wait `stop_timeout`, then SIGKILL.
    fn terminate(mut self, stop_timeout: Duration) -> Result<(), EngineError> {
        let pid = self.child.id();
        info!("[jvm] sending SIGTERM (pid={pid})");
        request_stop(&mut self.child)?;

        if wait_timeout(&mut self.child, stop_timeout)?.is_none() {
            warn!(
                "[jvm] stop timeout ({}s) reached, sending SIGKILL",
                stop_timeout.as_secs()
            );
            self.child.kill()?;
            if wait_timeout(&mut self.child, SIGKILL_TIMEOUT)?.is_none() {
                return Err(EngineError::Runtime(format!(
                    "JVM (pid={pid}) still running after SIGKILL"
                )));
            }
        }
        Ok(())
    }

    fn kill(&mut self) {
        if let Err(e) = self.child.kill() {
            warn!("[jvm] failed to kill: {e}");
        }
        if let Err(e) = self.child.wait() {
            warn!("[jvm] failed to reap: {e}");
        }
    }
}

#[cfg(unix)]
fn request_stop(child: &mut Child) -> io::Result<()> {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    match i32::try_from(child.id()) {
        Ok(pid) => signal::kill(Pid::from_raw(pid), Signal::SIGTERM).map_err(io::Error::from),
        Err(_) => child.kill(),
    }
}

#[cfg(not(unix))]
fn request_stop(child: &mut Child) -> io::Result<()> {
    child.kill()
}

fn wait_timeout(child: &mut Child, timeout: Duration) -> io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            info!("[jvm] exited with {status}");
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(EXIT_POLL_INTERVAL);
    }
}

/// Build the JVM command line running the CoreNLP server.
pub fn server_command(
    launch: &LaunchOptions,
    port: u16,
    annotation_timeout_ms: u64,
) -> Result<Command, EngineError> {
    if launch.classpath.is_empty() {
        return Err(EngineError::Runtime(
            "empty classpath: no CoreNLP jars found in the installation root".to_string(),
        ));
    }
    let classpath = std::env::join_paths(&launch.classpath)
        .map_err(|e| EngineError::Runtime(format!("invalid classpath: {e}")))?;

    let mut cmd = Command::new(&launch.java);
    cmd.arg(format!("-Xmx{}", launch.memory_size))
        .arg("-cp")
        .arg(classpath)
        .arg(CORENLP_SERVER_CLASS)
        .arg("-port")
        .arg(port.to_string())
        .arg("-timeout")
        .arg(annotation_timeout_ms.to_string())
        .arg("-quiet")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::inherit());
    Ok(cmd)
}

/// Boots and tears down the process-wide JVM.
#[derive(Debug, Clone)]
pub struct JavaRuntime {
    port: u16,
    ready_timeout: Duration,
    stop_timeout: Duration,
    annotation_timeout_ms: u64,
}

impl JavaRuntime {
    pub fn new(server: &ServerConfig) -> Self {
        Self {
            port: server.port,
            ready_timeout: server.ready_timeout(),
            stop_timeout: server.stop_timeout(),
            annotation_timeout_ms: server.annotation_timeout_ms,
        }
    }

    fn ready_url(&self) -> String {
        format!("http://127.0.0.1:{}/ready", self.port)
    }

    fn spawn(&self, launch: &LaunchOptions) -> Result<JvmProcess, EngineError> {
        let mut cmd = server_command(launch, self.port, self.annotation_timeout_ms)?;
        ensure_port_free(self.port)?;
        let child = cmd.spawn()?;
        info!(
            "[jvm] spawned (pid={}, java={}, memory={})",
            child.id(),
            launch.java.display(),
            launch.memory_size
        );

        let mut jvm = JvmProcess { child };
        if let Err(e) = wait_ready(&mut jvm.child, &self.ready_url(), self.ready_timeout) {
            jvm.kill();
            return Err(e);
        }
        info!("[jvm] CoreNLP server ready on port {}", self.port);
        Ok(jvm)
    }
}

impl HostRuntime for JavaRuntime {
    fn boot(&self, launch: &LaunchOptions) -> Result<(), EngineError> {
        JVM.boot_with(|| self.spawn(launch))
    }

    fn teardown(&self) -> Result<bool, EngineError> {
        JVM.teardown_with(|jvm| jvm.terminate(self.stop_timeout))
    }
}

/// The server must bind the port itself, otherwise readiness would be
/// answered by whatever already listens there.
fn ensure_port_free(port: u16) -> Result<(), EngineError> {
    TcpListener::bind(("127.0.0.1", port))
        .map(drop)
        .map_err(|e| EngineError::Runtime(format!("port {port} is already in use: {e}")))
}

fn wait_ready(child: &mut Child, url: &str, timeout: Duration) -> Result<(), EngineError> {
    let agent = ureq::AgentBuilder::new()
        .timeout(READY_POLL_INTERVAL * 4)
        .build();
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Err(EngineError::Runtime(format!(
                "JVM exited during startup with {status}"
            )));
        }
        match agent.get(url).call() {
            Ok(_) => return ensure_settled(child),
            Err(e) => debug!("[jvm] not ready yet: {e}"),
        }
        if Instant::now() >= deadline {
            return Err(EngineError::ReadyTimeout(timeout));
        }
        thread::sleep(READY_POLL_INTERVAL);
    }
}

/// A JVM that fails to bind exits shortly after starting; do not report it ready.
fn ensure_settled(child: &mut Child) -> Result<(), EngineError> {
    match wait_timeout(child, READY_SETTLE)? {
        Some(status) => Err(EngineError::Runtime(format!(
            "JVM exited with {status} right after the server answered"
        ))),
        None => Ok(()),
    }
}

/// A configured CoreNLP pipeline: the properties sent with every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerPipeline {
    properties: String,
}

/// Engine client for the CoreNLP server started by [`JavaRuntime`].
#[derive(Debug)]
pub struct CoreNlpServer {
    url: String,
    agent: ureq::Agent,
}

impl CoreNlpServer {
    pub fn new(port: u16) -> Self {
        Self::with_url(format!("http://127.0.0.1:{port}/"))
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            agent: ureq::AgentBuilder::new().build(),
        }
    }
}

impl Engine for CoreNlpServer {
    type Handle = ServerPipeline;

    /// Encodes the properties and runs an empty request so the server loads
    /// the configured annotators before the first real call.
    fn configure(&self, properties: &Properties) -> Result<ServerPipeline, EngineError> {
        let properties = serde_json::to_string(properties)
            .map_err(|e| EngineError::Runtime(format!("encoding properties: {e}")))?;
        let pipeline = ServerPipeline { properties };
        self.process(&pipeline, "")?;
        Ok(pipeline)
    }

    fn process(&self, pipeline: &ServerPipeline, text: &str) -> Result<String, EngineError> {
        let response = self
            .agent
            .post(&self.url)
            .query("properties", &pipeline.properties)
            .set("Content-Type", "text/plain; charset=utf-8")
            .send_string(text)
            .map_err(request_error)?;

        let mut body = String::new();
        response.into_reader().read_to_string(&mut body)?;
        Ok(body)
    }
}

fn request_error(e: ureq::Error) -> EngineError {
    match e {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            EngineError::Request(format!("status {code}: {}", body.trim()))
        }
        ureq::Error::Transport(t) => EngineError::Request(t.to_string()),
    }
}
