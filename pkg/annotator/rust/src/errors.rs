// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the annotator's public operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing installation root or otherwise unusable caller input.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The hosting runtime or the engine failed to initialize.
    #[error("failed to start annotation engine: {0}")]
    Startup(#[source] EngineError),

    /// The engine failed to process one input. The annotator stays running.
    #[error("annotation failed: {0}")]
    Annotation(#[source] EngineError),

    /// Engine output did not decode, or did not match the expected document schema.
    #[error("malformed engine output: {0}")]
    MalformedOutput(String),
}

/// Failures reported by a hosting runtime or engine implementation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("request to engine failed: {0}")]
    Request(String),

    #[error("{0}")]
    Runtime(String),

    #[error("hosting runtime is already booted in this process")]
    AlreadyBooted,

    #[error("hosting runtime was torn down and cannot be booted again in this process")]
    TornDown,

    #[error("annotator was stopped; restarting a stopped annotator is not supported")]
    Stopped,

    #[error("hosting runtime not ready after {}s", .0.as_secs())]
    ReadyTimeout(Duration),
}

pub type Result<T> = std::result::Result<T, Error>;
