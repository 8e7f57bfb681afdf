// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

// Correctness
#![deny(clippy::indexing_slicing)]
#![deny(clippy::string_slice)]
#![deny(clippy::cast_possible_wrap)]
// Panicking code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unimplemented)]
#![deny(clippy::todo)]
// Debug code that shouldn't be in production
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]

mod annotation;
pub mod config;
mod daemon;
mod decoder;
mod engine;
mod errors;
pub mod java;
mod normalizer;
mod runtime;
mod state;
mod supervisor;

// Re-export the public API
pub use annotation::Annotation;
pub use config::{AnnotatorConfig, Properties, ServerConfig, Settings};
pub use decoder::decode;
pub use engine::{Engine, XML_PREAMBLE, strip_preamble};
pub use errors::{EngineError, Error, Result};
pub use java::{CoreNlpServer, JavaRuntime};
pub use normalizer::{ensure_sequence, normalize};
pub use runtime::{HostRuntime, LaunchOptions, RuntimeCell};
pub use state::RuntimeState;
pub use supervisor::{Annotator, DAEMON_NAME};
