// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::config::Properties;
use crate::errors::{EngineError, Error};

/// Leading XML declaration and stylesheet instruction of every CoreNLP XML document.
pub const XML_PREAMBLE: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\r\n",
    "<?xml-stylesheet href=\"CoreNLP-to-HTML.xsl\" type=\"text/xsl\"?>\r\n",
);

/// Length of [`XML_PREAMBLE`], stripped by offset from raw engine output.
pub const XML_PREAMBLE_LEN: usize = 103;

/// The annotation engine, hosted by a [`HostRuntime`](crate::HostRuntime).
///
/// Only valid to call once the runtime is booted.
pub trait Engine {
    /// Configured engine instance.
    type Handle;

    fn configure(&self, properties: &Properties) -> Result<Self::Handle, EngineError>;

    /// Annotate `text`, returning the engine's raw XML serialization.
    fn process(&self, handle: &Self::Handle, text: &str) -> Result<String, EngineError>;
}

/// Drop the fixed-length preamble in front of the `<root>` element.
pub fn strip_preamble(raw: &str) -> Result<&str, Error> {
    raw.get(XML_PREAMBLE_LEN..).ok_or_else(|| {
        Error::MalformedOutput(format!(
            "expected at least {XML_PREAMBLE_LEN} bytes of preamble, got {} bytes",
            raw.len()
        ))
    })
}
