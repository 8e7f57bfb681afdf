// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

#![allow(dead_code)]

use corenlp_annotator::{
    Annotator, AnnotatorConfig, Engine, EngineError, HostRuntime, LaunchOptions, Properties,
    RuntimeCell, XML_PREAMBLE,
};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub type TestAnnotator = Annotator<ScriptedRuntime, ScriptedEngine>;

/// What the scripted runtime and engine were asked to do.
#[derive(Default)]
pub struct Probe {
    boots: AtomicUsize,
    teardowns: AtomicUsize,
    configures: AtomicUsize,
    configured: Mutex<Option<Properties>>,
    texts: Mutex<Vec<String>>,
}

impl Probe {
    pub fn boots(&self) -> usize {
        self.boots.load(Ordering::SeqCst)
    }

    pub fn teardowns(&self) -> usize {
        self.teardowns.load(Ordering::SeqCst)
    }

    pub fn configures(&self) -> usize {
        self.configures.load(Ordering::SeqCst)
    }

    pub fn configured(&self) -> Option<Properties> {
        self.configured.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

/// Host runtime that only tracks its lifecycle in a (possibly shared) cell.
pub struct ScriptedRuntime {
    cell: Arc<RuntimeCell<()>>,
    probe: Arc<Probe>,
    boot_failures: AtomicUsize,
}

impl ScriptedRuntime {
    pub fn new(cell: Arc<RuntimeCell<()>>, probe: Arc<Probe>) -> Self {
        Self {
            cell,
            probe,
            boot_failures: AtomicUsize::new(0),
        }
    }

    /// Fail the next `count` boots.
    pub fn failing_boots(self, count: usize) -> Self {
        self.boot_failures.store(count, Ordering::SeqCst);
        self
    }
}

impl HostRuntime for ScriptedRuntime {
    fn boot(&self, _launch: &LaunchOptions) -> Result<(), EngineError> {
        self.probe.boots.fetch_add(1, Ordering::SeqCst);
        self.cell.boot_with(|| {
            let remaining = self.boot_failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.boot_failures.store(remaining - 1, Ordering::SeqCst);
                return Err(EngineError::Runtime("scripted boot failure".to_string()));
            }
            Ok(())
        })
    }

    fn teardown(&self) -> Result<bool, EngineError> {
        self.probe.teardowns.fetch_add(1, Ordering::SeqCst);
        self.cell.teardown_with(|()| Ok(()))
    }
}

type Responder = Box<dyn Fn(&str) -> Result<String, EngineError> + Send>;

/// Engine that answers with CoreNLP-shaped XML, or whatever `responder` says.
pub struct ScriptedEngine {
    probe: Arc<Probe>,
    responder: Responder,
    configure_failures: AtomicUsize,
}

impl ScriptedEngine {
    pub fn new(probe: Arc<Probe>) -> Self {
        Self {
            probe,
            responder: Box::new(|text| Ok(format!("{XML_PREAMBLE}{}", corenlp_xml(text)))),
            configure_failures: AtomicUsize::new(0),
        }
    }

    pub fn responding_with(
        mut self,
        responder: impl Fn(&str) -> Result<String, EngineError> + Send + 'static,
    ) -> Self {
        self.responder = Box::new(responder);
        self
    }

    /// Fail the next `count` configure calls.
    pub fn failing_configures(self, count: usize) -> Self {
        self.configure_failures.store(count, Ordering::SeqCst);
        self
    }
}

impl Engine for ScriptedEngine {
    type Handle = Properties;

    fn configure(&self, properties: &Properties) -> Result<Properties, EngineError> {
        self.probe.configures.fetch_add(1, Ordering::SeqCst);
        let remaining = self.configure_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.configure_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(EngineError::Runtime("scripted configure failure".to_string()));
        }
        *self.probe.configured.lock().unwrap() = Some(properties.clone());
        Ok(properties.clone())
    }

    fn process(&self, _properties: &Properties, text: &str) -> Result<String, EngineError> {
        self.probe.texts.lock().unwrap().push(text.to_string());
        (self.responder)(text)
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// CoreNLP-shaped XML for `text`: whitespace tokens, a sentence ends after
/// a token ending in `.`, `!` or `?`. Lines end in CRLF like the real thing.
pub fn corenlp_xml(text: &str) -> String {
    let mut sentences: Vec<Vec<(usize, &str)>> = Vec::new();
    let mut current = Vec::new();
    let mut offset = 0;
    for word in text.split_whitespace() {
        let begin = offset + text[offset..].find(word).unwrap();
        offset = begin + word.len();
        current.push((begin, word));
        if word.ends_with(['.', '!', '?']) {
            sentences.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        sentences.push(current);
    }

    let mut xml = String::from("<root>\r\n  <document>\r\n    <docId>scripted</docId>\r\n");
    if sentences.is_empty() {
        xml.push_str("    <sentences/>\r\n");
    } else {
        xml.push_str("    <sentences>\r\n");
        for (s, tokens) in sentences.iter().enumerate() {
            xml.push_str(&format!("      <sentence id=\"{}\">\r\n        <tokens>\r\n", s + 1));
            for (t, (begin, word)) in tokens.iter().enumerate() {
                xml.push_str(&format!(
                    "          <token id=\"{}\">\r\n            <word>{}</word>\r\n            <CharacterOffsetBegin>{}</CharacterOffsetBegin>\r\n            <CharacterOffsetEnd>{}</CharacterOffsetEnd>\r\n          </token>\r\n",
                    t + 1,
                    escape(word),
                    begin,
                    begin + word.len()
                ));
            }
            xml.push_str("        </tokens>\r\n      </sentence>\r\n");
        }
        xml.push_str("    </sentences>\r\n");
    }
    xml.push_str("  </document>\r\n</root>\r\n");
    xml
}

/// A fake installation root holding the jars the classpath globs for.
pub fn install_corenlp() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for jar in [
        "stanford-corenlp-4.5.6.jar",
        "stanford-corenlp-4.5.6-models.jar",
        "joda-time.jar",
        "jollyday.jar",
        "xom.jar",
    ] {
        fs::write(dir.path().join(jar), b"").unwrap();
    }
    dir
}

pub fn config(home: &Path) -> AnnotatorConfig {
    AnnotatorConfig::new()
        .with_corenlp_home(home)
        .with_property("annotators", "tokenize,ssplit")
}

/// An annotator over its own runtime cell, with the probe observing it.
pub fn scripted(home: &Path) -> (TestAnnotator, Arc<Probe>) {
    scripted_with(home, |runtime, engine| (runtime, engine))
}

/// Like [`scripted`], letting the caller adjust the runtime and engine.
pub fn scripted_with(
    home: &Path,
    adjust: impl FnOnce(ScriptedRuntime, ScriptedEngine) -> (ScriptedRuntime, ScriptedEngine),
) -> (TestAnnotator, Arc<Probe>) {
    let probe = Arc::new(Probe::default());
    let runtime = ScriptedRuntime::new(Arc::new(RuntimeCell::new()), Arc::clone(&probe));
    let engine = ScriptedEngine::new(Arc::clone(&probe));
    let (runtime, engine) = adjust(runtime, engine);
    let annotator = Annotator::with_engine(&config(home), runtime, engine).unwrap();
    (annotator, probe)
}
