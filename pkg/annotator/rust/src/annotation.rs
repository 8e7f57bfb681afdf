// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use serde::Serialize;
use serde_json::{Map, Value};

pub const SENTENCES_KEY: &str = "sentences";
pub const TOKENS_KEY: &str = "tokens";
pub const RAW_KEY: &str = "raw";

/// Canonical annotation result: the normalized CoreNLP `document` mapping.
///
/// `sentences` is always a sequence, every sentence's `tokens` is always a
/// sequence and every token carries integer `begin`/`end` offsets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Annotation(Map<String, Value>);

impl Annotation {
    pub(crate) fn new(document: Map<String, Value>) -> Self {
        Self(document)
    }

    pub fn sentences(&self) -> &[Value] {
        self.0
            .get(SENTENCES_KEY)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All tokens of all sentences, in document order.
    pub fn tokens(&self) -> impl Iterator<Item = &Value> {
        self.sentences().iter().flat_map(|sentence| {
            sentence
                .get(TOKENS_KEY)
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default()
        })
    }

    /// The annotated text, present on results of `Annotator::annotate`.
    pub fn raw(&self) -> Option<&str> {
        self.0.get(RAW_KEY).and_then(Value::as_str)
    }

    pub(crate) fn with_raw(mut self, text: &str) -> Self {
        self.0
            .insert(RAW_KEY.to_string(), Value::String(text.to_string()));
        self
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Annotation> for Value {
    fn from(annotation: Annotation) -> Self {
        Value::Object(annotation.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
#[allow(clippy::panic)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    fn annotation(value: Value) -> Annotation {
        match value {
            Value::Object(map) => Annotation::new(map),
            other => panic!("not a mapping: {other}"),
        }
    }

    #[test]
    fn test_accessors() {
        let a = annotation(json!({
            "sentences": [
                {"tokens": [{"word": "a"}, {"word": "b"}]},
                {"tokens": [{"word": "c"}]},
            ]
        }));
        assert_eq!(a.sentences().len(), 2);
        let words: Vec<&str> = a
            .tokens()
            .map(|t| t["word"].as_str().unwrap())
            .collect();
        assert_eq!(words, vec!["a", "b", "c"]);
        assert!(a.raw().is_none());
    }

    #[test]
    fn test_with_raw() {
        let a = annotation(json!({"sentences": []})).with_raw("Hello <World> & co");
        assert_eq!(a.raw(), Some("Hello <World> & co"));
    }

    #[test]
    fn test_missing_sentences_reads_as_empty() {
        let a = annotation(json!({}));
        assert!(a.sentences().is_empty());
        assert_eq!(a.tokens().count(), 0);
    }

    #[test]
    fn test_serializes_as_plain_mapping() {
        let a = annotation(json!({"sentences": []})).with_raw("x");
        let out = serde_json::to_value(&a).unwrap();
        assert_eq!(out, json!({"sentences": [], "raw": "x"}));
        assert_eq!(Value::from(a), out);
    }
}
