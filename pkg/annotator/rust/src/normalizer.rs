// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Decoded CoreNLP markup to [`Annotation`].
//!
//! The decoder collapses a repeatable element that occurs once into a bare
//! mapping. Every repeatable level of the CoreNLP schema goes through
//! [`ensure_sequence`] so callers always see sequences.

use crate::annotation::{Annotation, SENTENCES_KEY, TOKENS_KEY};
use crate::errors::Error;
use serde_json::{Map, Value};

const ROOT_KEY: &str = "root";
const DOCUMENT_KEY: &str = "document";
const SENTENCE_KEY: &str = "sentence";
const TOKEN_KEY: &str = "token";
const DEPENDENCIES_KEY: &str = "dependencies";
const DEP_KEY: &str = "dep";
const COREFERENCE_KEY: &str = "coreference";
const MENTION_KEY: &str = "mention";

const OFFSET_FIELDS: [(&str, &str); 2] = [
    ("CharacterOffsetBegin", "begin"),
    ("CharacterOffsetEnd", "end"),
];

/// Undo the singleton collapse: a sequence stays as is, `null` (an empty
/// element) is an empty sequence, anything else becomes a one-element sequence.
pub fn ensure_sequence(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn malformed(msg: impl Into<String>) -> Error {
    Error::MalformedOutput(msg.into())
}

fn into_mapping(value: Value, what: &str) -> Result<Map<String, Value>, Error> {
    match value {
        Value::Object(fields) => Ok(fields),
        Value::Null => Ok(Map::new()),
        other => Err(malformed(format!("{what}: expected a mapping, got {other}"))),
    }
}

/// Items of a wrapper element such as `<sentences><sentence/>...</sentences>`.
fn flatten_group(group: Value, item: &str, what: &str) -> Result<Vec<Value>, Error> {
    let mut fields = into_mapping(group, what)?;
    Ok(fields.remove(item).map(ensure_sequence).unwrap_or_default())
}

/// Normalize a decoded CoreNLP document into the canonical annotation result.
///
/// A missing or empty `sentences` element yields an empty `sentences` sequence.
pub fn normalize(decoded: Value) -> Result<Annotation, Error> {
    let mut document = take_document(decoded)?;

    let slot = document
        .entry(SENTENCES_KEY)
        .or_insert(Value::Null);
    let sentences = flatten_group(slot.take(), SENTENCE_KEY, "document.sentences")?
        .into_iter()
        .enumerate()
        .map(|(i, sentence)| normalize_sentence(i, sentence))
        .collect::<Result<Vec<_>, _>>()?;
    *slot = Value::Array(sentences);

    normalize_coreference(&mut document)?;
    Ok(Annotation::new(document))
}

fn take_document(decoded: Value) -> Result<Map<String, Value>, Error> {
    let root = match decoded {
        Value::Object(mut top) => top.remove(ROOT_KEY),
        _ => None,
    }
    .ok_or_else(|| malformed("missing <root> element"))?;

    let document = match root {
        Value::Object(mut root) => root.remove(DOCUMENT_KEY),
        _ => None,
    }
    .ok_or_else(|| malformed("missing <document> element under <root>"))?;

    into_mapping(document, "document")
}

fn normalize_sentence(index: usize, sentence: Value) -> Result<Value, Error> {
    let mut sentence = into_mapping(sentence, &format!("sentence {index}"))?;

    let slot = sentence.entry(TOKENS_KEY).or_insert(Value::Null);
    let tokens = flatten_group(slot.take(), TOKEN_KEY, &format!("sentence {index} tokens"))?
        .into_iter()
        .enumerate()
        .map(|(t, token)| normalize_token(index, t, token))
        .collect::<Result<Vec<_>, _>>()?;
    *slot = Value::Array(tokens);

    // One <dependencies> element per dependency type, each holding <dep> items.
    if let Some(slot) = sentence.get_mut(DEPENDENCIES_KEY) {
        let mut kinds = ensure_sequence(slot.take());
        for kind in &mut kinds {
            if let Some(deps) = kind.get_mut(DEP_KEY) {
                *deps = Value::Array(ensure_sequence(deps.take()));
            }
        }
        *slot = Value::Array(kinds);
    }

    Ok(Value::Object(sentence))
}

fn normalize_token(sentence: usize, index: usize, token: Value) -> Result<Value, Error> {
    let what = format!("sentence {sentence} token {index}");
    let Value::Object(mut token) = token else {
        return Err(malformed(format!("{what}: expected a mapping")));
    };

    for (verbose, short) in OFFSET_FIELDS {
        let raw = token
            .remove(verbose)
            .ok_or_else(|| malformed(format!("{what}: missing {verbose}")))?;
        let offset = parse_offset(&raw)
            .ok_or_else(|| malformed(format!("{what}: {verbose} is not an offset: {raw}")))?;
        token.insert(short.to_string(), Value::from(offset));
    }

    Ok(Value::Object(token))
}

fn parse_offset(raw: &Value) -> Option<u64> {
    match raw {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

/// `<coreference>` wraps one `<coreference>` per chain, each holding `<mention>` items.
fn normalize_coreference(document: &mut Map<String, Value>) -> Result<(), Error> {
    let Some(slot) = document.get_mut(COREFERENCE_KEY) else {
        return Ok(());
    };

    let chains = flatten_group(slot.take(), COREFERENCE_KEY, "document.coreference")?
        .into_iter()
        .map(|chain| {
            let mut chain = into_mapping(chain, "coreference chain")?;
            if let Some(mentions) = chain.get_mut(MENTION_KEY) {
                *mentions = Value::Array(ensure_sequence(mentions.take()));
            }
            Ok(Value::Object(chain))
        })
        .collect::<Result<Vec<_>, Error>>()?;
    *slot = Value::Array(chains);
    Ok(())
}
