// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Markup to nested mapping.
//!
//! Follows the usual "xml to dict" conventions:
//! - the result is `{ <root tag>: <root value> }`
//! - attributes become `@name` keys
//! - an element with only text becomes a string, an empty element `null`
//! - text next to attributes or children is kept under `#text`
//! - a repeated child becomes a sequence, a single child stays a bare value
//!
//! The last rule is the singleton collapse that the normalizer undoes.

use crate::errors::Error;
use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Map, Value};

const TEXT_KEY: &str = "#text";

struct Frame {
    tag: String,
    fields: Map<String, Value>,
    text: String,
}

impl Frame {
    fn into_value(self) -> (String, Value) {
        let text = self.text.trim();
        let value = if self.fields.is_empty() {
            if text.is_empty() {
                Value::Null
            } else {
                Value::String(text.to_string())
            }
        } else {
            let mut fields = self.fields;
            if !text.is_empty() {
                fields.insert(TEXT_KEY.to_string(), Value::String(text.to_string()));
            }
            Value::Object(fields)
        };
        (self.tag, value)
    }

    fn push_child(&mut self, tag: String, value: Value) {
        match self.fields.get_mut(&tag) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.fields.insert(tag, value);
            }
        }
    }
}

fn malformed(e: impl std::fmt::Display) -> Error {
    Error::MalformedOutput(e.to_string())
}

fn open(reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> Result<Frame, Error> {
    let tag = reader
        .decoder()
        .decode(start.local_name().as_ref())
        .map_err(malformed)?
        .into_owned();

    let mut fields = Map::new();
    for attr in start.attributes() {
        let attr = attr.map_err(malformed)?;
        let local = attr.key.local_name();
        let key = reader.decoder().decode(local.as_ref()).map_err(malformed)?;
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(malformed)?;
        fields.insert(format!("@{key}"), Value::String(value.into_owned()));
    }

    Ok(Frame {
        tag,
        fields,
        text: String::new(),
    })
}

/// Close `frame` into its parent, or return it as the document root.
fn close(frame: Frame, stack: &mut [Frame]) -> Option<Value> {
    let (tag, value) = frame.into_value();
    match stack.last_mut() {
        Some(parent) => {
            parent.push_child(tag, value);
            None
        }
        None => {
            let mut root = Map::new();
            root.insert(tag, value);
            Some(Value::Object(root))
        }
    }
}

/// Decode a well-formed markup document into a nested mapping.
pub fn decode(markup: &str) -> Result<Value, Error> {
    let mut reader = Reader::from_str(markup);
    let mut stack: Vec<Frame> = Vec::new();
    let mut document = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| malformed(format!("at byte {}: {e}", reader.error_position())))?;
        match event {
            Event::Start(start) => {
                if document.is_some() {
                    return Err(malformed("content after the root element"));
                }
                stack.push(open(&reader, &start)?);
            }
            Event::Empty(start) => {
                if document.is_some() {
                    return Err(malformed("content after the root element"));
                }
                let frame = open(&reader, &start)?;
                document = document.or(close(frame, &mut stack));
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| malformed("unbalanced closing tag"))?;
                document = document.or(close(frame, &mut stack));
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    let text = reader.decoder().decode(&text).map_err(malformed)?;
                    top.text.push_str(&text);
                }
            }
            Event::CData(cdata) => {
                if let Some(top) = stack.last_mut() {
                    let text = reader.decoder().decode(&cdata).map_err(malformed)?;
                    top.text.push_str(&text);
                }
            }
            Event::GeneralRef(reference) => {
                if let Some(top) = stack.last_mut() {
                    match reference.resolve_char_ref().map_err(malformed)? {
                        Some(ch) => top.text.push(ch),
                        None => {
                            let name = reader
                                .decoder()
                                .decode(&reference)
                                .map_err(malformed)?;
                            let resolved = resolve_predefined_entity(&name)
                                .ok_or_else(|| malformed(format!("unknown entity &{name};")))?;
                            top.text.push_str(resolved);
                        }
                    }
                }
            }
            Event::Eof => break,
            // Declarations, processing instructions, comments and doctypes carry no data.
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(malformed("unexpected end of document"));
    }
    document.ok_or_else(|| malformed("document has no root element"))
}
