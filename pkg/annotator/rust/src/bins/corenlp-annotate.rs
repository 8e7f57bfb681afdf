// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Annotate text with CoreNLP and print the result as JSON (or raw XML).

use anyhow::{Context, Result};
use clap::Parser;
use corenlp_annotator::{Annotator, AnnotatorConfig};
use log::{LevelFilter, info};
use std::io::{self, Read, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "corenlp-annotate")]
#[command(about = "Annotate text with Stanford CoreNLP")]
struct Args {
    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// CoreNLP installation root (defaults to $CORENLP)
    #[arg(long)]
    corenlp_home: Option<PathBuf>,

    /// JVM maximum heap size, e.g. 3g
    #[arg(long)]
    memory: Option<String>,

    /// Path to the java executable
    #[arg(long)]
    java: Option<PathBuf>,

    /// Pipeline property, repeatable
    #[arg(long = "property", value_name = "KEY=VALUE", value_parser = parse_property)]
    properties: Vec<(String, String)>,

    /// Print the engine's XML instead of the normalized JSON
    #[arg(long)]
    markup: bool,

    /// Log progress to stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Text to annotate; read from stdin when absent
    text: Option<String>,
}

fn parse_property(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got {raw:?}")),
    }
}

fn build_config(args: &Args) -> Result<AnnotatorConfig> {
    let mut config = match &args.config {
        Some(path) => AnnotatorConfig::load(path)?,
        None => AnnotatorConfig::new(),
    };
    if let Some(home) = &args.corenlp_home {
        config = config.with_corenlp_home(home);
    }
    if let Some(memory) = &args.memory {
        config = config.with_memory_size(memory);
    }
    if let Some(java) = &args.java {
        config = config.with_java_path(java);
    }
    for (key, value) in &args.properties {
        config = config.with_property(key, value);
    }
    Ok(config)
}

fn read_text(args: &Args) -> Result<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }
    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .context("reading text from stdin")?;
    Ok(text)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    simple_logger::SimpleLogger::new().with_level(level).init()?;

    let config = build_config(&args)?;
    let text = read_text(&args)?;

    let mut annotator = Annotator::new(&config)?;
    let output = if args.markup {
        annotator.annotate_markup(&text)?
    } else {
        serde_json::to_string_pretty(&annotator.annotate(&text)?)?
    };
    annotator.stop();

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{output}")?;
    info!("done");
    Ok(())
}
