// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Normalizes a fetch payload into chart rows and task stats.
//!
//! Reads `{"tasks": [...], "records": [...]}` JSON and writes
//! `{"rows": [...], "stats": [...], "rejected_records": N}`.

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{Level, info};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chartseries::config::{config_path, load_config, load_config_or_default};
use chartseries::stats::all_task_stats;
use chartseries::{FetchPayload, Row, TaskSummary, TimeWindow, ingest, normalize};

#[derive(Parser, Debug)]
#[command(name = "chartseries")]
#[command(about = "Normalize probe records into chart-ready rows")]
struct Args {
    /// Fetch payload JSON; `-` reads stdin
    #[arg(long, default_value = "-")]
    input: PathBuf,

    /// Output file; stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,

    /// Config file (defaults to $CHARTSERIES_CONFIG or the system path)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start of the stats window, epoch millis (inclusive)
    #[arg(long, requires = "end_ms")]
    start_ms: Option<i64>,

    /// End of the stats window, epoch millis (inclusive)
    #[arg(long, requires = "start_ms")]
    end_ms: Option<i64>,

    /// Overrides the configured log level
    #[arg(long)]
    log_level: Option<String>,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
struct Output {
    rows: Vec<Row>,
    stats: Vec<TaskSummary>,
    rejected_records: usize,
}

fn read_payload(path: &Path) -> Result<FetchPayload> {
    let payload = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("reading payload from stdin")?;
        serde_json::from_str(&buf).context("parsing payload from stdin")?
    } else {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing {}", path.display()))?
    };
    Ok(payload)
}

fn write_output(output: &Output, path: Option<&Path>, pretty: bool) -> Result<()> {
    let mut writer: Box<dyn Write> = match path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    if pretty {
        serde_json::to_writer_pretty(&mut writer, output)?;
    } else {
        serde_json::to_writer(&mut writer, output)?;
    }
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => load_config_or_default(&config_path())?,
    };
    let log_level = match &args.log_level {
        Some(level) => match Level::from_str(level) {
            Ok(level) => level,
            Err(_) => bail!("unknown log level {level:?}"),
        },
        None => config.log_level()?,
    };
    simple_logger::init_with_level(log_level)?;

    let pipeline = config.pipeline()?;
    let payload = read_payload(&args.input)?;
    let report = ingest(&payload.records);

    let rows = normalize(&report.samples, &payload.tasks, &pipeline);
    let window = match (args.start_ms, args.end_ms) {
        (Some(start_ms), Some(end_ms)) => Some(TimeWindow { start_ms, end_ms }),
        _ => None,
    };
    let stats = all_task_stats(&report.samples, &payload.tasks, window);

    info!(
        "{} record(s) for {} task(s) -> {} row(s), {} rejected",
        payload.records.len(),
        payload.tasks.len(),
        rows.len(),
        report.rejected
    );

    let output = Output {
        rows,
        stats,
        rejected_records: report.rejected,
    };
    write_output(&output, args.output.as_deref(), args.pretty)
}
