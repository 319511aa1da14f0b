// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Inspect command - show file information, channels, chunks, messages.

use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;

use crate::common::{format_duration, format_timestamp, hex_preview, parse_timestamp, Result};
use cyberrec::{CodecTable, MessageSink, RawCodec, RecordParser, SinkMap};

/// Bytes shown per message in `inspect messages`.
const PREVIEW_BYTES: usize = 16;

/// Inspect file contents.
#[derive(Subcommand, Clone, Debug)]
pub enum InspectCmd {
    /// Show header summary and channels
    Info {
        /// Input record file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List channels from the index
    Channels {
        /// Input record file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Filter channels by pattern
        #[arg(short, long)]
        filter: Option<String>,

        /// Show message counts
        #[arg(long)]
        counts: bool,
    },

    /// Show chunk time ranges and sizes
    Chunks {
        /// Input record file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Print messages with a hex preview
    Messages {
        /// Input record file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Only this channel
        #[arg(short, long)]
        channel: Option<String>,

        /// Stop after this many messages
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Skip messages before this time (seconds, nanoseconds or RFC 3339)
        #[arg(long)]
        start: Option<String>,

        /// Skip messages after this time
        #[arg(long)]
        end: Option<String>,
    },
}

impl InspectCmd {
    pub fn run(self) -> Result<()> {
        match self {
            InspectCmd::Info { input, json } => cmd_info(input, json),
            InspectCmd::Channels {
                input,
                filter,
                counts,
            } => cmd_channels(input, filter, counts),
            InspectCmd::Chunks { input } => cmd_chunks(input),
            InspectCmd::Messages {
                input,
                channel,
                limit,
                start,
                end,
            } => cmd_messages(input, channel, limit, start, end),
        }
    }
}

/// Cmd: Show file info
fn cmd_info(input: PathBuf, json: bool) -> Result<()> {
    let info = RecordParser::info(&input)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("=== {} ===", input.display());
    println!("Version: {}", info.version);
    println!("Size: {} bytes", info.file_size);
    println!("Complete: {}", info.is_complete);
    println!("Channels: {}", info.channels.len());
    println!("Chunks: {}", info.chunk_count);
    println!("Messages: {}", info.message_count);

    if info.message_count > 0 {
        println!("Start: {}", format_timestamp(info.begin_time));
        println!("End: {}", format_timestamp(info.end_time));
        println!("Duration: {}", format_duration(info.duration()));
    }

    println!();
    println!("Channels:");
    for ch in &info.channels {
        println!(
            "  {} | {} | {} messages",
            ch.name, ch.message_type, ch.message_count
        );
    }

    Ok(())
}

/// Cmd: List channels
fn cmd_channels(input: PathBuf, filter: Option<String>, show_counts: bool) -> Result<()> {
    let channels = RecordParser::get_channels(&input)
        .with_context(|| format!("reading channel index of {}", input.display()))?;

    println!("=== Channels in {} ===", input.display());
    println!();

    for channel in channels {
        if let Some(ref pattern) = filter {
            let lower = pattern.to_lowercase();
            if !channel.name.to_lowercase().contains(&lower)
                && !channel.message_type.to_lowercase().contains(&lower)
            {
                continue;
            }
        }

        println!("Channel: {}", channel.name);
        println!("  Type: {}", channel.message_type);
        if show_counts {
            println!("  Messages: {}", channel.message_count);
        }
        println!();
    }

    Ok(())
}

/// Cmd: Show chunks
fn cmd_chunks(input: PathBuf) -> Result<()> {
    let info = RecordParser::info(&input)?;

    println!("=== Chunks in {} ===", input.display());
    println!();

    for (i, chunk) in info.chunks.iter().enumerate() {
        println!(
            "[{}] @{} | {} .. {} | {} messages | {} bytes",
            i,
            chunk.position,
            format_timestamp(chunk.begin_time),
            format_timestamp(chunk.end_time),
            chunk.message_count,
            chunk.raw_size
        );
    }

    Ok(())
}

/// Cmd: Print messages
fn cmd_messages(
    input: PathBuf,
    channel: Option<String>,
    limit: Option<usize>,
    start: Option<String>,
    end: Option<String>,
) -> Result<()> {
    let start = start.as_deref().map(parse_timestamp).transpose()?;
    let end = end.as_deref().map(parse_timestamp).transpose()?;
    let info = RecordParser::info(&input)?;

    let mut codecs = CodecTable::new();
    let mut sinks = SinkMap::new();
    for ch in &info.channels {
        if channel.as_ref().is_some_and(|wanted| *wanted != ch.name) {
            continue;
        }
        codecs.register(ch.name.clone(), RawCodec::new(ch.message_type.clone()));
        sinks.insert(ch.name.clone(), MessageSink::ordered());
    }

    RecordParser::new().parse(&input, &mut sinks, &codecs)?;

    let mut messages: Vec<(u64, &str, &Vec<u8>)> = sinks
        .iter()
        .flat_map(|(name, sink)| {
            sink.entries()
                .map(move |(time, data)| (time.unwrap_or(0), name.as_str(), data))
        })
        .filter(|(time, _, _)| start.map_or(true, |s| *time >= s))
        .filter(|(time, _, _)| end.map_or(true, |e| *time <= e))
        .collect();
    messages.sort_by_key(|(time, _, _)| *time);

    for (time, name, data) in messages.into_iter().take(limit.unwrap_or(usize::MAX)) {
        println!(
            "{} | {} | {} bytes | {}",
            format_timestamp(time),
            name,
            data.len(),
            hex_preview(data, PREVIEW_BYTES)
        );
    }

    Ok(())
}
