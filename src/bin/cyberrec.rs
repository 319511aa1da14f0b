// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Cyberrec CLI
//!
//! Command-line tool for inspecting Cyber record files.
//!
//! ## Usage
//!
//! ```sh
//! # Show file information
//! cyberrec inspect info drive.record.00000
//!
//! # List channels with message counts
//! cyberrec inspect channels drive.record.00000 --counts
//!
//! # Show chunk layout
//! cyberrec inspect chunks drive.record.00000
//!
//! # Dump messages of one channel
//! cyberrec inspect messages drive.record.00000 --channel /apollo/localization/pose --limit 10
//! ```

mod cmd;
mod common;

use std::process;

use clap::{Parser, Subcommand};
use cmd::InspectCmd;
use common::Result;

/// Cyberrec - Cyber record toolkit
///
/// Read headers, indexes and messages of record files and their segments.
#[derive(Parser, Clone)]
#[command(name = "cyberrec")]
#[command(about = "Inspection tool for Cyber record files", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "ArcheBase")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Clone)]
enum Commands {
    /// Inspect file contents (info, channels, chunks, messages)
    #[command(subcommand)]
    Inspect(InspectCmd),
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect(cmd) => cmd.run(),
    }
}

fn main() {
    let result = run();

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
