// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanwerk: document detection from the command line.
//
// Entry point. Initialises logging, parses arguments and dispatches to the
// subcommand handlers in `commands`.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::{DetectArgs, ExportArgs};

#[derive(Parser, Debug)]
#[command(
    name = "scanwerk",
    version,
    about = "Find the document in a photo and export a clean crop"
)]
struct Cli {
    /// Scanner settings (JSON). Defaults are used when omitted.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect the document outline in an image.
    Detect {
        image: PathBuf,
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Detect, crop to the document, apply adjustments and save.
    Export {
        image: PathBuf,
        /// Output file; the format follows the extension.
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        brightness: i32,
        #[arg(long, default_value_t = 1.0)]
        contrast: f32,
        #[arg(long, default_value_t = 1.0)]
        saturation: f32,
        /// Hue rotation in degrees.
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        hue: f32,
        /// Clockwise rotation in degrees, applied after cropping.
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        rotate: f32,
        /// Keep the full frame even when a document is found.
        #[arg(long)]
        no_crop: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(?cli, "Arguments parsed");

    let result = match cli.command {
        Command::Detect { image, json } => commands::detect(&DetectArgs {
            image,
            config: cli.config,
        })
        .and_then(|report| commands::print_report(&report, json)),
        Command::Export {
            image,
            out,
            brightness,
            contrast,
            saturation,
            hue,
            rotate,
            no_crop,
        } => commands::export(&ExportArgs {
            image,
            config: cli.config,
            out,
            adjustments: scanwerk_document::Adjustments {
                brightness,
                contrast,
                saturation,
                hue_degrees: hue,
            },
            rotate,
            crop: !no_crop,
        })
        .map(|summary| println!("{summary}")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Command failed");
            eprintln!("scanwerk: {err}");
            ExitCode::FAILURE
        }
    }
}
