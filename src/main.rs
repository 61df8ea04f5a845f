// File: main.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use clap::Parser;
use rshape::cli::Cli;
use rshape::commands::{handle_probe_command, print_error};
use simple_logger::SimpleLogger;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = SimpleLogger::new().with_level(cli.log_level()).init() {
        eprintln!("Failed to initialize logger: {}", e);
    }

    if let Err(e) = handle_probe_command(&cli).await {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
