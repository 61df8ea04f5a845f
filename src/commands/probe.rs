// File: probe.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use super::{print_info, print_success};
use crate::cli::Cli;
use crate::diff::diff;
use crate::http::Dispatcher;
use crate::input::{dedup, read_urls_from_file, read_urls_from_reader};
use crate::persist::{load_result_map, save_result_map, to_json};
use crate::report::{render_diff, render_stats, render_summary, ReportOptions};
use crate::similarity::common_headers;

fn collect_urls(files: &[PathBuf]) -> Result<Vec<String>> {
    let mut urls = Vec::new();
    if files.is_empty() {
        info!("reading from stdin...");
        let stdin = std::io::stdin();
        urls = read_urls_from_reader(stdin.lock()).context("Failed to read URLs from stdin")?;
    } else {
        for file in files {
            urls.extend(read_urls_from_file(file)?);
        }
    }
    Ok(dedup(urls))
}

pub async fn execute(cli: &Cli) -> Result<()> {
    let fingerprint = cli.fingerprint_config();
    let options = ReportOptions {
        verbose: cli.verbose,
        include_server_header: fingerprint.include_server_header,
    };

    // a broken diff file has to stop the run before any request is sent
    let previous = match (&cli.diff, cli.json) {
        (Some(path), false) => Some(load_result_map(path)?),
        _ => None,
    };

    let urls = collect_urls(&cli.files)?;
    if urls.is_empty() {
        print_info("No URLs given");
        return Ok(());
    }

    let dispatcher = Dispatcher::from_config(cli.probe_config(), fingerprint)
        .context("Invalid request configuration")?;
    let results = dispatcher.run(urls).await?;

    if let Some(path) = &cli.output {
        save_result_map(path, &results)?;
        print_success(&format!("Results saved to: {}", path.display()));
    }

    if cli.json {
        println!("{}", to_json(&results)?);
    } else if let Some(previous) = previous {
        let changes = diff(&results, &previous, &fingerprint);
        print!("{}", render_diff(&changes, &options));
    } else {
        let common = common_headers(&results);
        print!("{}", render_summary(&results, &common, &options));
    }

    if !cli.quiet && !cli.json {
        eprintln!();
        eprintln!("{}", render_stats(&dispatcher.stats()));
    }

    Ok(())
}
