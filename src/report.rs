// File: report.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use colored::*;
use std::collections::BTreeSet;

use crate::diff::DiffRecord;
use crate::record::ResponseRecord;
use crate::stats::ProbeStats;
use crate::store::ResultMap;

const RULE_WIDTH: usize = 35;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub verbose: bool,
    pub include_server_header: bool,
}

fn server_value(record: &ResponseRecord) -> &str {
    record.header("server").map(|h| h.value.as_str()).unwrap_or("")
}

/// Grouped overview of a run, signatures in ascending order.
pub fn render_summary(
    results: &ResultMap,
    common: &BTreeSet<String>,
    options: &ReportOptions,
) -> String {
    let mut out = String::new();
    let rule = "-".repeat(RULE_WIDTH);
    let double_rule = "=".repeat(RULE_WIDTH);

    out.push_str(&format!("\n{}\n", "Summary:".bold()));

    if options.verbose {
        out.push_str(&format!("{}\n", double_rule));
        out.push_str("Headers received in every response:\n");
        out.push_str(&format!("{}\n", double_rule));
        for header in common {
            out.push_str(&format!(" - {}\n", header));
        }
        out.push_str(&format!("{}\n", double_rule));
    }

    out.push('\n');
    for (signature, responses) in results {
        out.push_str(&format!("{}\n", rule.bright_black()));
        out.push_str(&format!(
            "Signature: {} ; URLs: {}\n",
            signature.cyan().bold(),
            responses.len()
        ));

        if !options.verbose {
            continue;
        }
        let Some(representative) = responses.first() else {
            continue;
        };

        out.push_str("Additional headers:\n");
        for header in representative.header_entries() {
            if options.include_server_header && header.key.eq_ignore_ascii_case("server") {
                out.push_str(&format!(" - {}: {}\n", header.key, header.value.yellow()));
            } else if !common.contains(&header.key) {
                out.push_str(&format!(" - {}\n", header.key));
            }
        }

        out.push_str("\nUrls: \n");
        let mut urls: Vec<String> = responses
            .iter()
            .map(|r| format!("[{}] {}", r.status_code(), r.url()))
            .collect();
        urls.sort();
        for url in urls {
            out.push_str(&format!("{}\n", url));
        }
        out.push_str(&format!("{}\n\n", rule.bright_black()));
    }

    out
}

fn row(out: &mut String, width: usize, left: &str, right: &str) {
    out.push_str(&format!("{:>width$} | {:<width$}\n", left, right, width = width));
}

fn render_change(out: &mut String, old: &ResponseRecord, new: &ResponseRecord, include_server: bool) {
    let old_headers = old.header_entries();
    let new_headers = new.header_entries();

    let mut width = old_headers
        .iter()
        .chain(new_headers.iter())
        .map(|h| h.key.len())
        .chain(["Previous".len(), "Current".len()])
        .max()
        .unwrap_or(0);
    if include_server {
        width = width.max(server_value(old).len()).max(server_value(new).len());
    }

    let double_rule = "=".repeat(width * 2 + 3);
    let rule = "-".repeat(width * 2 + 3);
    out.push_str(&format!("{}\n", double_rule));
    row(out, width, "Previous", "Current");

    if include_server {
        out.push_str(&format!("{}\n", rule));
        out.push_str("Server Header\n");
        out.push_str(&format!("{}\n", rule));
        row(out, width, server_value(old), server_value(new));
    }

    out.push_str(&format!("{}\n", rule));
    out.push_str("Headers\n");
    out.push_str(&format!("{}\n", rule));
    for i in 0..old_headers.len().max(new_headers.len()) {
        let left = old_headers.get(i).map(|h| h.key.as_str()).unwrap_or("");
        let right = new_headers.get(i).map(|h| h.key.as_str()).unwrap_or("");
        row(out, width, left, right);
    }
    out.push_str(&format!("{}\n", double_rule));
}

/// Changes against a previous run, one block per URL in the order given.
pub fn render_diff(changes: &[DiffRecord], options: &ReportOptions) -> String {
    let mut out = String::new();

    if changes.is_empty() {
        out.push_str(&format!("{}\n", "No signature changes found".green()));
        return out;
    }

    out.push_str(&format!("Found {} changes: \n", changes.len().to_string().bold()));
    for change in changes {
        match &change.old_response {
            None => {
                out.push_str(&format!("{} is {}\n", change.new_response.url(), "new".green()));
            }
            Some(old) => {
                out.push_str(&format!(
                    "{} {}\n",
                    change.new_response.url(),
                    "signature change".yellow()
                ));
                render_change(&mut out, old, &change.new_response, options.include_server_header);
            }
        }
    }
    out
}

pub fn render_stats(stats: &ProbeStats) -> String {
    let format_time = |t: Option<chrono::DateTime<chrono::Utc>>| {
        t.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "-".to_string())
    };
    format!(
        "{} requests. Started at {} / Ended at {}. {} ms. Successful: {}. Failed: {}. Retried: {}.",
        stats.total_requests(),
        format_time(stats.start_time()),
        format_time(stats.end_time()),
        stats.duration_ms().unwrap_or(0),
        stats.successful_requests().to_string().green(),
        stats.failed_requests().to_string().red(),
        stats.retried_requests()
    )
}
