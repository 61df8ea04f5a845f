// File: cli.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use clap::{Parser, ValueEnum};
use std::num::NonZeroU32;
use std::path::PathBuf;

use crate::config::{DispatchStrategy, ProbeConfig, TransportKind};
use crate::fingerprint::FingerprintConfig;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyArg {
    Queue,
    Chunked,
}

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = "Sends an HTTP request to every given URL, calculates a signature from \
                  each response and groups the URLs by it. Reads URLs from stdin when \
                  no files are given."
)]
pub struct Cli {
    #[arg(help = "Files containing one URL per line")]
    pub files: Vec<PathBuf>,

    #[arg(short = 'X', long = "method", default_value = "GET")]
    pub method: String,

    #[arg(short = 'a', long = "authorization", default_value = "")]
    pub authorization: String,

    #[arg(short = 'c', long = "cookie", default_value = "")]
    pub cookie: String,

    #[arg(short = 'H', long = "host", default_value = "", help = "Host header override")]
    pub host: String,

    #[arg(short = 'u', long = "user-agent", default_value = "")]
    pub user_agent: String,

    #[arg(
        short = 'x',
        long = "timeout",
        default_value_t = 1,
        help = "HTTP request timeout in seconds, 0 disables it"
    )]
    pub timeout: u64,

    #[arg(
        short = 'm',
        long = "max-retry",
        default_value_t = 3,
        help = "Maximum retries for timed out or rate limited requests"
    )]
    pub max_retry: u32,

    #[arg(short = 't', long = "threads", default_value_t = 1)]
    pub threads: usize,

    #[arg(
        short = 'w',
        long = "wait",
        default_value_t = 0,
        help = "Wait ms between requests of one worker"
    )]
    pub wait: u64,

    #[arg(long = "rate-limit", help = "Maximum requests per second over all workers")]
    pub rate_limit: Option<NonZeroU32>,

    #[arg(long = "strategy", value_enum, default_value_t = StrategyArg::Queue)]
    pub strategy: StrategyArg,

    #[arg(
        long = "client",
        help = "Use the HTTP client library and follow redirects; header names are \
                canonicalised and repeated headers grouped instead of kept as sent"
    )]
    pub client: bool,

    #[arg(
        short = 'r',
        long = "response-code",
        help = "Include HTTP response code in signature calculation"
    )]
    pub response_code: bool,

    #[arg(
        short = 's',
        long = "server-header",
        help = "Include 'Server' response header in signature calculation"
    )]
    pub server_header: bool,

    #[arg(long = "json", help = "Print the grouped results as JSON")]
    pub json: bool,

    #[arg(short = 'o', long = "output", help = "Save the grouped results as JSON")]
    pub output: Option<PathBuf>,

    #[arg(long = "diff", help = "Signature diff with JSON file from a previous run")]
    pub diff: Option<PathBuf>,

    #[arg(short = 'v', long = "verbose", help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(short = 'q', long = "quiet", help = "Hide progress bar and run statistics")]
    pub quiet: bool,

    #[arg(long = "no-color", help = "Disable colored output")]
    pub no_color: bool,

    #[arg(long = "log-level", default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    pub fn probe_config(&self) -> ProbeConfig {
        let mut config = ProbeConfig::new();
        config.set_method(self.method.as_str());
        config.set_authorization(self.authorization.as_str());
        config.set_cookie(self.cookie.as_str());
        config.set_host(self.host.as_str());
        config.set_user_agent(self.user_agent.as_str());
        config.set_timeout(self.timeout);
        config.set_max_retry(self.max_retry);
        config.set_workers(self.threads);
        config.set_delay_ms(self.wait);
        config.set_rate_limit(self.rate_limit);
        config.set_strategy(match self.strategy {
            StrategyArg::Queue => DispatchStrategy::Queue,
            StrategyArg::Chunked => DispatchStrategy::Chunked,
        });
        config.set_transport(if self.client {
            TransportKind::Client
        } else {
            TransportKind::Wire
        });
        config.set_show_progress(!self.quiet && !self.json);
        config
    }

    pub fn fingerprint_config(&self) -> FingerprintConfig {
        FingerprintConfig::new(self.response_code, self.server_header)
    }

    /// `--verbose` lifts the configured level to at least `info`.
    pub fn log_level(&self) -> log::LevelFilter {
        let level = self
            .log_level
            .parse::<log::LevelFilter>()
            .unwrap_or(log::LevelFilter::Warn);
        if self.verbose {
            level.max(log::LevelFilter::Info)
        } else {
            level
        }
    }
}
