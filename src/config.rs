// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use std::num::NonZeroU32;

/// How URLs are handed to workers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DispatchStrategy {
    /// Fixed pool of workers pulling from a bounded queue.
    #[default]
    Queue,
    /// Static split into `workers` contiguous chunks of `ceil(n / workers)`.
    Chunked,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportKind {
    /// Plain HTTP/1.1 over TCP/TLS, keeps header case and order from the wire.
    #[default]
    Wire,
    /// HTTP client library, follows redirects. Header names come back
    /// canonicalised and repeated headers grouped.
    Client,
}

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    method: String,
    authorization: String,
    cookie: String,
    host: String,
    user_agent: String,
    timeout: u64,
    max_retry: u32,
    workers: usize,
    delay_ms: u64,
    rate_limit: Option<NonZeroU32>,
    strategy: DispatchStrategy,
    transport: TransportKind,
    show_progress: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeConfig {
    pub fn new() -> Self {
        Self {
            method: "GET".to_string(),
            authorization: String::new(),
            cookie: String::new(),
            host: String::new(),
            user_agent: String::new(),
            timeout: 1,
            max_retry: 3,
            workers: 1,
            delay_ms: 0,
            rate_limit: None,
            strategy: DispatchStrategy::Queue,
            transport: TransportKind::Wire,
            show_progress: false,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn set_method(&mut self, method: impl Into<String>) {
        self.method = method.into();
    }

    pub fn authorization(&self) -> &str {
        &self.authorization
    }

    pub fn set_authorization(&mut self, authorization: impl Into<String>) {
        self.authorization = authorization.into();
    }

    pub fn cookie(&self) -> &str {
        &self.cookie
    }

    pub fn set_cookie(&mut self, cookie: impl Into<String>) {
        self.cookie = cookie.into();
    }

    /// Value sent as `Host` instead of the URL authority, empty for none.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn set_host(&mut self, host: impl Into<String>) {
        self.host = host.into();
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) {
        self.user_agent = user_agent.into();
    }

    /// Per-request deadline in seconds.
    pub fn timeout(&self) -> u64 {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: u64) {
        self.timeout = timeout;
    }

    pub fn max_retry(&self) -> u32 {
        self.max_retry
    }

    pub fn set_max_retry(&mut self, max_retry: u32) {
        self.max_retry = max_retry;
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Zero is treated as one worker.
    pub fn set_workers(&mut self, workers: usize) {
        self.workers = workers.max(1);
    }

    /// Pause between two consecutive requests of the same worker.
    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    pub fn set_delay_ms(&mut self, delay_ms: u64) {
        self.delay_ms = delay_ms;
    }

    /// Global requests-per-second cap shared by all workers.
    pub fn rate_limit(&self) -> Option<NonZeroU32> {
        self.rate_limit
    }

    pub fn set_rate_limit(&mut self, rate_limit: Option<NonZeroU32>) {
        self.rate_limit = rate_limit;
    }

    pub fn strategy(&self) -> DispatchStrategy {
        self.strategy
    }

    pub fn set_strategy(&mut self, strategy: DispatchStrategy) {
        self.strategy = strategy;
    }

    pub fn transport(&self) -> TransportKind {
        self.transport
    }

    pub fn set_transport(&mut self, transport: TransportKind) {
        self.transport = transport;
    }

    pub fn show_progress(&self) -> bool {
        self.show_progress
    }

    pub fn set_show_progress(&mut self, show_progress: bool) {
        self.show_progress = show_progress;
    }
}
