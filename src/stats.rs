// File: stats.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Counters shared by all workers of one run.
#[derive(Debug, Default)]
pub struct ProbeStats {
    total_requests: AtomicUsize,
    successful_requests: AtomicUsize,
    failed_requests: AtomicUsize,
    retried_requests: AtomicUsize,
    start_time: Mutex<Option<DateTime<Utc>>>,
    end_time: Mutex<Option<DateTime<Utc>>>,
}

impl ProbeStats {
    pub fn new() -> ProbeStats {
        ProbeStats::default()
    }

    /// Resets every counter for a new run.
    pub fn start(&self, total_requests: usize) {
        self.total_requests.store(total_requests, Ordering::Relaxed);
        self.successful_requests.store(0, Ordering::Relaxed);
        self.failed_requests.store(0, Ordering::Relaxed);
        self.retried_requests.store(0, Ordering::Relaxed);
        if let Ok(mut start) = self.start_time.lock() {
            *start = Some(Utc::now());
        }
        if let Ok(mut end) = self.end_time.lock() {
            *end = None;
        }
    }

    pub fn finish(&self) {
        if let Ok(mut end) = self.end_time.lock() {
            *end = Some(Utc::now());
        }
    }

    pub fn add_success(&self) {
        self.successful_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_failure(&self) {
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts URLs that needed at least one retry.
    pub fn add_retried(&self) {
        self.retried_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_requests(&self) -> usize {
        self.total_requests.load(Ordering::Relaxed)
    }

    pub fn successful_requests(&self) -> usize {
        self.successful_requests.load(Ordering::Relaxed)
    }

    pub fn failed_requests(&self) -> usize {
        self.failed_requests.load(Ordering::Relaxed)
    }

    pub fn retried_requests(&self) -> usize {
        self.retried_requests.load(Ordering::Relaxed)
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time.lock().ok().and_then(|t| *t)
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time.lock().ok().and_then(|t| *t)
    }

    pub fn duration_ms(&self) -> Option<i64> {
        match (self.start_time(), self.end_time()) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
            _ => None,
        }
    }
}
