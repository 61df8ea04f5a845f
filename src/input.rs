// File: input.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use log::info;
use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;

use crate::error::{ProbeError, ProbeResult};

/// Non-empty, trimmed lines of `reader`.
pub fn read_urls_from_reader<R: BufRead>(reader: R) -> std::io::Result<Vec<String>> {
    let mut urls = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let url = line.trim();
        if !url.is_empty() {
            urls.push(url.to_string());
        }
    }
    Ok(urls)
}

pub fn read_urls_from_file(path: &Path) -> ProbeResult<Vec<String>> {
    info!("Reading {}", path.display());
    let read_error = |source| ProbeError::Read {
        path: path.to_path_buf(),
        source,
    };
    let file = std::fs::File::open(path).map_err(read_error)?;
    read_urls_from_reader(std::io::BufReader::new(file)).map_err(read_error)
}

/// Drops repeated URLs, keeping the first occurrence in place.
pub fn dedup(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(urls.len());
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_blank_lines_are_dropped() {
        let input = Cursor::new("http://a\n\n  \nhttp://b  \r\n");
        let urls = read_urls_from_reader(input).unwrap();
        assert_eq!(urls, vec!["http://a", "http://b"]);
    }

    #[test]
    fn test_dedup_keeps_first_occurrence_order() {
        let urls = vec!["http://b", "http://a", "http://b", "http://c", "http://a"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(dedup(urls), vec!["http://b", "http://a", "http://c"]);
    }

    #[test]
    fn test_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        std::fs::write(&path, "http://x\nhttp://y\n").unwrap();
        assert_eq!(read_urls_from_file(&path).unwrap(), vec!["http://x", "http://y"]);
        assert!(read_urls_from_file(&dir.path().join("missing.txt")).is_err());
    }
}
