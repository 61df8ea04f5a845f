// File: persist.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::{ProbeError, ProbeResult};
use crate::store::ResultMap;

pub fn to_json(results: &ResultMap) -> ProbeResult<String> {
    Ok(serde_json::to_string_pretty(results)?)
}

pub fn from_json(path: &Path, data: &str) -> ProbeResult<ResultMap> {
    serde_json::from_str(data).map_err(|source| ProbeError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a result file written by an earlier run.
pub fn load_result_map(path: &Path) -> ProbeResult<ResultMap> {
    let data = std::fs::read_to_string(path).map_err(|source| ProbeError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    from_json(path, &data)
}

pub fn save_result_map(path: &Path, results: &ResultMap) -> ProbeResult<()> {
    let json = to_json(results)?;
    let write_error = |source| ProbeError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::create(path).map_err(write_error)?;
    writeln!(file, "{}", json).map_err(write_error)?;
    Ok(())
}
