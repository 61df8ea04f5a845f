// File: similarity.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use std::collections::BTreeSet;

use crate::store::ResultMap;

/// Header names present in the first record of every bucket. Names compare
/// case-sensitively. Empty for an empty map.
pub fn common_headers(results: &ResultMap) -> BTreeSet<String> {
    let mut representatives = results.values().filter_map(|bucket| bucket.first());

    let Some(first) = representatives.next() else {
        return BTreeSet::new();
    };
    let mut common: BTreeSet<String> = first.header_names().map(str::to_string).collect();

    for record in representatives {
        let names: BTreeSet<&str> = record.header_names().collect();
        common.retain(|name| names.contains(name.as_str()));
        if common.is_empty() {
            break;
        }
    }
    common
}
