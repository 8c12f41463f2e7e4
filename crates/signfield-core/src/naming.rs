//! Unique-name resolution for placed fields and exported widgets.
//!
//! Names are unique case-insensitively. Collisions resolve by appending
//! `_{k}` for k = 1, 2, ... to the trimmed base until the candidate is
//! free; the walk is deterministic and finishes within taken-set size + 1
//! iterations because every candidate is distinct.

use std::collections::HashSet;

/// Base used when no name is proposed, both at placement and at export.
pub const DEFAULT_BASE_NAME: &str = "Signature";

/// Normalization key for case-insensitive name comparison.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Default name for the next signature field given the current count.
pub fn default_name(existing_count: usize) -> String {
    format!("{}_{}", DEFAULT_BASE_NAME, existing_count + 1)
}

/// Resolve `base` against `taken` (a set of `name_key` values).
pub fn resolve_unique(base: &str, taken: &HashSet<String>) -> String {
    let base = base.trim();
    let mut candidate = base.to_string();
    let mut k = 1usize;
    while taken.contains(&name_key(&candidate)) {
        candidate = format!("{base}_{k}");
        k += 1;
    }
    candidate
}
