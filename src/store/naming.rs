use std::path::{Path, PathBuf};

/// Characters that are not allowed in file names on at least one platform
const FORBIDDEN: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Filesystem-safe form of a customer name: forbidden characters dropped,
/// whitespace runs collapsed to a single underscore.
pub fn slug(name: &str) -> String {
    let kept: String = name.chars().filter(|c| !FORBIDDEN.contains(c)).collect();
    kept.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .trim_matches('_')
        .to_string()
}

/// Replace forbidden characters in a file stem with `_`, whitespace untouched
pub fn sanitize_file_stem(stem: &str) -> String {
    stem.chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .collect()
}

/// `<prefix>_<slug>_<ceremony date>`; the prefix stands in when the name
/// has nothing usable left.
pub fn base_name(prefix: &str, customer_name: &str, ceremony_date: &str) -> String {
    let mut safe = slug(customer_name);
    if safe.is_empty() {
        safe = prefix.to_string();
    }
    let date = sanitize_file_stem(ceremony_date.trim());
    format!("{prefix}_{safe}_{date}")
}

/// First free path among `<base>.json`, `<base>_1.json`, `<base>_2.json`, ...
pub fn unique_path(dir: &Path, base: &str) -> PathBuf {
    let first = dir.join(format!("{base}.json"));
    if !first.exists() {
        return first;
    }
    (1u32..)
        .map(|n| dir.join(format!("{base}_{n}.json")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}
