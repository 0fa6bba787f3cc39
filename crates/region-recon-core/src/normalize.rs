//! Region name normalization.
//!
//! Provider documentation and the curated catalog spell the same place in
//! different ways ("North Europe" vs "EU North", "United States" vs "US").
//! [`normalize`] folds case, collapses whitespace, and rewrites a fixed set
//! of regional synonyms so names can be compared for equality.
//!
//! Synonyms are matched on whole words only, so "american" is left alone
//! while "america" becomes "us".
//!
//! # Example
//!
//! ```rust
//! use region_recon_core::normalize::{normalize, strip_parenthetical};
//!
//! assert_eq!(normalize("  North Europe ", false), "eu north");
//! assert_eq!(normalize("North Virginia", true), "northvirginia");
//! assert_eq!(strip_parenthetical("US East 1 (N. Virginia)"), "US East 1");
//! ```

/// Word-sequence rewrites, tried in order at each position.
///
/// A rewrite can expose another pattern ("north europe europe" becomes
/// "eu north europe"), so [`normalize`] repeats until nothing changes.
const SYNONYMS: &[(&[&str], &[&str])] = &[
    (&["north", "europe"], &["eu", "north"]),
    (&["south", "europe"], &["eu", "south"]),
    (&["european"], &["eu"]),
    (&["united", "states"], &["us"]),
    (&["america"], &["us"]),
    (&["middle", "east"], &["me"]),
];

/// Canonicalize a region or location string for comparison.
///
/// Lower-cases (ASCII only), trims, collapses runs of whitespace to a single
/// space, and applies the synonym table. With `collapse_spaces` all
/// whitespace is removed as well, so compound spellings compare equal
/// ("North Virginia" and "northvirginia").
///
/// The result is a fixed point: normalizing it again returns it unchanged.
pub fn normalize(text: &str, collapse_spaces: bool) -> String {
    let mut current = rewrite(text, collapse_spaces);
    loop {
        let next = rewrite(&current, collapse_spaces);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// One left-to-right pass of the synonym table.
///
/// Repeating passes terminates: every rewrite either shortens the word list
/// or consumes a "europe" that no rewrite produces.
fn rewrite(text: &str, collapse_spaces: bool) -> String {
    let lowered = text.to_ascii_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();

    let mut out: Vec<&str> = Vec::with_capacity(words.len());
    let mut i = 0;
    'words: while i < words.len() {
        for (pattern, replacement) in SYNONYMS {
            if words[i..].starts_with(pattern) {
                out.extend_from_slice(replacement);
                i += pattern.len();
                continue 'words;
            }
        }
        out.push(words[i]);
        i += 1;
    }

    if collapse_spaces {
        out.concat()
    } else {
        out.join(" ")
    }
}

/// Text before the first `(`, trimmed.
///
/// Catalog display names often carry a qualifier ("US East 1 (N. Virginia)")
/// that scraped names omit.
pub fn strip_parenthetical(name: &str) -> &str {
    name.find('(').map_or(name, |idx| &name[..idx]).trim()
}

/// Split normalized text into alphanumeric words, so "us-east 1" and
/// "us east 1" produce the same sequence.
pub fn words(normalized: &str) -> Vec<&str> {
    normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Canonical form of a machine region code or catalog id: lower-case ASCII
/// letters and digits only, so `us-east-1`, `US_EAST_1`, and `useast1`
/// compare equal and `eastus` is found inside `azure-east-us`.
pub fn normalize_code(code: &str) -> String {
    code.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
