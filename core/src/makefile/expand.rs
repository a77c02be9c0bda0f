use std::io;

use glob::{MatchOptions, Pattern};

use crate::fs::{normalize, FileSystem};

use super::{Makefile, Rule};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// True if `s` contains any glob metacharacter (`*`, `?`, `[`).
pub fn is_glob_pattern(s: &str) -> bool {
    s.contains(['*', '?', '['])
}

/// Replaces every glob prerequisite with the sorted files it matches.
///
/// Only the part of the tree below the pattern's literal prefix is listed,
/// so `src/*.c` never walks outside `src`. A pattern without matches
/// expands to nothing.
pub fn expand_globs(fs: &dyn FileSystem, mf: &Makefile) -> io::Result<Makefile> {
    let mut rules = Vec::with_capacity(mf.rules.len());
    for rule in &mf.rules {
        let mut prereqs = Vec::with_capacity(rule.prereqs.len());
        for prereq in &rule.prereqs {
            if !is_glob_pattern(prereq) {
                prereqs.push(prereq.clone());
                continue;
            }
            let matches = expand_pattern(fs, prereq)?;
            if matches.is_empty() {
                tracing::debug!(rule = %rule.target, pattern = %prereq, "glob matched no files");
            }
            prereqs.extend(matches);
        }
        rules.push(Rule {
            target: rule.target.clone(),
            prereqs,
            recipes: rule.recipes.clone(),
        });
    }
    Ok(Makefile::new(rules))
}

fn expand_pattern(fs: &dyn FileSystem, raw: &str) -> io::Result<Vec<String>> {
    let normalized = normalize(raw);
    let pattern = Pattern::new(normalized)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, format!("{raw}: {e}")))?;

    let mut matches: Vec<String> = fs
        .list_files(&search_root(normalized))?
        .into_iter()
        .filter(|path| pattern.matches_with(normalize(path), MATCH_OPTIONS))
        .collect();
    matches.sort();
    matches.dedup();
    Ok(matches)
}

/// The directory made of the literal components before the first wildcard.
fn search_root(pattern: &str) -> String {
    let fixed: Vec<&str> = pattern
        .split('/')
        .take_while(|c| !is_glob_pattern(c))
        .collect();
    let root = fixed.join("/");
    if !root.is_empty() {
        root
    } else if pattern.starts_with('/') {
        "/".to_string()
    } else {
        ".".to_string()
    }
}
