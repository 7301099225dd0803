// src/branch.rs

//! Branch predicate: decides whether a step runs in the current
//! branch/worktree context.
//!
//! Patterns are simple anchored globs (`*` any run of characters, `?`
//! exactly one). A leading `!` negates; a `worktree:` prefix requires the
//! run to happen inside a linked worktree before the rest is matched.

use regex::Regex;

/// Anchored glob match: `*` matches any run of characters, `?` exactly
/// one; everything else is literal (no escapes, `.` is literal).
pub fn glob_match(text: &str, pattern: &str) -> bool {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            c => re.push_str(&regex::escape(&c.to_string())),
        }
    }
    re.push('$');

    Regex::new(&re).map(|r| r.is_match(text)).unwrap_or(false)
}

/// Match a single branch-filter pattern (without any `!` prefix).
fn pattern_matches(pattern: &str, branch: &str, in_worktree: bool) -> bool {
    if let Some(rest) = pattern.strip_prefix("worktree:") {
        if !in_worktree {
            return false;
        }
        return glob_match(branch, rest);
    }
    glob_match(branch, pattern)
}

/// Decide whether a step with the given branch filters should run.
///
/// Rules, in order:
/// 1. absent or empty filter list runs everywhere;
/// 2. any matching negation (`!PAT`) rejects;
/// 3. with no positives left, accept; otherwise accept iff any positive
///    matches.
pub fn should_run(patterns: Option<&[String]>, branch: &str, in_worktree: bool) -> bool {
    let patterns = match patterns {
        Some(p) if !p.is_empty() => p,
        _ => return true,
    };

    let (negations, positives): (Vec<&String>, Vec<&String>) =
        patterns.iter().partition(|p| p.starts_with('!'));

    for neg in &negations {
        if pattern_matches(&neg[1..], branch, in_worktree) {
            return false;
        }
    }

    if positives.is_empty() {
        return true;
    }

    positives
        .iter()
        .any(|p| pattern_matches(p, branch, in_worktree))
}
