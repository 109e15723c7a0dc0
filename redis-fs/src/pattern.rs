//! Glob compilation and matching: `*`, `?`, `[…]`, `[!…]`, full-match.

use glob::{MatchOptions, Pattern};

use crate::bloom::GRAM_LEN;
use crate::error::{FsError, Result};

pub struct Glob {
    pattern: Pattern,
    raw: String,
    nocase: bool,
}

impl Glob {
    pub fn compile(raw: &[u8], nocase: bool) -> Result<Glob> {
        let raw = core::str::from_utf8(raw)
            .map_err(|_| FsError::invalid("pattern is not valid UTF-8"))?;
        let pattern =
            Pattern::new(raw).map_err(|_| FsError::invalid("invalid glob pattern"))?;
        Ok(Glob {
            pattern,
            raw: raw.to_string(),
            nocase,
        })
    }

    pub fn matches(&self, text: &str) -> bool {
        let options = MatchOptions {
            case_sensitive: !self.nocase,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        self.pattern.matches_with(text, options)
    }

    /// Lowercased grams of every literal run long enough to index. A line
    /// matching the pattern necessarily contains each run verbatim, so a file
    /// whose content index lacks one of these grams cannot match anywhere.
    pub fn literal_grams(&self) -> Vec<Vec<u8>> {
        let mut grams = Vec::new();
        for run in literal_runs(&self.raw) {
            let bytes = run.to_ascii_lowercase().into_bytes();
            for gram in bytes.windows(GRAM_LEN) {
                grams.push(gram.to_vec());
            }
        }
        grams
    }
}

/// Maximal runs of pattern text outside wildcards and character classes.
fn literal_runs(raw: &str) -> Vec<String> {
    let chars: Vec<char> = raw.chars().collect();
    let mut runs = Vec::new();
    let mut cur = String::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' | '?' => {
                flush(&mut runs, &mut cur);
                i += 1;
            }
            '[' => {
                flush(&mut runs, &mut cur);
                // Class syntax: an optional leading `!`, then a literal `]`
                // is allowed as the first member.
                let mut j = i + 1;
                if j < chars.len() && chars[j] == '!' {
                    j += 1;
                }
                if j < chars.len() && chars[j] == ']' {
                    j += 1;
                }
                while j < chars.len() && chars[j] != ']' {
                    j += 1;
                }
                i = if j < chars.len() { j + 1 } else { chars.len() };
            }
            c => {
                cur.push(c);
                i += 1;
            }
        }
    }
    flush(&mut runs, &mut cur);
    runs
}

fn flush(runs: &mut Vec<String>, cur: &mut String) {
    if !cur.is_empty() {
        runs.push(core::mem::take(cur));
    }
}
