//! Wildcard matching over file base names.
//!
//! Patterns use two meta-characters:
//! - `*` matches zero or more characters
//! - `?` matches exactly one character
//!
//! Every other character matches itself. There are no escapes, so every
//! string is a valid pattern and a literal `*` or `?` cannot be matched.

/// Whether a [`FilePattern`] folds case before matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseSensitivity {
    Sensitive,
    #[default]
    Insensitive,
}

/// A wildcard pattern paired with its case policy.
///
/// Built per operation from caller-supplied configuration and dropped
/// afterwards.
#[derive(Debug, Clone)]
pub struct FilePattern {
    pattern: Vec<char>,
    case: CaseSensitivity,
}

impl FilePattern {
    pub fn new(pattern: &str, case: CaseSensitivity) -> Self {
        let pattern = match case {
            CaseSensitivity::Sensitive => pattern.chars().collect(),
            CaseSensitivity::Insensitive => pattern.to_lowercase().chars().collect(),
        };
        Self { pattern, case }
    }

    pub fn case_sensitivity(&self) -> CaseSensitivity {
        self.case
    }

    /// Check a base name against the pattern.
    pub fn matches(&self, name: &str) -> bool {
        let text: Vec<char> = match self.case {
            CaseSensitivity::Sensitive => name.chars().collect(),
            CaseSensitivity::Insensitive => name.to_lowercase().chars().collect(),
        };
        match_chars(&self.pattern, &text)
    }
}

/// Case-sensitive wildcard match of `candidate` against `pattern`.
///
/// # Examples
///
/// ```
/// use fileconnect::pattern::wildcard_match;
///
/// assert!(wildcard_match("*.txt", "readme.txt"));
/// assert!(wildcard_match("file?.dat", "file1.dat"));
/// assert!(!wildcard_match("*.txt", "readme.md"));
/// ```
pub fn wildcard_match(pattern: &str, candidate: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = candidate.chars().collect();
    match_chars(&pattern, &text)
}

/// Two-pointer matcher with single-star backtracking.
///
/// Only the most recent `*` needs to be remembered: when a later literal
/// fails, the text position it absorbs is advanced by one and matching
/// resumes right after that star.
fn match_chars(pattern: &[char], text: &[char]) -> bool {
    let (mut p, mut t) = (0usize, 0usize);
    // (pattern index after the star, text index the star is anchored at)
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                p += 1;
                backtrack = Some((p, t));
            }
            Some('?') => {
                p += 1;
                t += 1;
            }
            Some(c) if *c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star_p, star_t)) => {
                    p = star_p;
                    t = star_t + 1;
                    backtrack = Some((star_p, star_t + 1));
                }
                None => return false,
            },
        }
    }

    // Text exhausted: only stars may remain
    pattern[p..].iter().all(|c| *c == '*')
}
