use std::fmt;

use regex::Regex;

/// How a compiled pattern is tested against a path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MatchMode {
    /// The pattern matches if it occurs anywhere within the path, so `a.js`
    /// matches both `src/a.js` and `src/a.jsx`.
    #[default]
    Substring,
    /// The pattern has to span the entire path.
    Anchored,
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Substring => f.write_str("substring"),
            MatchMode::Anchored => f.write_str("anchored"),
        }
    }
}

/// A compiled ownership pattern.
///
/// `**` matches any sequence of characters including `/`, `*` matches any
/// sequence without `/` and `?` matches one character other than `/`.
/// Everything else matches literally.
#[derive(Debug, Clone)]
pub struct Matcher {
    pattern: String,
    mode: MatchMode,
    condition: Condition,
}

#[derive(Debug, Clone)]
enum Condition {
    Literal,
    Regex(Regex),
}

impl Matcher {
    /// Fails only when the translated expression is too large for the regex
    /// engine, e.g. a pattern made of thousands of wildcards.
    pub fn new(pattern: &str, mode: MatchMode) -> Result<Matcher, regex::Error> {
        let condition = if has_wildcard(pattern) {
            Condition::Regex(pattern_to_regex(pattern, mode)?)
        } else {
            Condition::Literal
        };
        Ok(Matcher {
            pattern: pattern.to_owned(),
            mode,
            condition,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn is_match(&self, path: &str) -> bool {
        match (&self.condition, self.mode) {
            (Condition::Literal, MatchMode::Substring) => {
                memchr::memmem::find(path.as_bytes(), self.pattern.as_bytes()).is_some()
            }
            (Condition::Literal, MatchMode::Anchored) => path == self.pattern,
            (Condition::Regex(re), _) => re.is_match(path),
        }
    }
}

/// Compile `pattern` with the default (substring) match mode.
pub fn compile(pattern: &str) -> Result<Matcher, regex::Error> {
    Matcher::new(pattern, MatchMode::default())
}

fn pattern_to_regex(pattern: &str, mode: MatchMode) -> Result<Regex, regex::Error> {
    let mut regex = String::with_capacity(pattern.len() + 8);
    if mode == MatchMode::Anchored {
        regex.push_str(r#"\A"#);
    }

    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                regex.push_str(r#"(?s:.*)"#);
            }
            '*' => regex.push_str(r#"[^/]*"#),
            '?' => regex.push_str(r#"[^/]"#),
            _ => {
                if regex_syntax::is_meta_character(c) {
                    regex.push('\\');
                }
                regex.push(c);
            }
        }
    }

    if mode == MatchMode::Anchored {
        regex.push_str(r#"\z"#);
    }
    Regex::new(&regex)
}

fn has_wildcard(pattern: &str) -> bool {
    pattern.chars().any(|c| c == '*' || c == '?')
}
