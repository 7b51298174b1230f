use crate::manifest::{self, Owner};

/// Parse an ownership manifest from a string, returning a `ParseResult`
/// containing the parsed rules and any lines that were skipped.
pub fn parse(source: &str) -> ParseResult {
    Parser::new(source).parse()
}

/// The result of parsing an ownership manifest. Parsing never fails as a
/// whole: lines that can't form a rule are recorded in `errors` and skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    pub rules: Vec<Rule>,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    /// Convert the `ParseResult` into a `Manifest`. Later rules replace
    /// earlier rules with an identical pattern. Errors are ignored.
    pub fn into_manifest(self) -> manifest::Manifest {
        self.rules.into_iter().map(manifest::Rule::from).collect()
    }
}

/// A parsed rule. The stored pattern has its leading slashes removed; its
/// span still covers the pattern as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub pattern: Spanned<String>,
    pub owners: Vec<Owner>,
}

impl From<Rule> for manifest::Rule {
    fn from(rule: Rule) -> Self {
        manifest::Rule {
            pattern: rule.pattern.0,
            owners: rule.owners,
        }
    }
}

/// A skipped manifest line. Contains a message describing why the line was
/// skipped and a `Span` covering the offending text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>, span: impl Into<Span>) -> ParseError {
        ParseError {
            message: message.into(),
            span: span.into(),
        }
    }
}

/// Start and end byte offsets of some text in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span(pub usize, pub usize);

impl From<(usize, usize)> for Span {
    fn from((start, end): (usize, usize)) -> Self {
        Span(start, end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned<T>(pub T, pub Span);

impl<T> Spanned<T> {
    fn new(val: impl Into<T>, span: impl Into<Span>) -> Spanned<T> {
        Spanned(val.into(), span.into())
    }
}

struct Parser<'a> {
    source: &'a str,
    pos: usize,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            errors: Vec::new(),
        }
    }

    fn parse(mut self) -> ParseResult {
        let mut rules = Vec::new();

        self.skip_whitespace();
        while let Some(c) = self.peek() {
            match c {
                '\n' => {
                    self.next();
                }
                '#' => self.skip_line(),
                _ => {
                    if let Some(rule) = self.parse_rule() {
                        rules.push(rule);
                    }
                }
            }
            self.skip_whitespace();
        }

        ParseResult {
            rules,
            errors: self.errors,
        }
    }

    fn parse_rule(&mut self) -> Option<Rule> {
        let (raw_pattern, span) = self.parse_token();

        let mut owners = Vec::new();
        loop {
            self.skip_whitespace();
            let (owner, _) = self.parse_token();
            if owner.is_empty() {
                break;
            }
            owners.push(owner);
        }

        if owners.is_empty() {
            self.errors.push(ParseError::new(
                format!("pattern has no owners: {}", raw_pattern),
                span,
            ));
            return None;
        }

        let pattern = raw_pattern.trim_start_matches('/').to_owned();
        Some(Rule {
            pattern: Spanned::new(pattern, span),
            owners,
        })
    }

    // Tokens run until whitespace or end of line. A `#` after the start of a
    // line has no special meaning.
    fn parse_token(&mut self) -> (String, (usize, usize)) {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                break;
            }
            self.next();
        }
        (self.source[start..self.pos].to_owned(), (start, self.pos))
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.next();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' || !c.is_whitespace() {
                break;
            }
            self.next();
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }
}
