//! Token patterns: one pattern string drives both label rendering and the
//! parsing of a previous label back into its components.
//!
//! A pattern is literal text interleaved with tokens:
//!
//! | Token          | Rendered value                      | Read back |
//! |----------------|-------------------------------------|-----------|
//! | `{major}`      | configured major version            | yes       |
//! | `{minor}`      | configured minor version            | yes       |
//! | `{build}`      | computed build number               | yes       |
//! | `{revision}`   | current repository revision         | yes       |
//! | `{rebuild}`    | builds of an unchanged revision     | yes       |
//! | `{date}`       | days elapsed since `startDate`      | no        |
//! | `{msrevision}` | half-seconds since local midnight   | no        |
//!
//! ```
//! use revision_labeller::pattern::{
//!     LabelPattern,
//!     LabelValues,
//!     LiteralMatching,
//! };
//!
//! let pattern = LabelPattern::compile("v{major}.{minor}.{build}", LiteralMatching::Strict)?;
//! let values = LabelValues {
//!     major: 1,
//!     minor: 4,
//!     build: 7,
//!     ..LabelValues::default()
//! };
//! assert_eq!(pattern.render(&values), "v1.4.7");
//!
//! let parsed = pattern.parse("v1.4.7").unwrap();
//! assert_eq!(parsed.version.build, 7);
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::collections::HashSet;
use std::fmt::Write;

use anyhow::{
    Context,
    Result,
};
use regex::{
    Captures,
    Regex,
};

use crate::version::VersionInfo;

/// Pattern used when none is configured.
pub const DEFAULT_PATTERN: &str = "{major}.{minor}.{build}.{revision}";

/// Digits matched for every numeric token when reading a label back.
const DIGITS: &str = "[0-9]+";

/// A placeholder recognised inside a pattern.
///
/// The declaration order is the render order of [`LabelValues`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Major,
    Minor,
    Build,
    Revision,
    Rebuild,
    Date,
    MsRevision,
}

impl Token {
    /// Every token, in render order.
    pub const ALL: [Token; 7] = [
        Token::Major,
        Token::Minor,
        Token::Build,
        Token::Revision,
        Token::Rebuild,
        Token::Date,
        Token::MsRevision,
    ];

    /// Name between the braces, also used as the capture group name.
    pub fn name(self) -> &'static str {
        match self {
            Token::Major => "major",
            Token::Minor => "minor",
            Token::Build => "build",
            Token::Revision => "revision",
            Token::Rebuild => "rebuild",
            Token::Date => "date",
            Token::MsRevision => "msrevision",
        }
    }

    /// `{date}` and `{msrevision}` are derived from the clock and are never
    /// read back from a previous label.
    pub fn is_capturable(self) -> bool {
        !matches!(self, Token::Date | Token::MsRevision)
    }

    fn from_name(name: &str) -> Option<Token> {
        Token::ALL.into_iter().find(|token| token.name() == name)
    }
}

/// How literal pattern text is matched when parsing a previous label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LiteralMatching {
    /// Literal text is used as regular-expression syntax, so a `.` in the
    /// pattern matches any character. This is what existing labels were
    /// generated against.
    #[default]
    Loose,
    /// Literal text must match exactly.
    Strict,
}

/// The seven values a pattern can render, in token order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelValues {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
    pub revision: u32,
    pub rebuild: u32,
    pub elapsed_days: i64,
    pub ms_revision: u32,
}

impl LabelValues {
    fn get(&self, token: Token) -> i64 {
        match token {
            Token::Major => self.major.into(),
            Token::Minor => self.minor.into(),
            Token::Build => self.build.into(),
            Token::Revision => self.revision.into(),
            Token::Rebuild => self.rebuild.into(),
            Token::Date => self.elapsed_days,
            Token::MsRevision => self.ms_revision.into(),
        }
    }
}

/// Components recovered from a previous label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedLabel {
    /// Major, minor, build and revision; tokens missing from the pattern are
    /// zero and flagged invalid.
    pub version: VersionInfo,
    /// Value of `{rebuild}`, if the pattern has one.
    pub rebuild: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Token(Token),
}

/// A compiled token pattern.
#[derive(Debug, Clone)]
pub struct LabelPattern {
    source: String,
    segments: Vec<Segment>,
    matcher: Regex,
}

impl LabelPattern {
    /// Compile `pattern` into its render template and parse expression.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The pattern references a `{token}` that is not known
    /// - Loose literal text does not form a valid regular expression
    pub fn compile(pattern: &str, literals: LiteralMatching) -> Result<Self> {
        let segments = split_segments(pattern)?;
        let expression = parse_expression(&segments, literals);
        let matcher = Regex::new(&expression).with_context(|| {
            format!(
                "Pattern {:?} cannot be used to read previous labels (expression: {})",
                pattern, expression
            )
        })?;

        Ok(Self {
            source: pattern.to_string(),
            segments,
            matcher,
        })
    }

    /// The pattern text this was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Render a label by substituting every token with its value.
    pub fn render(&self, values: &LabelValues) -> String {
        let mut label = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => label.push_str(text),
                Segment::Token(token) => {
                    // Writing into a String cannot fail.
                    let _ = write!(label, "{}", values.get(*token));
                }
            }
        }
        label
    }

    /// Read a label produced by this pattern back into its components.
    ///
    /// Returns `None` if the label does not match, or a captured number does
    /// not fit in a `u32`.
    pub fn parse(&self, label: &str) -> Option<ParsedLabel> {
        let caps = self.matcher.captures(label)?;

        let major = capture(&caps, Token::Major)?;
        let minor = capture(&caps, Token::Minor)?;
        let build = capture(&caps, Token::Build)?;
        let revision = capture(&caps, Token::Revision)?;
        let rebuild = capture(&caps, Token::Rebuild)?;

        Some(ParsedLabel {
            version: VersionInfo {
                major: major.unwrap_or(0),
                minor: minor.unwrap_or(0),
                build: build.unwrap_or(0),
                revision: revision.unwrap_or(0),
                is_major_valid: major.is_some(),
                is_minor_valid: minor.is_some(),
                is_build_valid: build.is_some(),
                is_revision_valid: revision.is_some(),
            },
            rebuild,
        })
    }
}

/// `None` when the group matched but does not convert, `Some(None)` when the
/// group did not take part in the match.
fn capture(caps: &Captures<'_>, token: Token) -> Option<Option<u32>> {
    match caps.name(token.name()) {
        Some(group) => group.as_str().parse::<u32>().ok().map(Some),
        None => Some(None),
    }
}

fn split_segments(pattern: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = pattern;

    while let Some(open) = rest.find('{') {
        literal.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        if name_len > 0 && after[name_len..].starts_with('}') {
            let name = &after[..name_len];
            let token = Token::from_name(name).with_context(|| {
                format!(
                    "Unknown token {{{}}} in pattern {:?}; expected one of {}",
                    name,
                    pattern,
                    Token::ALL
                        .iter()
                        .map(|t| format!("{{{}}}", t.name()))
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })?;
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Token(token));
            rest = &after[name_len + 1..];
        } else {
            literal.push('{');
            rest = after;
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

fn parse_expression(segments: &[Segment], literals: LiteralMatching) -> String {
    let mut expression = String::new();
    let mut captured = HashSet::new();

    for segment in segments {
        match segment {
            Segment::Literal(text) => match literals {
                LiteralMatching::Loose => expression.push_str(text),
                LiteralMatching::Strict => expression.push_str(&regex::escape(text)),
            },
            // Group names must be unique; repeats only have to match digits.
            Segment::Token(token) if token.is_capturable() && captured.insert(*token) => {
                let _ = write!(expression, "(?P<{}>{})", token.name(), DIGITS);
            }
            Segment::Token(_) => expression.push_str(DIGITS),
        }
    }

    expression
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> LabelValues {
        LabelValues {
            major: 1,
            minor: 2,
            build: 3,
            revision: 4,
            rebuild: 5,
            elapsed_days: 6,
            ms_revision: 7,
        }
    }

    #[test]
    fn test_render_all_tokens() {
        let pattern = LabelPattern::compile(
            "{major}-{minor}-{build}-{revision}-{rebuild}-{date}-{msrevision}",
            LiteralMatching::Loose,
        )
        .unwrap();
        assert_eq!(pattern.render(&values()), "1-2-3-4-5-6-7");
    }

    #[test]
    fn test_render_literal_text_and_repeats() {
        let pattern =
            LabelPattern::compile("Custom {major}.{minor}.4.{revision} label", LiteralMatching::Loose)
                .unwrap();
        assert_eq!(pattern.render(&values()), "Custom 1.2.4.4 label");

        let pattern = LabelPattern::compile("r{revision}/r{revision}", LiteralMatching::Strict).unwrap();
        assert_eq!(pattern.render(&values()), "r4/r4");
    }

    #[test]
    fn test_render_negative_elapsed_days() {
        let pattern = LabelPattern::compile("1.0.{date}", LiteralMatching::Loose).unwrap();
        let values = LabelValues {
            elapsed_days: -3,
            ..LabelValues::default()
        };
        assert_eq!(pattern.render(&values), "1.0.-3");
    }

    #[test]
    fn test_unknown_token_is_rejected() {
        let err = LabelPattern::compile("{major}.{patch}", LiteralMatching::Loose).unwrap_err();
        assert!(err.to_string().contains("Unknown token {patch}"));
    }

    #[test]
    fn test_stray_braces_are_literal() {
        let pattern = LabelPattern::compile("{ {major} }", LiteralMatching::Strict).unwrap();
        assert_eq!(pattern.render(&values()), "{ 1 }");
        assert_eq!(pattern.parse("{ 9 }").unwrap().version.major, 9);
    }

    #[test]
    fn test_invalid_loose_literal_is_rejected() {
        let err = LabelPattern::compile("({major}", LiteralMatching::Loose).unwrap_err();
        assert!(err.to_string().contains("cannot be used to read previous labels"));
        assert!(LabelPattern::compile("({major}", LiteralMatching::Strict).is_ok());
    }

    #[test]
    fn test_parse_default_pattern() {
        let pattern = LabelPattern::compile(DEFAULT_PATTERN, LiteralMatching::Loose).unwrap();
        let parsed = pattern.parse("1.0.3.100").unwrap();
        assert_eq!(parsed.version, VersionInfo::new(1, 0, 3, 100));
        assert_eq!(parsed.rebuild, None);
    }

    #[test]
    fn test_parse_missing_tokens_default_to_invalid_zero() {
        let pattern =
            LabelPattern::compile("Custom {major}.{minor}.4.{revision} label", LiteralMatching::Loose)
                .unwrap();
        let parsed = pattern.parse("Custom 2.3.4.5 label").unwrap();
        assert_eq!(parsed.version.major, 2);
        assert_eq!(parsed.version.minor, 3);
        assert_eq!(parsed.version.revision, 5);
        assert_eq!(parsed.version.build, 0);
        assert!(!parsed.version.is_build_valid);
        assert!(parsed.version.is_revision_valid);
    }

    #[test]
    fn test_parse_rebuild() {
        let pattern = LabelPattern::compile(
            "{major}.{minor}.{build}.{revision}.{rebuild}",
            LiteralMatching::Loose,
        )
        .unwrap();
        let parsed = pattern.parse("2.3.0.100.7").unwrap();
        assert_eq!(parsed.rebuild, Some(7));
        assert_eq!(parsed.version.revision, 100);
    }

    #[test]
    fn test_parse_shorter_label_with_rebuild() {
        let source = "{major}.{minor}.{build}.{revision}.{rebuild}";
        let strict = LabelPattern::compile(source, LiteralMatching::Strict).unwrap();
        assert!(strict.parse("2.3.0.100").is_none());

        // The last dot is a wildcard and swallows a digit of the revision.
        let loose = LabelPattern::compile(source, LiteralMatching::Loose).unwrap();
        let parsed = loose.parse("2.3.0.100").unwrap();
        assert_eq!(parsed.version.build, 0);
        assert_eq!(parsed.version.revision, 1);
        assert_eq!(parsed.rebuild, Some(0));
    }

    #[test]
    fn test_parse_mismatch_and_overflow() {
        let pattern = LabelPattern::compile(DEFAULT_PATTERN, LiteralMatching::Loose).unwrap();
        assert!(pattern.parse("").is_none());
        assert!(pattern.parse("1.0").is_none());
        assert!(pattern.parse("99999999999.0.0.1").is_none());
    }

    #[test]
    fn test_loose_literals_act_as_wildcards() {
        let loose = LabelPattern::compile(DEFAULT_PATTERN, LiteralMatching::Loose).unwrap();
        let strict = LabelPattern::compile(DEFAULT_PATTERN, LiteralMatching::Strict).unwrap();
        assert_eq!(
            loose.parse("1x2x3x4").unwrap().version,
            VersionInfo::new(1, 2, 3, 4)
        );
        assert!(strict.parse("1x2x3x4").is_none());
    }

    #[test]
    fn test_date_tokens_match_digits_without_capturing() {
        let pattern =
            LabelPattern::compile("{major}.{minor}.{date}.{revision}", LiteralMatching::Strict).unwrap();
        let parsed = pattern.parse("1.0.32.12").unwrap();
        assert_eq!(parsed.version.revision, 12);
        assert!(!parsed.version.is_build_valid);
    }

    #[test]
    fn test_round_trip() {
        let cases = [
            (DEFAULT_PATTERN, LiteralMatching::Loose),
            (DEFAULT_PATTERN, LiteralMatching::Strict),
            ("{major}.{minor}.{build}.{revision}.{rebuild}", LiteralMatching::Loose),
            ("{major}.{minor}.{build}.{revision}.{rebuild}", LiteralMatching::Strict),
            ("v{major}_{minor}-b{build}-r{revision}", LiteralMatching::Loose),
            (
                "release-{major}_{minor} (build {build}, r{revision})",
                LiteralMatching::Strict,
            ),
        ];
        for (source, literals) in cases {
            let pattern = LabelPattern::compile(source, literals).unwrap();
            let label = pattern.render(&values());
            let parsed = pattern.parse(&label).unwrap();
            let again = LabelValues {
                major: parsed.version.major,
                minor: parsed.version.minor,
                build: parsed.version.build,
                revision: parsed.version.revision,
                rebuild: parsed.rebuild.unwrap_or(0),
                ..values()
            };
            assert_eq!(pattern.render(&again), label, "{} ({:?})", source, literals);
        }
    }
}
