//! Recognizing data lines in simulation logs and pulling the raw
//! numeric field out of them.
//!
//! A data line carries the sentinel, a keyword anywhere on the line,
//! and the value right after the separator, e.g.:
//!
//! ```text
//! 12.5s controller ### DATA ### latency +++ 42
//! ```
//!
//! Nothing else about the line is checked. Lines that carry the tag
//! but whose value does not parse as an integer (typically cut off by
//! a crashed simulation) are reported as `ParsedLine::Malformed`, and
//! the statistics skip them just like lines without the tag.

use std::{borrow::Cow, fmt::Display, str::FromStr};

use anyhow::bail;
use kstring::KString;
use serde::{Deserialize, Serialize};

pub const DATA_SENTINEL: &str = "### DATA ###";
pub const FIELD_SEPARATOR: &str = "+++";

/// The measurement a data line is about, matched as a substring of
/// the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Keyword {
    /// Control latency
    Latency,
    /// Number of failed links
    FailedLinks,
    /// Number of switches with a violation
    Switches,
    /// Any other tag
    Other(KString),
}

impl Keyword {
    pub fn as_str(&self) -> &str {
        match self {
            Keyword::Latency => "latency",
            Keyword::FailedLinks => "failed links",
            Keyword::Switches => "switches",
            Keyword::Other(s) => s.as_str(),
        }
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Keyword {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latency" => Ok(Keyword::Latency),
            "failed links" | "failed-links" | "failed_links" => Ok(Keyword::FailedLinks),
            "switches" | "switches-with-violation" | "switches_with_violation" => {
                Ok(Keyword::Switches)
            }
            "" => bail!("the keyword must not be empty"),
            _ => Ok(Keyword::Other(KString::from_ref(s))),
        }
    }
}

impl TryFrom<String> for Keyword {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Keyword> for String {
    fn from(value: Keyword) -> Self {
        value.as_str().to_owned()
    }
}

/// What a single line contributes to a series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedLine {
    /// Not a data line for the extractor
    NotData,
    /// A data line, but the value is missing or not an integer
    Malformed,
    Value(i64),
}

/// Finds the raw value field in a line.
pub trait Extractor {
    /// `None` if `line` is not a data line for this extractor,
    /// otherwise the raw, untrimmed value field (empty if there is no
    /// value field).
    fn raw_value<'l>(&self, line: &'l str) -> Option<&'l str>;

    /// What is being extracted, for messages
    fn describe(&self) -> Cow<'_, str>;

    fn parse_line(&self, line: &str) -> ParsedLine {
        match self.raw_value(line) {
            None => ParsedLine::NotData,
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(value) => ParsedLine::Value(value),
                Err(_) => ParsedLine::Malformed,
            },
        }
    }
}

/// Lines carrying `DATA_SENTINEL` and the keyword; the value is the
/// field after the first `FIELD_SEPARATOR`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedExtractor {
    keyword: Keyword,
}

impl TaggedExtractor {
    pub fn new(keyword: Keyword) -> Self {
        Self { keyword }
    }
}

impl Extractor for TaggedExtractor {
    fn raw_value<'l>(&self, line: &'l str) -> Option<&'l str> {
        if line.contains(DATA_SENTINEL) && line.contains(self.keyword.as_str()) {
            // `a +++ 1 +++ 2` gives ` 1 `
            Some(line.split(FIELD_SEPARATOR).nth(1).unwrap_or(""))
        } else {
            None
        }
    }

    fn describe(&self) -> Cow<'_, str> {
        format!("{:?} values", self.keyword.as_str()).into()
    }
}

/// Older logs without tags: every non-blank line is a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UntaggedExtractor;

impl Extractor for UntaggedExtractor {
    fn raw_value<'l>(&self, line: &'l str) -> Option<&'l str> {
        if line.trim().is_empty() {
            None
        } else {
            Some(line)
        }
    }

    fn describe(&self) -> Cow<'_, str> {
        "untagged values".into()
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;

    fn tagged(keyword: Keyword) -> TaggedExtractor {
        TaggedExtractor::new(keyword)
    }

    #[test]
    fn t_tagged_value() {
        let line = "### DATA ### latency +++ 42";
        assert_eq!(tagged(Keyword::Latency).raw_value(line), Some(" 42"));
        assert_eq!(
            tagged(Keyword::Latency).parse_line(line),
            ParsedLine::Value(42)
        );
        assert_eq!(
            tagged(Keyword::FailedLinks).parse_line(line),
            ParsedLine::NotData
        );
    }

    #[test]
    fn t_keyword_anywhere() {
        let line = "3.2s ctrl-7: ### DATA ### number of failed links +++ 3\n";
        assert_eq!(
            tagged(Keyword::FailedLinks).parse_line(line),
            ParsedLine::Value(3)
        );
        let line = "latency +++ 5 ### DATA ###";
        assert_eq!(
            tagged(Keyword::Latency).parse_line(line),
            ParsedLine::Malformed
        );
        assert_eq!(
            tagged(Keyword::Latency).parse_line("### DATA ### latency +++ -7"),
            ParsedLine::Value(-7)
        );
    }

    #[test]
    fn t_missing_tag_parts() {
        let e = tagged(Keyword::Latency);
        assert_eq!(e.parse_line("latency +++ 42"), ParsedLine::NotData);
        assert_eq!(e.parse_line("### DATA ### +++ 42"), ParsedLine::NotData);
        assert_eq!(e.parse_line(""), ParsedLine::NotData);
    }

    #[test]
    fn t_malformed() {
        let e = tagged(Keyword::Latency);
        assert_eq!(
            e.parse_line("### DATA ### latency +++ notanumber"),
            ParsedLine::Malformed
        );
        assert_eq!(e.parse_line("### DATA ### latency 42"), ParsedLine::Malformed);
        assert_eq!(e.parse_line("### DATA ### latency +++"), ParsedLine::Malformed);
        assert_eq!(
            e.parse_line("### DATA ### latency +++ 4.5"),
            ParsedLine::Malformed
        );
        assert_eq!(
            e.parse_line("### DATA ### latency +++ 1 +++ 2"),
            ParsedLine::Value(1)
        );
    }

    #[test]
    fn t_untagged() {
        assert_eq!(UntaggedExtractor.parse_line(" 17 \n"), ParsedLine::Value(17));
        assert_eq!(UntaggedExtractor.parse_line("   "), ParsedLine::NotData);
        assert_eq!(UntaggedExtractor.parse_line("x"), ParsedLine::Malformed);
    }

    #[test]
    fn t_keyword_from_str() -> Result<()> {
        assert_eq!(Keyword::from_str("latency")?, Keyword::Latency);
        assert_eq!(Keyword::from_str("failed-links")?, Keyword::FailedLinks);
        assert_eq!(Keyword::from_str("failed links")?, Keyword::FailedLinks);
        assert_eq!(Keyword::from_str("switches")?, Keyword::Switches);
        assert_eq!(
            Keyword::from_str("dropped packets")?,
            Keyword::Other(KString::from_static("dropped packets"))
        );
        assert!(Keyword::from_str("").is_err());
        assert_eq!(Keyword::FailedLinks.to_string(), "failed links");
        Ok(())
    }
}
