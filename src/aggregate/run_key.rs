//! The keys of an aggregate report, and how they are derived from a
//! run directory.

use std::{fmt::Display, str::FromStr};

use anyhow::{Result, anyhow};
use kstring::KString;
use lazy_static::lazy_static;
use noisy_float::types::N64;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum_macros::EnumString;

/// Numbers sort numerically and before text keys; text keys sort
/// lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReportKey {
    Number(N64),
    Text(KString),
}

impl ReportKey {
    /// Fails for NaN
    pub fn number(x: f64) -> Result<Self> {
        Ok(ReportKey::Number(
            N64::try_new(x).ok_or_else(|| anyhow!("key is not a number: {x}"))?,
        ))
    }
}

impl Display for ReportKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportKey::Number(x) => write!(f, "{}", x.raw()),
            ReportKey::Text(s) => f.write_str(s),
        }
    }
}

/// How the key of a run is found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "kebab_case")]
#[serde(rename_all = "kebab-case")]
pub enum KeyStrategy {
    /// Run directory names ending in `-<number>%`, e.g. `run-10%`;
    /// the key is the fraction (0.1)
    #[default]
    PercentSuffix,
    /// Run directory names containing `link-failure-<token>`; the key
    /// is the token
    LinkFailurePrefix,
    /// The mean of the "failed links" values in the run's log
    FailedLinks,
}

impl KeyStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyStrategy::PercentSuffix => "percent-suffix",
            KeyStrategy::LinkFailurePrefix => "link-failure-prefix",
            KeyStrategy::FailedLinks => "failed-links",
        }
    }

    pub fn is_name_based(self) -> bool {
        match self {
            KeyStrategy::PercentSuffix | KeyStrategy::LinkFailurePrefix => true,
            KeyStrategy::FailedLinks => false,
        }
    }

    /// The key from a run directory name, multiplied with `scale` if
    /// numeric. `None` if the name does not match the pattern, or the
    /// strategy does not use names.
    pub fn key_from_dir_name(self, dir_name: &str, scale: f64) -> Result<Option<ReportKey>> {
        match self {
            KeyStrategy::PercentSuffix => percent_suffix(dir_name)
                .map(|percent| ReportKey::number(percent / 100. * scale))
                .transpose(),
            KeyStrategy::LinkFailurePrefix => match link_failure_token(dir_name) {
                Some(token) => match f64::from_str(token) {
                    Ok(x) if x.is_finite() => Ok(Some(ReportKey::number(x * scale)?)),
                    _ => Ok(Some(ReportKey::Text(KString::from_ref(token)))),
                },
                None => Ok(None),
            },
            KeyStrategy::FailedLinks => Ok(None),
        }
    }
}

impl Display for KeyStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

lazy_static! {
    static ref PERCENT_SUFFIX: Regex =
        Regex::new(r"-([0-9]+(?:\.[0-9]+)?)%$").expect("valid regex");
    static ref LINK_FAILURE: Regex = Regex::new(r"link-failure-(.+)$").expect("valid regex");
}

/// `run-12.5%` -> 12.5
fn percent_suffix(dir_name: &str) -> Option<f64> {
    let caps = PERCENT_SUFFIX.captures(dir_name)?;
    caps.get(1)?.as_str().parse().ok()
}

/// `sdn-link-failure-3` -> "3"
fn link_failure_token(dir_name: &str) -> Option<&str> {
    let caps = LINK_FAILURE.captures(dir_name)?;
    Some(caps.get(1)?.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(x: f64) -> ReportKey {
        ReportKey::number(x).unwrap()
    }

    #[test]
    fn t_percent_suffix() -> Result<()> {
        let s = KeyStrategy::PercentSuffix;
        assert_eq!(s.key_from_dir_name("run-10%", 1.)?, Some(num(0.1)));
        assert_eq!(s.key_from_dir_name("fat-tree-k4-25%", 1.)?, Some(num(0.25)));
        assert_eq!(s.key_from_dir_name("run-12.5%", 1.)?, Some(num(0.125)));
        assert_eq!(s.key_from_dir_name("run-5%", 100.)?, Some(num(5.)));
        assert_eq!(s.key_from_dir_name("run-10", 1.)?, None);
        assert_eq!(s.key_from_dir_name("run-10%-old", 1.)?, None);
        assert_eq!(s.key_from_dir_name("run-x%", 1.)?, None);
        assert_eq!(s.key_from_dir_name("10%", 1.)?, None);
        Ok(())
    }

    #[test]
    fn t_link_failure() -> Result<()> {
        let s = KeyStrategy::LinkFailurePrefix;
        assert_eq!(s.key_from_dir_name("link-failure-3", 1.)?, Some(num(3.)));
        assert_eq!(s.key_from_dir_name("sdn-link-failure-12", 1.)?, Some(num(12.)));
        assert_eq!(
            s.key_from_dir_name("link-failure-core", 1.)?,
            Some(ReportKey::Text(KString::from_static("core")))
        );
        assert_eq!(s.key_from_dir_name("link-failure-", 1.)?, None);
        assert_eq!(s.key_from_dir_name("node-failure-3", 1.)?, None);
        Ok(())
    }

    #[test]
    fn t_failed_links_is_not_name_based() -> Result<()> {
        assert!(!KeyStrategy::FailedLinks.is_name_based());
        assert_eq!(
            KeyStrategy::FailedLinks.key_from_dir_name("run-10%", 1.)?,
            None
        );
        Ok(())
    }

    #[test]
    fn t_ordering() {
        let mut keys = vec![
            ReportKey::Text(KString::from_static("b")),
            num(10.),
            ReportKey::Text(KString::from_static("a")),
            num(2.),
            num(0.25),
        ];
        keys.sort();
        let shown: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(shown, ["0.25", "2", "10", "a", "b"]);
        assert!(ReportKey::number(f64::NAN).is_err());
    }

    #[test]
    fn t_regexes() {
        lazy_static::initialize(&PERCENT_SUFFIX);
        lazy_static::initialize(&LINK_FAILURE);
        assert_eq!(percent_suffix("a-b-7%"), Some(7.));
        assert_eq!(link_failure_token("x-link-failure-a-b"), Some("a-b"));
    }

    #[test]
    fn t_strategy_from_str() {
        assert_eq!(
            KeyStrategy::from_str("percent-suffix"),
            Ok(KeyStrategy::PercentSuffix)
        );
        assert_eq!(
            KeyStrategy::from_str("link-failure-prefix"),
            Ok(KeyStrategy::LinkFailurePrefix)
        );
        assert_eq!(
            KeyStrategy::from_str("failed-links"),
            Ok(KeyStrategy::FailedLinks)
        );
        assert!(KeyStrategy::from_str("name").is_err());
    }
}
