//! Mean and percentile over the values an `Extractor` finds in a
//! sequence of lines.
//!
//! Lines that are not data lines, and data lines whose value does not
//! parse, are skipped. A mean over no values is `0`. A percentile
//! over no values is an error (`StatsError::NoInputs`).

pub mod percentile;

use std::{fmt::Display, str::FromStr};

use anyhow::{anyhow, bail};

pub use self::percentile::Percentile;
use crate::{
    debug,
    tagged_line::{Extractor, ParsedLine},
};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum StatsError {
    #[error("no inputs given")]
    NoInputs,
}

/// Calls `f` for each value, in line order. Returns the number of
/// malformed data lines that were skipped.
pub fn for_each_value<L: AsRef<str>, E: Extractor + ?Sized>(
    lines: impl IntoIterator<Item = L>,
    extractor: &E,
    mut f: impl FnMut(i64),
) -> usize {
    let mut num_malformed = 0;
    for line in lines {
        match extractor.parse_line(line.as_ref()) {
            ParsedLine::NotData => (),
            ParsedLine::Malformed => num_malformed += 1,
            ParsedLine::Value(value) => f(value),
        }
    }
    if num_malformed > 0 {
        debug!(
            "skipped {num_malformed} malformed lines with {}",
            extractor.describe()
        );
    }
    num_malformed
}

/// The series of values, in line order
pub fn collect_values<L: AsRef<str>, E: Extractor + ?Sized>(
    lines: impl IntoIterator<Item = L>,
    extractor: &E,
) -> Vec<i64> {
    let mut vals = Vec::new();
    for_each_value(lines, extractor, |value| vals.push(value));
    vals
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesSummary {
    pub num_values: usize,
    pub sum: i128,
    /// 0 if `num_values` is 0
    pub mean: f64,
    pub num_malformed: usize,
}

pub fn summarize<L: AsRef<str>, E: Extractor + ?Sized>(
    lines: impl IntoIterator<Item = L>,
    extractor: &E,
) -> SeriesSummary {
    let mut num_values: usize = 0;
    let mut sum: i128 = 0;
    let num_malformed = for_each_value(lines, extractor, |value| {
        num_values += 1;
        sum += i128::from(value);
    });
    let mean = if num_values == 0 {
        0.
    } else {
        sum as f64 / num_values as f64
    };
    SeriesSummary {
        num_values,
        sum,
        mean,
        num_malformed,
    }
}

/// Exactly `0.` if there are no values.
pub fn mean<L: AsRef<str>, E: Extractor + ?Sized>(
    lines: impl IntoIterator<Item = L>,
    extractor: &E,
) -> f64 {
    summarize(lines, extractor).mean
}

pub fn percentile<L: AsRef<str>, E: Extractor + ?Sized>(
    lines: impl IntoIterator<Item = L>,
    extractor: &E,
    p: Percentile,
) -> Result<f64, StatsError> {
    percentile_of_values(collect_values(lines, extractor), p)
}

/// Linear interpolation between the two closest ranks of the sorted
/// values: rank `p/100 * (n-1)`. (Needs to own `vals` for sorting.)
pub fn percentile_of_values(mut vals: Vec<i64>, p: Percentile) -> Result<f64, StatsError> {
    if vals.is_empty() {
        return Err(StatsError::NoInputs);
    }
    vals.sort_unstable();

    let rank = p.fraction() * (vals.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let (a, b) = (vals[lower] as f64, vals[upper] as f64);
    Ok(a + (b - a) * (rank - lower as f64))
}

/// How to reduce a series to a single number
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Statistic {
    #[default]
    Mean,
    Percentile(Percentile),
}

impl Statistic {
    pub fn reduce<L: AsRef<str>, E: Extractor + ?Sized>(
        self,
        lines: impl IntoIterator<Item = L>,
        extractor: &E,
    ) -> Result<f64, StatsError> {
        match self {
            Statistic::Mean => Ok(mean(lines, extractor)),
            Statistic::Percentile(p) => percentile(lines, extractor, p),
        }
    }
}

impl Display for Statistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Statistic::Mean => f.write_str("mean"),
            Statistic::Percentile(p) => write!(f, "p{p}"),
        }
    }
}

impl FromStr for Statistic {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean" | "Mean" | "average" | "Average" | "avg" => Ok(Statistic::Mean),
            "median" | "Median" => Ok(Statistic::Percentile(Percentile::MEDIAN)),
            _ => {
                let number = s
                    .strip_prefix('p')
                    .or_else(|| s.strip_prefix('P'))
                    .unwrap_or(s);
                match Percentile::from_str(number) {
                    Ok(p) => Ok(Statistic::Percentile(p)),
                    Err(e) => bail!(
                        "expecting one of mean|average|median, p<N> or a number \
                         between 0 and 100, got {s:?}: {e}"
                    ),
                }
            }
        }
    }
}

impl TryFrom<String> for Statistic {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .parse()
            .map_err(|e| anyhow!("invalid statistic: {e:#}"))
    }
}

impl From<Statistic> for String {
    fn from(value: Statistic) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;
    use crate::tagged_line::{Keyword, TaggedExtractor, UntaggedExtractor};

    fn latency() -> TaggedExtractor {
        TaggedExtractor::new(Keyword::Latency)
    }

    fn latency_lines(vals: &[i64]) -> Vec<String> {
        vals.iter()
            .map(|v| format!("### DATA ### latency +++ {v}"))
            .collect()
    }

    #[test]
    fn t_mean_of_nothing() {
        let no_lines: [&str; 0] = [];
        assert_eq!(mean(no_lines, &latency()), 0.);
        let noise = [
            "starting simulation",
            "### DATA ### failed links +++ 3",
            "### DATA ### latency +++ garbage",
        ];
        assert_eq!(mean(noise, &latency()), 0.);
    }

    #[test]
    fn t_mean() {
        let lines = latency_lines(&[23, 4, 8, 30, 7]);
        assert_eq!(mean(&lines, &latency()), 14.4);

        let mut lines = latency_lines(&[1, 2]);
        lines.push("### DATA ### latency +++ notanumber".into());
        lines.push("### DATA ### failed links +++ 100".into());
        assert_eq!(mean(&lines, &latency()), 1.5);
    }

    #[test]
    fn t_summary() {
        let mut lines = latency_lines(&[10, 20, 40]);
        lines.push("### DATA ### latency +++".into());
        let summary = summarize(&lines, &latency());
        assert_eq!(
            summary,
            SeriesSummary {
                num_values: 3,
                sum: 70,
                mean: 70. / 3.,
                num_malformed: 1,
            }
        );
    }

    #[test]
    fn t_median() -> Result<()> {
        let lines = latency_lines(&[4, 1, 3, 2]);
        assert_eq!(percentile(&lines, &latency(), Percentile::MEDIAN)?, 2.5);
        let lines = latency_lines(&[3, 1, 2]);
        assert_eq!(percentile(&lines, &latency(), Percentile::MEDIAN)?, 2.);
        Ok(())
    }

    #[test]
    fn t_percentile_interpolation() -> Result<()> {
        let vals = vec![15, 20, 35, 40, 50];
        assert_eq!(percentile_of_values(vals.clone(), Percentile::MIN)?, 15.);
        assert_eq!(percentile_of_values(vals.clone(), Percentile::MAX)?, 50.);
        assert_eq!(percentile_of_values(vals.clone(), Percentile::new(25.)?)?, 20.);
        // rank 0.375 * 4 = 1.5
        assert_eq!(percentile_of_values(vals.clone(), Percentile::new(37.5)?)?, 27.5);
        // rank 0.875 * 4 = 3.5
        assert_eq!(percentile_of_values(vals, Percentile::new(87.5)?)?, 45.);
        assert_eq!(percentile_of_values(vec![7], Percentile::new(33.)?)?, 7.);
        Ok(())
    }

    #[test]
    fn t_percentile_of_nothing() {
        let lines = ["### DATA ### latency +++ x"];
        assert_eq!(
            percentile(lines, &latency(), Percentile::MEDIAN),
            Err(StatsError::NoInputs)
        );
    }

    #[test]
    fn t_untagged() {
        assert_eq!(mean(["1", "2", "", "6"], &UntaggedExtractor), 3.);
    }

    #[test]
    fn t_statistic() -> Result<()> {
        assert_eq!(Statistic::from_str("mean")?, Statistic::Mean);
        assert_eq!(Statistic::from_str("average")?, Statistic::Mean);
        assert_eq!(
            Statistic::from_str("median")?,
            Statistic::Percentile(Percentile::MEDIAN)
        );
        assert_eq!(
            Statistic::from_str("p95")?,
            Statistic::Percentile(Percentile::new(95.)?)
        );
        assert_eq!(
            Statistic::from_str("99.9")?,
            Statistic::Percentile(Percentile::new(99.9)?)
        );
        assert!(Statistic::from_str("p101").is_err());
        assert!(Statistic::from_str("max").is_err());
        assert_eq!(Statistic::Percentile(Percentile::new(95.)?).to_string(), "p95");

        let lines = latency_lines(&[1, 2, 3, 10]);
        assert_eq!(Statistic::Mean.reduce(&lines, &latency())?, 4.);
        assert_eq!(
            Statistic::Percentile(Percentile::MAX).reduce(&lines, &latency())?,
            10.
        );
        Ok(())
    }
}
