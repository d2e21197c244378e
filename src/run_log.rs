//! Reading one run's log file and reducing it to scalars.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use anyhow::{Context, Result, anyhow};

use crate::{
    ctx, debug, info,
    stats::{SeriesSummary, Statistic, summarize},
    tagged_line::{Extractor, Keyword, TaggedExtractor},
    utillib::logging::{LogLevel, log_enabled},
};

/// The lines of a single log file. The file is read completely and
/// closed again by `read_file`.
#[derive(Debug)]
pub struct RunLog {
    path: Box<Path>,
    lines: Vec<String>,
}

impl RunLog {
    /// Invalid UTF-8 (e.g. from a crashed run) is replaced, and only
    /// affects the lines it is in.
    pub fn read_file(path: &Path) -> Result<Self> {
        let input = File::open(path).with_context(|| anyhow!("opening log file {path:?}"))?;
        let mut input = BufReader::new(input);

        let mut lines = Vec::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if input
                .read_until(b'\n', &mut buf)
                .map_err(ctx!("reading log file {path:?}"))?
                == 0
            {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            lines.push(line.trim_end_matches(['\n', '\r']).to_owned());
        }
        debug!("read {} lines from {path:?}", lines.len());

        Ok(Self {
            path: path.into(),
            lines,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn summarize_with<E: Extractor + ?Sized>(&self, extractor: &E) -> SeriesSummary {
        summarize(&self.lines, extractor)
    }

    /// Reduce the values found by `extractor` with `statistic`. At
    /// `--verbose` level, the entry count, total and average are
    /// logged, too.
    pub fn reduce_with<E: Extractor + ?Sized>(
        &self,
        extractor: &E,
        statistic: Statistic,
    ) -> Result<f64> {
        if log_enabled(LogLevel::Info) {
            let SeriesSummary {
                num_values,
                sum,
                mean,
                num_malformed,
            } = self.summarize_with(extractor);
            info!(
                "results for {:?} ({}): # entries = {num_values}, total = {sum}, \
                 average = {mean}, malformed = {num_malformed}",
                self.path,
                extractor.describe()
            );
        }
        statistic.reduce(&self.lines, extractor).with_context(|| {
            anyhow!(
                "computing the {statistic} of {} in {:?}",
                extractor.describe(),
                self.path
            )
        })
    }

    pub fn reduce(&self, keyword: &Keyword, statistic: Statistic) -> Result<f64> {
        self.reduce_with(&TaggedExtractor::new(keyword.clone()), statistic)
    }

    /// Failed links are always averaged, `latency_statistic` applies
    /// to the latency only.
    pub fn run_summary(&self, latency_statistic: Statistic) -> Result<RunSummary> {
        Ok(RunSummary {
            failed_links: self.reduce(&Keyword::FailedLinks, Statistic::Mean)?,
            latency: self.reduce(&Keyword::Latency, latency_statistic)?,
        })
    }
}

/// Scalars for one run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub failed_links: f64,
    pub latency: f64,
}

/// Read `path` and reduce the values found by `extractor`.
pub fn reduce_file<E: Extractor + ?Sized>(
    path: &Path,
    extractor: &E,
    statistic: Statistic,
) -> Result<f64> {
    RunLog::read_file(path)?.reduce_with(extractor, statistic)
}

pub fn average_latency(path: &Path) -> Result<f64> {
    RunLog::read_file(path)?.reduce(&Keyword::Latency, Statistic::Mean)
}

pub fn average_failed_links(path: &Path) -> Result<f64> {
    RunLog::read_file(path)?.reduce(&Keyword::FailedLinks, Statistic::Mean)
}

pub fn average_switches_with_violation(path: &Path) -> Result<f64> {
    RunLog::read_file(path)?.reduce(&Keyword::Switches, Statistic::Mean)
}

/// Both from a single read of `path`
pub fn failed_links_and_latency(path: &Path, latency_statistic: Statistic) -> Result<RunSummary> {
    RunLog::read_file(path)?.run_summary(latency_statistic)
}
