//! Tabulating a directory of experiment runs: one subdirectory per
//! run, each holding a log file (`all.log`), reduced to one
//! `(key, value)` entry per run and sorted by key.

pub mod run_key;

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use strum_macros::EnumString;
use walkdir::WalkDir;

pub use self::run_key::{KeyStrategy, ReportKey};
use crate::{
    ctx, debug, info,
    run_log::RunLog,
    stats::Statistic,
    tagged_line::Keyword,
    warn,
};

pub const DEFAULT_LOG_FILE_NAME: &str = "all.log";

/// What to do with a run whose log file can't be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "kebab_case")]
#[serde(rename_all = "kebab-case")]
pub enum MissingLogPolicy {
    /// Fail the whole aggregation
    #[default]
    Abort,
    /// Leave the run out of the report, with a warning
    Skip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregateOptions {
    /// How the value of each run is reduced
    pub statistic: Statistic,
    pub key_strategy: KeyStrategy,
    /// Multiplied into numeric keys
    pub key_scale: f64,
    /// Multiplied into the values
    pub value_scale: f64,
    /// The data lines the value is computed from
    pub value_keyword: Keyword,
    /// Name of the log file within each run directory
    pub log_file_name: String,
    pub missing_log: MissingLogPolicy,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            statistic: Statistic::Mean,
            key_strategy: KeyStrategy::PercentSuffix,
            key_scale: 1.,
            value_scale: 1.,
            value_keyword: Keyword::Latency,
            log_file_name: DEFAULT_LOG_FILE_NAME.into(),
            missing_log: MissingLogPolicy::Abort,
        }
    }
}

/// Values by key, iterated in ascending key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateReport {
    entries: BTreeMap<ReportKey, f64>,
}

impl AggregateReport {
    /// A key that is already present is overwritten; returns the
    /// previous value in that case.
    pub fn insert(&mut self, key: ReportKey, value: f64) -> Option<f64> {
        self.entries.insert(key, value)
    }

    pub fn get(&self, key: &ReportKey) -> Option<f64> {
        self.entries.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ReportKey, f64)> + '_ {
        self.entries.iter().map(|(key, value)| (key, *value))
    }
}

/// A subdirectory of the base directory
#[derive(Debug, Clone)]
pub struct RunDir {
    pub name: String,
    pub path: PathBuf,
}

/// The immediate subdirectories of `base_dir`, sorted by name. Files,
/// entries with non-UTF-8 names, and entries that can't be stat'ed
/// (e.g. dangling symlinks) are left out. Only failing to read
/// `base_dir` itself is an error.
pub fn list_run_dirs(base_dir: &Path) -> Result<Vec<RunDir>> {
    let mut run_dirs = Vec::new();
    for entry in WalkDir::new(base_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() > 0 => {
                debug!("ignoring unreadable entry {:?}: {e}", e.path());
                continue;
            }
            Err(e) => return Err(e).map_err(ctx!("listing run directories in {base_dir:?}")),
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            run_dirs.push(RunDir {
                name: name.to_owned(),
                path: entry.path().to_owned(),
            });
        } else {
            debug!("ignoring dir with non-UTF-8 name {:?}", entry.path());
        }
    }
    Ok(run_dirs)
}

/// The key and value for one run, or `None` if the run is left out.
/// Touches nothing but the run's own log file.
pub fn reduce_run(run_dir: &RunDir, options: &AggregateOptions) -> Result<Option<(ReportKey, f64)>> {
    let AggregateOptions {
        statistic,
        key_strategy,
        key_scale,
        value_scale,
        value_keyword,
        log_file_name,
        missing_log,
    } = options;

    let name_key = if key_strategy.is_name_based() {
        match key_strategy.key_from_dir_name(&run_dir.name, *key_scale)? {
            Some(key) => Some(key),
            None => {
                debug!(
                    "skipping {:?}: name does not match the {key_strategy} pattern",
                    run_dir.name
                );
                return Ok(None);
            }
        }
    } else {
        None
    };

    let log_path = run_dir.path.join(log_file_name);
    let run_log = match RunLog::read_file(&log_path) {
        Ok(run_log) => run_log,
        Err(e) => match missing_log {
            MissingLogPolicy::Abort => return Err(e),
            MissingLogPolicy::Skip => {
                warn!("skipping run {:?}: {e:#}", run_dir.name);
                return Ok(None);
            }
        },
    };

    let key = match name_key {
        Some(key) => key,
        None => ReportKey::number(
            run_log.reduce(&Keyword::FailedLinks, Statistic::Mean)? * key_scale,
        )?,
    };
    let value = run_log.reduce(value_keyword, *statistic)? * value_scale;
    Ok(Some((key, value)))
}

/// Reduce every run in `base_dir`. Runs are processed in name order,
/// so if two runs end up with the same key, the value of the one
/// with the later name is kept.
pub fn aggregate(base_dir: &Path, options: &AggregateOptions) -> Result<AggregateReport> {
    let mut report = AggregateReport::default();
    for run_dir in list_run_dirs(base_dir)? {
        let entry = reduce_run(&run_dir, options)
            .with_context(|| anyhow!("processing run directory {:?}", run_dir.path))?;
        if let Some((key, value)) = entry {
            if let Some(previous) = report.insert(key.clone(), value) {
                debug!(
                    "run {:?} replaces the value {previous} for key {key}",
                    run_dir.name
                );
            }
        }
    }
    info!(
        "{} entries from {base_dir:?} (key: {}, value: {} of {:?})",
        report.len(),
        options.key_strategy,
        options.statistic,
        options.value_keyword.as_str()
    );
    Ok(report)
}
