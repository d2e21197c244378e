use std::{
    io::{IsTerminal, Write, stdout},
    path::{Path, PathBuf},
};

use anyhow::{Result, bail};
use clap::Parser;

use simlog_eval::{
    aggregate::{AggregateOptions, KeyStrategy, MissingLogPolicy, aggregate},
    config::SimlogConfig,
    config_file::{FILE_EXTENSIONS, LoadConfigFile, save_config_file},
    debug,
    get_terminal_width::get_terminal_width,
    output_table::{ReportFormat, write_report},
    run_log::{RunLog, reduce_file},
    stats::{Percentile, Statistic},
    tagged_line::{Extractor, Keyword, TaggedExtractor, UntaggedExtractor},
    utillib::logging::{LogLevelOpts, set_log_level},
};

const PROGRAM_NAME: &str = "simlog-eval";
const SIMLOG_EVAL_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(clap::Parser, Debug)]
#[command(
    next_line_help = true,
    term_width = get_terminal_width(4),
    bin_name = PROGRAM_NAME,
)]
/// Compute statistics over the `### DATA ###` lines in simulation
/// logs, for single log files or across a directory of experiment
/// runs.
struct Opts {
    #[clap(flatten)]
    log_level: LogLevelOpts,

    /// Override the path to the config file (default: the paths
    /// `~/.simlog-eval.*` where a single one exists where the `*` is
    /// the suffix for one of the supported config file formats (run
    /// `config-formats` to get the list), and if those are missing,
    /// use compiled-in default config values)
    #[clap(long)]
    config: Option<PathBuf>,

    /// The subcommand to run. Use `--help` after the sub-command to
    /// get a list of the allowed options there.
    #[clap(subcommand)]
    subcommand: SubCommand,
}

#[derive(clap::Args, Debug)]
struct FilterOpts {
    /// Which data lines to use: latency, failed-links, switches, or
    /// any other text that the lines contain
    #[clap(short, long, default_value = "latency")]
    keyword: Keyword,

    /// The file has one bare number per line and no `### DATA ###`
    /// tags (`--keyword` is ignored)
    #[clap(long)]
    untagged: bool,
}

impl FilterOpts {
    fn extractor(self) -> Box<dyn Extractor> {
        let Self { keyword, untagged } = self;
        if untagged {
            Box::new(UntaggedExtractor)
        } else {
            Box::new(TaggedExtractor::new(keyword))
        }
    }
}

#[derive(clap::Args, Debug)]
struct CollectOpts {
    /// How to reduce the values of each run: mean, median, p<N>, or a
    /// number between 0 and 100 for that percentile (default: mean)
    #[clap(short, long)]
    statistic: Option<Statistic>,

    /// Same as `--statistic p<N>`
    #[clap(short, long, conflicts_with = "statistic")]
    percentile: Option<Percentile>,

    /// How the key of a run is found: percent-suffix (`run-10%` ->
    /// 0.1), link-failure-prefix (`link-failure-3` -> 3), or
    /// failed-links (the mean of the run's "failed links" values)
    #[clap(short, long)]
    key: Option<KeyStrategy>,

    /// Factor applied to numeric keys
    #[clap(long)]
    key_scale: Option<f64>,

    /// Factor applied to the values
    #[clap(long)]
    value_scale: Option<f64>,

    /// Which data lines the values come from (default: latency)
    #[clap(long)]
    value_keyword: Option<Keyword>,

    /// Name of the log file in each run directory (default: all.log)
    #[clap(long)]
    log_file: Option<String>,

    /// Leave out runs whose log file can't be read, instead of
    /// failing
    #[clap(long)]
    skip_missing: bool,
}

impl CollectOpts {
    /// Override the values from the config file
    fn apply(self, options: &mut AggregateOptions) {
        let Self {
            statistic,
            percentile,
            key,
            key_scale,
            value_scale,
            value_keyword,
            log_file,
            skip_missing,
        } = self;
        if let Some(statistic) = statistic {
            options.statistic = statistic;
        }
        if let Some(percentile) = percentile {
            options.statistic = Statistic::Percentile(percentile);
        }
        if let Some(key) = key {
            options.key_strategy = key;
        }
        if let Some(key_scale) = key_scale {
            options.key_scale = key_scale;
        }
        if let Some(value_scale) = value_scale {
            options.value_scale = value_scale;
        }
        if let Some(value_keyword) = value_keyword {
            options.value_keyword = value_keyword;
        }
        if let Some(log_file) = log_file {
            options.log_file_name = log_file;
        }
        if skip_missing {
            options.missing_log = MissingLogPolicy::Skip;
        }
    }
}

#[derive(clap::Args, Debug)]
struct OutputOpts {
    /// Show an aligned table with a title row instead of plain
    /// `key value` lines
    #[clap(long)]
    table: bool,

    /// Show the table as TSV (with '\t' as separator)
    #[clap(long, conflicts_with = "table")]
    tsv: bool,
}

impl OutputOpts {
    fn format(&self) -> ReportFormat {
        let Self { table, tsv } = self;
        if *tsv {
            ReportFormat::Tsv
        } else if *table {
            ReportFormat::Table {
                color: stdout().is_terminal(),
            }
        } else {
            ReportFormat::Plain
        }
    }
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Print version
    Version,

    /// Show the supported config format types.
    ConfigFormats,

    /// Re-encode the effective configuration (serialization type
    /// determined by file extension) and save at the given path.
    ConfigSave { output_path: PathBuf },

    /// Print the mean of the values in a log file (0 if there are
    /// none)
    Mean {
        path: PathBuf,
        #[clap(flatten)]
        filter: FilterOpts,
    },

    /// Print a percentile of the values in a log file, interpolated
    /// between the closest ranks
    Percentile {
        path: PathBuf,
        /// Between 0 and 100
        percentile: Percentile,
        #[clap(flatten)]
        filter: FilterOpts,
    },

    /// Print the mean control latency of a log file
    Latency { path: PathBuf },

    /// Print the mean number of failed links of a log file
    FailedLinks { path: PathBuf },

    /// Print the mean number of switches with violation of a log file
    Switches { path: PathBuf },

    /// Print the mean number of failed links and the latency of a log
    /// file, separated by a space
    Run {
        path: PathBuf,
        /// How to reduce the latency values: mean, median, p<N>
        #[clap(short, long, default_value = "mean")]
        statistic: Statistic,
    },

    /// Reduce the log file of every run directory in `base_dir`, and
    /// print one `key value` pair per run, sorted by key. If several
    /// runs end up with the same key, the value of the one with the
    /// (lexicographically) last directory name is shown.
    Collect {
        base_dir: PathBuf,
        #[clap(flatten)]
        collect_opts: CollectOpts,
        #[clap(flatten)]
        output_opts: OutputOpts,
    },
}

fn print_scalar(value: f64) -> Result<()> {
    let mut out = stdout().lock();
    writeln!(&mut out, "{value}")?;
    Ok(())
}

fn reduce_keyword(path: &Path, keyword: Keyword) -> Result<f64> {
    RunLog::read_file(path)?.reduce(&keyword, Statistic::Mean)
}

fn main() -> Result<()> {
    let Opts {
        log_level,
        config,
        subcommand,
    } = Opts::parse();
    set_log_level(log_level.try_into()?);

    let load_config = || {
        SimlogConfig::load_config(config.as_ref(), |msg| {
            debug!("using default config: {msg}");
            Ok(SimlogConfig::default())
        })
    };

    match subcommand {
        SubCommand::Version => println!("{PROGRAM_NAME} version {SIMLOG_EVAL_VERSION}"),
        SubCommand::ConfigFormats => {
            println!("These configuration file formats are supported, by file extension:");
            for (extension, backend) in FILE_EXTENSIONS {
                println!("  .{extension:6} {backend:?}");
            }
        }
        SubCommand::ConfigSave { output_path } => {
            let config = load_config()?;
            save_config_file(&output_path, &config)?;
        }
        SubCommand::Mean { path, filter } => {
            let extractor = filter.extractor();
            print_scalar(reduce_file(&path, &*extractor, Statistic::Mean)?)?;
        }
        SubCommand::Percentile {
            path,
            percentile,
            filter,
        } => {
            let extractor = filter.extractor();
            print_scalar(reduce_file(
                &path,
                &*extractor,
                Statistic::Percentile(percentile),
            )?)?;
        }
        SubCommand::Latency { path } => print_scalar(reduce_keyword(&path, Keyword::Latency)?)?,
        SubCommand::FailedLinks { path } => {
            print_scalar(reduce_keyword(&path, Keyword::FailedLinks)?)?
        }
        SubCommand::Switches { path } => print_scalar(reduce_keyword(&path, Keyword::Switches)?)?,
        SubCommand::Run { path, statistic } => {
            let summary = RunLog::read_file(&path)?.run_summary(statistic)?;
            let mut out = stdout().lock();
            writeln!(&mut out, "{} {}", summary.failed_links, summary.latency)?;
        }
        SubCommand::Collect {
            base_dir,
            collect_opts,
            output_opts,
        } => {
            if !base_dir.is_dir() {
                bail!("not a directory: {base_dir:?}")
            }
            let mut options = load_config()?.collect;
            collect_opts.apply(&mut options);
            let report = aggregate(&base_dir, &options)?;

            let key_title = match options.key_strategy {
                KeyStrategy::PercentSuffix => "fraction",
                KeyStrategy::LinkFailurePrefix => "link failure",
                KeyStrategy::FailedLinks => "failed links",
            };
            let value_title = format!("{} {}", options.value_keyword, options.statistic);
            let mut out = stdout().lock();
            write_report(&report, output_opts.format(), key_title, &value_title, &mut out)?;
            out.flush()?;
        }
    }

    Ok(())
}
