//! The `simlog-eval` configuration file, holding defaults for the
//! `collect` subcommand. Options given on the command line take
//! precedence.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{aggregate::AggregateOptions, config_file::LoadConfigFile};

pub const DEFAULT_CONFIG_FILE_NAME_WITHOUT_SUFFIX: &str = ".simlog-eval";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimlogConfig {
    #[serde(default)]
    pub collect: AggregateOptions,
}

impl LoadConfigFile for SimlogConfig {
    fn default_config_path_without_suffix() -> Result<Option<PathBuf>> {
        Ok(std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(DEFAULT_CONFIG_FILE_NAME_WITHOUT_SUFFIX)))
    }
}
