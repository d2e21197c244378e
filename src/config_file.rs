//! Generic config file loader, the format is chosen by the file
//! name extension.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use serde::{Serialize, de::DeserializeOwned};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigBackend {
    Json5,
    Yaml,
    Hcl,
}

impl ConfigBackend {
    pub fn load_config_file<T: DeserializeOwned>(self, path: &Path) -> Result<T> {
        let s = std::fs::read_to_string(path)
            .with_context(|| anyhow!("loading config file from {path:?}"))?;
        match self {
            ConfigBackend::Json5 => serde_json5::from_str(&s)
                .with_context(|| anyhow!("decoding JSON5 from config file {path:?}")),
            ConfigBackend::Yaml => serde_yml::from_str(&s)
                .with_context(|| anyhow!("decoding YAML from config file {path:?}")),
            ConfigBackend::Hcl => {
                hcl::from_str(&s).with_context(|| anyhow!("decoding HCL from config file {path:?}"))
            }
        }
    }

    pub fn save_config_file<T: Serialize>(self, path: &Path, value: &T) -> Result<()> {
        let s = match self {
            ConfigBackend::Json5 => {
                serde_json5::to_string(value).with_context(|| anyhow!("encoding config as JSON5"))?
            }
            ConfigBackend::Yaml => {
                serde_yml::to_string(value).with_context(|| anyhow!("encoding config as YAML"))?
            }
            ConfigBackend::Hcl => {
                hcl::to_string(value).with_context(|| anyhow!("encoding config as HCL"))?
            }
        };
        std::fs::write(path, s).with_context(|| anyhow!("writing config file to {path:?}"))
    }
}

pub const FILE_EXTENSIONS: &[(&str, ConfigBackend)] = &[
    ("json5", ConfigBackend::Json5),
    ("json", ConfigBackend::Json5),
    ("yml", ConfigBackend::Yaml),
    ("yaml", ConfigBackend::Yaml),
    ("hcl", ConfigBackend::Hcl),
];

pub fn backend_from_path(path: &Path) -> Result<ConfigBackend> {
    if let Some(ext) = path.extension() {
        if let Some(ext) = ext.to_str() {
            if let Some((_, backend)) = FILE_EXTENSIONS.iter().find(|(e, _b)| *e == ext) {
                Ok(*backend)
            } else {
                bail!("given file path does have an unknown extension {ext:?}: {path:?}")
            }
        } else {
            bail!("given file path does have an extension that is not unicode: {path:?}")
        }
    } else {
        bail!(
            "given file path does not have an extension \
             for determining the file type: {path:?}"
        )
    }
}

pub fn save_config_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let backend = backend_from_path(path)?;
    backend.save_config_file(path, value)
}

/// `foo/.bar` + `json5` -> `foo/.bar.json5`. None if `path` has no
/// file name.
fn add_extension(path: &Path, extension: &str) -> Option<PathBuf> {
    let mut file_name: OsString = path.file_name()?.to_owned();
    file_name.push(".");
    file_name.push(extension);
    Some(path.with_file_name(file_name))
}

pub trait LoadConfigFile: DeserializeOwned {
    /// One of the `FILE_EXTENSIONS` is appended to find the file.
    fn default_config_path_without_suffix() -> Result<Option<PathBuf>>;

    /// If `path` is given, the file must exist or an error is
    /// returned. Otherwise the default location
    /// (`default_config_path_without_suffix`) is checked with each
    /// of the file name extensions; if exactly one exists it is
    /// loaded, several are an error, and with none `or_else` is
    /// called with a message mentioning what was tried. It can
    /// return an error or a default config value.
    fn load_config<P: AsRef<Path>>(
        path: Option<P>,
        or_else: impl FnOnce(String) -> Result<Self>,
    ) -> Result<Self> {
        if let Some(path) = path {
            let path = path.as_ref();
            let backend = backend_from_path(path)?;
            backend.load_config_file(path)
        } else {
            if let Some(path) = Self::default_config_path_without_suffix()? {
                let path_and_backends: Vec<(PathBuf, ConfigBackend)> = FILE_EXTENSIONS
                    .iter()
                    .map(|(extension, backend)| -> Result<Option<_>> {
                        let path = add_extension(&path, extension)
                            .ok_or_else(|| anyhow!("path is missing a file name: {path:?}"))?;
                        if path.exists() {
                            Ok(Some((path, *backend)))
                        } else {
                            Ok(None)
                        }
                    })
                    .filter_map(|x| x.transpose())
                    .collect::<Result<_>>()?;
                match path_and_backends.as_slice() {
                    [] => or_else(format!(
                        "no file at the default location {path:?} with any of the \
                         extensions {:?}",
                        FILE_EXTENSIONS.iter().map(|(e, _)| e).collect::<Vec<_>>()
                    )),
                    [(path, backend)] => backend.load_config_file(path),
                    _ => {
                        let paths: Vec<&PathBuf> =
                            path_and_backends.iter().map(|(path, _)| path).collect();
                        bail!("multiple config file paths found, leading to ambiguity: {paths:?}")
                    }
                }
            } else {
                or_else(
                    "no path was given and there is no default \
                     config location for this type"
                        .into(),
                )
            }
        }
    }
}
