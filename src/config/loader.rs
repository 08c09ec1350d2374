//! Loading the patch set: the built-in one or a TOML file given on the
//! command line. Every config is validated before it is returned.

use crate::config::schema::{PatchConfig, ValidationError};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Patch set shipped with the binary.
pub const BUILTIN_CONFIG: &str = include_str!("../../patches/classflow.toml");

/// Where a patch config came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    Builtin,
    Inline,
    File(PathBuf),
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigOrigin::Builtin => write!(f, "built-in patch set"),
            ConfigOrigin::Inline => write!(f, "patch config"),
            ConfigOrigin::File(path) => write!(f, "patch config {}", path.display()),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    /// The config file could not be read
    Read { path: PathBuf, source: io::Error },
    /// Not valid TOML, or does not fit the schema
    Parse {
        origin: ConfigOrigin,
        source: toml_edit::de::Error,
    },
    /// Parsed, but failed validation
    Invalid {
        origin: ConfigOrigin,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn origin(&self) -> ConfigOrigin {
        match self {
            ConfigError::Read { path, .. } => ConfigOrigin::File(path.clone()),
            ConfigError::Parse { origin, .. } | ConfigError::Invalid { origin, .. } => {
                origin.clone()
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "cannot read patch config {}: {source}", path.display())
            }
            ConfigError::Parse { origin, source } => {
                write!(f, "{origin} is not a valid patch list: {source}")
            }
            ConfigError::Invalid { origin, source } => {
                write!(f, "{origin} was rejected: {source}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Invalid { source, .. } => Some(source),
        }
    }
}

fn parse(input: &str, origin: ConfigOrigin) -> Result<PatchConfig, ConfigError> {
    let config: PatchConfig = match toml_edit::de::from_str(input) {
        Ok(config) => config,
        Err(source) => return Err(ConfigError::Parse { origin, source }),
    };
    match config.validate() {
        Ok(()) => Ok(config),
        Err(source) => Err(ConfigError::Invalid { origin, source }),
    }
}

/// Parse and validate a patch config held in memory.
pub fn load_from_str(input: &str) -> Result<PatchConfig, ConfigError> {
    parse(input, ConfigOrigin::Inline)
}

pub fn load_builtin() -> Result<PatchConfig, ConfigError> {
    parse(BUILTIN_CONFIG, ConfigOrigin::Builtin)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<PatchConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&contents, ConfigOrigin::File(path.to_path_buf()))
}

/// Load `path` when given, otherwise the built-in patch set.
pub fn load(path: Option<&Path>) -> Result<PatchConfig, ConfigError> {
    match path {
        Some(path) => load_from_path(path),
        None => load_builtin(),
    }
}
