//! Errors raised while reading or validating rewind configuration.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("cannot read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not valid TOML, or a value has the wrong shape. An unknown
    /// `window.start` lands here.
    #[error("cannot parse config file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A value deserialized but cannot drive a resolution.
    #[error("invalid `{key}`: {reason}")]
    Invalid {
        key: &'static str,
        reason: &'static str,
    },
}
