//! Error types for template resolution and merging

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while resolving or applying templates
#[derive(Error, Debug)]
pub enum SkeletonError {
    #[error("Template '{name}' not found in search path ({} roots searched)", search_path.len())]
    TemplateNotFound {
        name: String,
        search_path: Vec<PathBuf>,
    },

    #[error("Template '{template}' cannot be merged: {} conflicts with an existing entry", path.display())]
    CannotMerge { template: String, path: PathBuf },

    #[error("No template given")]
    NoTemplates,

    #[error("Invalid variable '{0}' - expected KEY=VALUE")]
    InvalidVariable(String),

    #[error("Invalid variables file {}: {source}", path.display())]
    InvalidSkelvars {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SkeletonError>;

/// Attach a path to an io::Error, for use with `map_err`
pub(crate) fn io_error(path: &Path) -> impl FnOnce(io::Error) -> SkeletonError + '_ {
    move |source| SkeletonError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl From<walkdir::Error> for SkeletonError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        let source = err
            .into_io_error()
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "filesystem loop detected"));
        SkeletonError::Io { path, source }
    }
}
