// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};

use hf_render::RenderError;
use hf_theme::InvalidConfiguration;

use crate::package::PackageError;

/// Anything that stops one theme (or one command) short.
///
/// Validation findings are not errors; they travel as issues.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse theme {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: hf_theme::LoadError,
    },
    #[error("theme {} extends {base:?}, which was not found next to it", path.display())]
    MissingBase { path: PathBuf, base: String },
    #[error("theme {} extends {base:?}, which is itself a variant; only one level is supported", path.display())]
    NestedVariant { path: PathBuf, base: String },
    #[error("no theme named {name:?} in {}", dir.display())]
    ThemeNotFound { name: String, dir: PathBuf },
    #[error("{} already exists", path.display())]
    AlreadyExists { path: PathBuf },
    #[error("{name:?} is not a valid theme name (try {suggestion:?})")]
    InvalidName { name: String, suggestion: String },
    #[error("cannot serialize theme: {0}")]
    Serialize(#[from] serde_yaml::Error),
    #[error(transparent)]
    Config(#[from] InvalidConfiguration),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Package(#[from] PackageError),
    #[error("cannot start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl BuildError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
