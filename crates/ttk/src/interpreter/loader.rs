//! Loading external templates for `INCLUDE`, `PROCESS`, `WRAPPER` and
//! `INSERT`.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;
use thiserror::Error;

/// Errors from a [`TemplateLoader`].
#[derive(Debug, Error)]
pub enum LoadError {
    /// Nothing exists at the path; the next include directory is tried.
    #[error("'{path}' not found")]
    NotFound { path: PathBuf },

    /// The file exists but could not be read.
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Source of external template text.
///
/// The engine asks for `dir/name` for each directory of the include path
/// in turn, stopping at the first result that is not
/// [`LoadError::NotFound`].
pub trait TemplateLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<String, LoadError>;
}

/// Reads templates from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemLoader;

impl TemplateLoader for FileSystemLoader {
    fn load(&self, path: &Path) -> Result<String, LoadError> {
        fs::read_to_string(path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                LoadError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                LoadError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })
    }
}

/// Serves templates from memory. `./` components are ignored, so a file
/// added as `header` is found through the default include path `.`.
///
/// ```
/// use std::path::Path;
/// use ttk::{MemoryLoader, TemplateLoader};
///
/// let loader = MemoryLoader::new().with_file("lib/header", "<h1>[% title %]</h1>");
/// assert!(loader.load(Path::new("./lib/header")).is_ok());
/// assert!(loader.load(Path::new("footer")).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: IndexMap<PathBuf, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, text: impl Into<String>) {
        self.files.insert(normalize(path.as_ref()), text.into());
    }
}

impl TemplateLoader for MemoryLoader {
    fn load(&self, path: &Path) -> Result<String, LoadError> {
        self.files
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| LoadError::NotFound {
                path: path.to_path_buf(),
            })
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
