//! Request path confinement
//!
//! Clients name audio files by path. With an audio root configured, a path
//! is only served when it resolves (after following symlinks) to a location
//! inside that directory; relative paths are taken relative to the root.

use std::path::{Component, Path, PathBuf};

use crate::error::{ApiError, ApiResult, Error, Result};

/// Directory request paths are confined to, if any
#[derive(Debug, Clone, Default)]
pub struct AudioRoot {
    root: Option<PathBuf>,
}

impl AudioRoot {
    /// Accept any path the process can read
    pub fn unrestricted() -> Self {
        Self { root: None }
    }

    /// Confine requests to `dir`, which must be an existing directory
    pub fn new(dir: &Path) -> Result<Self> {
        let root = dir.canonicalize().map_err(|e| {
            Error::Common(voxify_common::Error::Config(format!(
                "audio_root {}: {}",
                dir.display(),
                e
            )))
        })?;
        if !root.is_dir() {
            return Err(Error::Common(voxify_common::Error::Config(format!(
                "audio_root {} is not a directory",
                root.display()
            ))));
        }
        Ok(Self { root: Some(root) })
    }

    pub fn path(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Map a requested path to the file to open
    ///
    /// Paths outside the root are refused the same way whether or not they
    /// exist. A path inside the root that does not exist is passed through
    /// and fails later as undecodable audio.
    pub fn resolve(&self, requested: &Path) -> ApiResult<PathBuf> {
        let Some(root) = &self.root else {
            return Ok(requested.to_path_buf());
        };

        let not_allowed =
            || ApiError::Forbidden("path is outside the audio directory".to_string());
        if requested
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(not_allowed());
        }

        let candidate = root.join(requested);
        match candidate.canonicalize() {
            Ok(real) if real.starts_with(root) => Ok(real),
            Ok(_) => Err(not_allowed()),
            Err(_) if candidate.starts_with(root) => Ok(candidate),
            Err(_) => Err(not_allowed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn root_with_file() -> (TempDir, AudioRoot) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.wav"), b"x").unwrap();
        let root = AudioRoot::new(dir.path()).unwrap();
        (dir, root)
    }

    #[test]
    fn test_unrestricted_passes_paths_through() {
        let root = AudioRoot::unrestricted();
        assert_eq!(
            root.resolve(Path::new("/etc/hostname")).unwrap(),
            PathBuf::from("/etc/hostname")
        );
    }

    #[test]
    fn test_relative_and_absolute_paths_inside_root() {
        let (dir, root) = root_with_file();
        let expected = dir.path().canonicalize().unwrap().join("a.wav");

        assert_eq!(root.resolve(Path::new("a.wav")).unwrap(), expected);
        assert_eq!(root.resolve(&expected).unwrap(), expected);
    }

    #[test]
    fn test_outside_paths_refused_whether_or_not_they_exist() {
        let (_dir, root) = root_with_file();
        let outside = TempDir::new().unwrap();
        let existing = outside.path().join("b.wav");
        std::fs::write(&existing, b"x").unwrap();

        for path in [existing, outside.path().join("missing.wav")] {
            assert!(matches!(root.resolve(&path), Err(ApiError::Forbidden(_))));
        }
    }

    #[test]
    fn test_parent_components_refused() {
        let (_dir, root) = root_with_file();
        let result = root.resolve(Path::new("../a.wav"));
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[test]
    fn test_missing_file_inside_root_passes_through() {
        let (dir, root) = root_with_file();
        let resolved = root.resolve(Path::new("later.wav")).unwrap();
        assert!(resolved.starts_with(dir.path().canonicalize().unwrap()));
    }

    #[test]
    fn test_root_must_be_a_directory() {
        let (dir, _root) = root_with_file();
        assert!(AudioRoot::new(&dir.path().join("a.wav")).is_err());
        assert!(AudioRoot::new(&dir.path().join("nope")).is_err());
    }
}
