//! Filesystem access for one generation run.
//!
//! Every path handed to an [`OutputWriter`] is relative to the run's
//! destination directory. Writes truncate; directory creation is idempotent.
//!
//! Rendered assets are published with [`symlink_or_copy`]: a symlink back into
//! the render cache where the platform allows it, a full copy otherwise.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// How rendered assets are placed in the output tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementMode {
    /// Symlink into the render cache, falling back to a copy.
    #[default]
    Symlink,
    /// Always copy, for a self-contained output directory.
    Copy,
}

/// Writes files below a fixed destination root.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    root: PathBuf,
    placement: PlacementMode,
}

impl OutputWriter {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            placement: PlacementMode::default(),
        }
    }

    pub fn with_placement(mut self, placement: PlacementMode) -> Self {
        self.placement = placement;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn placement(&self) -> PlacementMode {
        self.placement
    }

    /// Absolute path of `relative` below the root. `/` separators in
    /// `relative` are accepted on every platform; empty and `.` parts are
    /// skipped. `..`, drive prefixes and anything else that could leave the
    /// root is rejected with `InvalidInput`.
    pub fn resolve(&self, relative: &str) -> io::Result<PathBuf> {
        let mut path = self.root.clone();
        for part in relative.split('/').filter(|p| !p.is_empty() && *p != ".") {
            let mut components = Path::new(part).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(name)), None) if name == part => path.push(name),
                _ => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("{relative:?} does not stay below {}", self.root.display()),
                    ));
                }
            }
        }
        Ok(path)
    }

    pub fn write_file(&self, relative: &str, content: &str) -> io::Result<()> {
        self.write_bytes(relative, content.as_bytes())
    }

    pub fn write_bytes(&self, relative: &str, bytes: &[u8]) -> io::Result<()> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)
    }

    /// Place `source` (an absolute path outside the output tree) at
    /// `relative`, using the writer's placement mode.
    pub fn symlink_file(&self, source: &Path, relative: &str) -> io::Result<()> {
        symlink_or_copy(source, &self.resolve(relative)?, self.placement)
    }

    /// Create a directory and its parents. Existing directories are fine.
    pub fn make_directory(&self, relative: &str) -> io::Result<()> {
        match fs::create_dir_all(self.resolve(relative)?) {
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            other => other,
        }
    }
}

/// Replace whatever is at `dest` with a link to (or copy of) `source`.
pub fn symlink_or_copy(source: &Path, dest: &Path, mode: PlacementMode) -> io::Result<()> {
    match fs::symlink_metadata(dest) {
        Ok(meta) if meta.is_dir() => {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} is a directory", dest.display()),
            ));
        }
        Ok(_) => fs::remove_file(dest)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    if mode == PlacementMode::Symlink && try_symlink(source, dest) {
        return Ok(());
    }
    fs::copy(source, dest)?;
    Ok(())
}

#[cfg(unix)]
fn try_symlink(source: &Path, dest: &Path) -> bool {
    match std::os::unix::fs::symlink(source, dest) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(error = %e, dest = %dest.display(), "symlink failed, copying");
            false
        }
    }
}

#[cfg(not(unix))]
fn try_symlink(_source: &Path, _dest: &Path) -> bool {
    false
}
