//! Template objects
//!
//! One object per entry found in a template: a directory to create or a file
//! to write or merge. Objects borrow the variable set of the apply they belong
//! to, so a base template and its extensions resolve names and contents with
//! the same values.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{io_error, Result};
use crate::imports::{extract_imports, is_importable, merge_imports};
use crate::merge::{block_marker, inject_at_marker, split_merge_method, MergeMethod};
use crate::variables::{is_binary_file, Variables};

/// Kind of a template entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Directory,
    File,
}

/// Unbound description of a template entry: where it lives, not yet tied to
/// any variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSpec {
    pub kind: ObjectKind,
    /// Template root the entry is read from
    pub root: PathBuf,
    /// Path relative to `root`, possibly containing variable tokens
    pub relative: PathBuf,
}

impl ObjectSpec {
    pub fn directory(root: impl Into<PathBuf>, relative: impl Into<PathBuf>) -> Self {
        Self {
            kind: ObjectKind::Directory,
            root: root.into(),
            relative: relative.into(),
        }
    }

    pub fn file(root: impl Into<PathBuf>, relative: impl Into<PathBuf>) -> Self {
        Self {
            kind: ObjectKind::File,
            root: root.into(),
            relative: relative.into(),
        }
    }

    /// Tie this entry to a variable set
    pub fn bind<'a>(&self, vars: &'a Variables) -> TemplateObject<'a> {
        match self.kind {
            ObjectKind::Directory => TemplateObject::Directory(DirectoryObject {
                root: self.root.clone(),
                relative: self.relative.clone(),
                vars,
            }),
            ObjectKind::File => TemplateObject::File(FileObject::new(&self.root, &self.relative, vars)),
        }
    }
}

/// Substitute variables in each component of a relative path
fn substitute_path(relative: &Path, vars: &Variables) -> PathBuf {
    let mut out = PathBuf::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => out.push(vars.substitute(&part.to_string_lossy())),
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// A directory entry of a template
#[derive(Debug, Clone)]
pub struct DirectoryObject<'a> {
    root: PathBuf,
    relative: PathBuf,
    vars: &'a Variables,
}

impl DirectoryObject<'_> {
    pub fn relative(&self) -> &Path {
        &self.relative
    }

    pub fn source_path(&self) -> PathBuf {
        self.root.join(&self.relative)
    }

    pub fn target_path(&self, target: &Path) -> PathBuf {
        target.join(substitute_path(&self.relative, self.vars))
    }

    /// Invalid when something other than a directory already sits there
    pub fn is_valid(&self, target: &Path) -> bool {
        let path = self.target_path(target);
        !path.exists() || path.is_dir()
    }

    pub fn has_effect(&self, target: &Path) -> bool {
        !self.target_path(target).exists()
    }

    pub fn merge(&self, target: &Path) -> Result<()> {
        let path = self.target_path(target);
        if !path.exists() {
            fs::create_dir(&path).map_err(io_error(&path))?;
            tracing::debug!("Created directory {}", path.display());
        }
        Ok(())
    }
}

/// A file entry of a template
#[derive(Debug, Clone)]
pub struct FileObject<'a> {
    root: PathBuf,
    relative: PathBuf,
    /// `relative` with the merge tag removed from the file name
    clean_relative: PathBuf,
    merge_method: MergeMethod,
    vars: &'a Variables,
}

impl<'a> FileObject<'a> {
    pub fn new(root: &Path, relative: &Path, vars: &'a Variables) -> Self {
        let file_name = relative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (clean_name, merge_method) = split_merge_method(&file_name);

        Self {
            root: root.to_path_buf(),
            relative: relative.to_path_buf(),
            clean_relative: relative.with_file_name(clean_name),
            merge_method,
            vars,
        }
    }

    pub fn relative(&self) -> &Path {
        &self.relative
    }

    pub fn merge_method(&self) -> &MergeMethod {
        &self.merge_method
    }

    pub fn source_path(&self) -> PathBuf {
        self.root.join(&self.relative)
    }

    pub fn target_path(&self, target: &Path) -> PathBuf {
        target.join(substitute_path(&self.clean_relative, self.vars))
    }

    /// Invalid when a directory already sits there
    pub fn is_valid(&self, target: &Path) -> bool {
        !self.target_path(target).is_dir()
    }

    pub fn has_effect(&self, _target: &Path) -> bool {
        true
    }

    pub fn merge(&self, target: &Path) -> Result<()> {
        let path = self.target_path(target);
        let source = self.source_path();
        let raw = fs::read(&source).map_err(io_error(&source))?;

        let text = match std::str::from_utf8(&raw) {
            Ok(text) if !is_binary_file(&raw) => text,
            _ => {
                fs::write(&path, &raw).map_err(io_error(&path))?;
                tracing::debug!("Copied binary file {}", path.display());
                return Ok(());
            }
        };

        let content = self.vars.substitute(text);

        if self.merge_method == MergeMethod::Overwrite || !path.exists() {
            fs::write(&path, content).map_err(io_error(&path))?;
            tracing::debug!("Wrote {}", path.display());
            return Ok(());
        }

        let existing = fs::read_to_string(&path).map_err(io_error(&path))?;
        let merged = if is_importable(&path) {
            let (body, imports) = extract_imports(&content);
            merge_imports(&self.combine(&existing, &body), &imports)
        } else {
            self.combine(&existing, &content)
        };

        fs::write(&path, merged).map_err(io_error(&path))?;
        tracing::debug!("Merged {} into {} ({})", source.display(), path.display(), self.merge_method);
        Ok(())
    }

    /// Combine new content with the existing target content
    fn combine(&self, existing: &str, content: &str) -> String {
        match &self.merge_method {
            MergeMethod::Overwrite => content.to_string(),
            MergeMethod::Append => format!("{}\n{}", existing, content),
            MergeMethod::Prepend => format!("{}\n{}", content, existing),
            MergeMethod::Block(tag) => inject_at_marker(existing, &block_marker(tag), content),
        }
    }
}

/// A template entry bound to the variables of one apply
#[derive(Debug, Clone)]
pub enum TemplateObject<'a> {
    Directory(DirectoryObject<'a>),
    File(FileObject<'a>),
}

impl TemplateObject<'_> {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Directory(_) => ObjectKind::Directory,
            Self::File(_) => ObjectKind::File,
        }
    }

    pub fn relative(&self) -> &Path {
        match self {
            Self::Directory(d) => d.relative(),
            Self::File(f) => f.relative(),
        }
    }

    pub fn target_path(&self, target: &Path) -> PathBuf {
        match self {
            Self::Directory(d) => d.target_path(target),
            Self::File(f) => f.target_path(target),
        }
    }

    pub fn is_valid(&self, target: &Path) -> bool {
        match self {
            Self::Directory(d) => d.is_valid(target),
            Self::File(f) => f.is_valid(target),
        }
    }

    pub fn has_effect(&self, target: &Path) -> bool {
        match self {
            Self::Directory(d) => d.has_effect(target),
            Self::File(f) => f.has_effect(target),
        }
    }

    pub fn merge(&self, target: &Path) -> Result<()> {
        match self {
            Self::Directory(d) => d.merge(target),
            Self::File(f) => f.merge(target),
        }
    }
}
