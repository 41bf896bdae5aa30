//! skeleton - Generate directory trees from templates
//!
//! A template ("skeleton") is a directory on the search path. Its files and
//! directories are copied into a target with variable tokens replaced in both
//! names and contents. Files that already exist in the target can be merged
//! instead of overwritten by tagging the template file name:
//!
//! - `notes.__APPEND__.txt` appends to `notes.txt`
//! - `notes.__PREPEND__.txt` prepends to `notes.txt`
//! - `urls.__ROUTES__.py` is injected at `SKELBLOCK_ROUTES` in `urls.py`
//!
//! Extensions are further templates applied to the same target with the same
//! variables. Leftover `SKEL...` tokens are removed once everything is merged.

pub mod error;
pub mod imports;
pub mod merge;
pub mod object;
pub mod template;
pub mod variables;

use std::fs;
use std::path::{Path, PathBuf};

pub use error::{Result, SkeletonError};
pub use merge::MergeMethod;
pub use object::{ObjectKind, ObjectSpec, TemplateObject};
pub use template::{list_templates, resolve, ApplyReport, Template, TemplateMetadata};
pub use variables::Variables;

/// Apply `templates` to `target`: the first is the base, the rest extensions.
///
/// `vars` override whatever the target's `.skelvars` defines. The target
/// directory is created if missing.
pub fn create<S: AsRef<str>>(
    templates: &[S],
    target: &Path,
    vars: Variables,
    search_path: &[PathBuf],
) -> Result<ApplyReport> {
    let (base, rest) = templates.split_first().ok_or(SkeletonError::NoTemplates)?;

    let mut skeleton = Template::new(base.as_ref(), search_path)?.with_variables(vars);
    for name in rest {
        skeleton.add_extension(Template::new(name.as_ref(), search_path)?);
    }

    fs::create_dir_all(target).map_err(error::io_error(target))?;
    skeleton.apply_to(target)
}
