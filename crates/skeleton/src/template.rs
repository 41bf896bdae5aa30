//! Template resolution and application
//!
//! A template is a directory found on the search path under its dotted name
//! (`web.django` lives at `<root>/web/django`). Applying it walks the
//! directory, validates every entry against the target, then merges them in
//! walk order. Extensions are applied afterwards with the same variables, and
//! a final pass strips leftover declaration tokens from the whole target.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{io_error, Result, SkeletonError};
use crate::object::{ObjectSpec, TemplateObject};
use crate::variables::{clean_skel_vars_in_dir, find_declaration_tokens, is_binary_file, Variables};

/// Optional manifest at the template root
pub const MANIFEST_FILE: &str = "skeleton.json";

/// Files at the template root that are never generated. The Python package
/// markers let a template directory double as an importable package.
pub const ROOT_MARKERS: &[&str] = &[MANIFEST_FILE, "__init__.py", "__init__.pyc"];

/// Template metadata from skeleton.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TemplateMetadata {
    /// Template description
    #[serde(default)]
    pub description: String,

    /// Variables this template expects
    #[serde(default)]
    pub variables: Vec<String>,
}

/// Outcome of applying a template and its extensions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Objects merged
    pub objects: usize,
    /// Objects that created something new
    pub effective: usize,
}

/// Find the first search root containing the template's directory
pub fn resolve(name: &str, search_path: &[PathBuf]) -> Option<PathBuf> {
    let relative: PathBuf = name.split('.').collect();
    search_path
        .iter()
        .map(|root| root.join(&relative))
        .find(|candidate| candidate.is_dir())
}

/// List templates sitting directly under each search root.
///
/// A name found on an earlier root hides the same name further down.
pub fn list_templates(search_path: &[PathBuf]) -> Result<Vec<Template>> {
    let mut templates: Vec<Template> = Vec::new();

    for root in search_path.iter().filter(|r| r.is_dir()) {
        for entry in fs::read_dir(root).map_err(io_error(root))? {
            let entry = entry.map_err(io_error(root))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if templates.iter().any(|t| t.name == name) {
                continue;
            }
            templates.push(Template::from_path(&name, &path)?);
        }
    }

    templates.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(templates)
}

/// A template definition
#[derive(Debug, Clone)]
pub struct Template {
    /// Dotted template name
    pub name: String,
    /// Resolved template directory
    pub root: PathBuf,
    /// Template metadata (if skeleton.json exists)
    pub metadata: Option<TemplateMetadata>,
    /// Caller-supplied variables, laid over the target's .skelvars
    variables: Variables,
    extensions: Vec<Template>,
    added_objects: Vec<ObjectSpec>,
}

impl Template {
    /// Resolve a template on the search path
    pub fn new(name: &str, search_path: &[PathBuf]) -> Result<Self> {
        let root = resolve(name, search_path).ok_or_else(|| SkeletonError::TemplateNotFound {
            name: name.to_string(),
            search_path: search_path.to_vec(),
        })?;
        Self::from_path(name, &root)
    }

    /// Load a template from a known directory
    pub fn from_path(name: &str, root: &Path) -> Result<Self> {
        let manifest = root.join(MANIFEST_FILE);
        let metadata = if manifest.is_file() {
            let content = fs::read_to_string(&manifest).map_err(io_error(&manifest))?;
            match serde_json::from_str(&content) {
                Ok(metadata) => Some(metadata),
                Err(err) => {
                    tracing::warn!("Ignoring unreadable {}: {}", manifest.display(), err);
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            name: name.to_string(),
            root: root.to_path_buf(),
            metadata,
            variables: Variables::new(),
            extensions: Vec::new(),
            added_objects: Vec::new(),
        })
    }

    /// Set the caller-supplied variables
    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// Get the template description
    pub fn description(&self) -> &str {
        self.metadata
            .as_ref()
            .map(|m| m.description.as_str())
            .filter(|d| !d.is_empty())
            .unwrap_or("No description")
    }

    /// Layer another template on top of this one.
    ///
    /// Extensions always use the variables resolved for this template; their
    /// own variables are not consulted.
    pub fn add_extension(&mut self, extension: Template) {
        self.extensions.push(extension);
    }

    pub fn has_extension(&self, name: &str) -> bool {
        self.extensions.iter().any(|e| e.name == name)
    }

    pub fn extensions(&self) -> &[Template] {
        &self.extensions
    }

    /// Add an entry generated in addition to the walked ones
    pub fn add_object(&mut self, spec: ObjectSpec) {
        self.added_objects.push(spec);
    }

    /// Entries of this template, parents before children, then added ones
    pub fn specs(&self) -> Result<Vec<ObjectSpec>> {
        let mut specs = Vec::new();

        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry?;
            let is_dir = entry.file_type().is_dir();

            if entry.depth() == 1 && !is_dir {
                let file_name = entry.file_name().to_string_lossy();
                if ROOT_MARKERS.iter().any(|marker| *marker == file_name) {
                    continue;
                }
            }

            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| PathBuf::from(entry.file_name()));

            specs.push(if is_dir {
                ObjectSpec::directory(&self.root, relative)
            } else {
                ObjectSpec::file(&self.root, relative)
            });
        }

        specs.extend(self.added_objects.iter().cloned());
        Ok(specs)
    }

    /// Entries of this template bound to `vars`
    pub fn objects<'a>(&self, vars: &'a Variables) -> Result<Vec<TemplateObject<'a>>> {
        Ok(self.specs()?.iter().map(|spec| spec.bind(vars)).collect())
    }

    /// Generate this template and its extensions into `target`
    pub fn apply_to(&self, target: &Path) -> Result<ApplyReport> {
        let mut vars = Variables::load(target)?;
        vars.overlay(&self.variables);

        let mut report = self.merge_objects(target, &vars)?;
        for extension in &self.extensions {
            let extension_report = extension.merge_objects(target, &vars)?;
            report.objects += extension_report.objects;
            report.effective += extension_report.effective;
        }

        let cleaned = clean_skel_vars_in_dir(target)?;
        tracing::debug!("Cleanup pass changed {} files", cleaned);

        Ok(report)
    }

    fn merge_objects(&self, target: &Path, vars: &Variables) -> Result<ApplyReport> {
        let objects = self.objects(vars)?;

        if let Some(conflict) = objects.iter().find(|o| !o.is_valid(target)) {
            return Err(SkeletonError::CannotMerge {
                template: self.name.clone(),
                path: conflict.target_path(target),
            });
        }

        let mut report = ApplyReport::default();
        for object in &objects {
            if object.has_effect(target) {
                report.effective += 1;
            }
            object.merge(target)?;
            report.objects += 1;
        }

        tracing::info!(
            "Applied template '{}' to {} ({} objects)",
            self.name,
            target.display(),
            report.objects
        );
        Ok(report)
    }

    /// Get all declaration tokens used in this template's names and contents
    pub fn find_variables(&self) -> Result<Vec<String>> {
        let mut all_vars = Vec::new();

        for spec in self.specs()? {
            all_vars.extend(find_declaration_tokens(&spec.relative.to_string_lossy()));

            let path = spec.root.join(&spec.relative);
            if !path.is_file() {
                continue;
            }
            let content = fs::read(&path).map_err(io_error(&path))?;
            if !is_binary_file(&content) {
                all_vars.extend(find_declaration_tokens(&String::from_utf8_lossy(&content)));
            }
        }

        all_vars.sort();
        all_vars.dedup();
        Ok(all_vars)
    }
}
