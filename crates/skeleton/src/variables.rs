//! Template variable handling
//!
//! Variables are literal tokens: every occurrence of a key in a file name or
//! file content is replaced by its value. Keys are applied one after another
//! in insertion order, so a value containing a later key's token is
//! substituted again by that later key.
//!
//! Tokens of the form `SKEL...` that survive generation are declaration
//! markers and get stripped by the final cleanup pass.

use regex::Regex;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use walkdir::WalkDir;

use crate::error::{io_error, Result, SkeletonError};
use skeleton_core::SKELVARS_FILE;

/// Ordered variable set shared by a template and its extensions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    /// Token -> value, in insertion order
    vars: Vec<(String, String)>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable. An existing key keeps its position.
    pub fn set(&mut self, key: &str, value: &str) {
        match self.vars.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self.vars.push((key.to_string(), value.to_string())),
        }
    }

    /// Get a variable value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Get all variable entries, in substitution order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Apply `other` on top of this set; its values win on conflicts
    pub fn overlay(&mut self, other: &Variables) {
        for (key, value) in other.entries() {
            self.set(key, value);
        }
    }

    /// Parse KEY=VALUE strings. The key is trimmed, the value kept verbatim.
    pub fn from_pairs<S: AsRef<str>>(pairs: &[S]) -> Result<Self> {
        let mut vars = Self::new();
        for pair in pairs {
            let pair = pair.as_ref();
            match pair.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => vars.set(key.trim(), value),
                _ => return Err(SkeletonError::InvalidVariable(pair.to_string())),
            }
        }
        Ok(vars)
    }

    /// Load `.skelvars` from a target directory. A missing file is an empty set.
    ///
    /// Non-string JSON values are kept as their JSON text.
    pub fn load(target: &Path) -> Result<Self> {
        let path = target.join(SKELVARS_FILE);
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(&path).map_err(io_error(&path))?;
        let map: Map<String, Value> =
            serde_json::from_str(&content).map_err(|source| SkeletonError::InvalidSkelvars {
                path: path.clone(),
                source,
            })?;

        let mut vars = Self::new();
        for (key, value) in map {
            match value {
                Value::String(s) => vars.set(&key, &s),
                other => vars.set(&key, &other.to_string()),
            }
        }

        tracing::debug!("Loaded {} variables from {}", vars.len(), path.display());
        Ok(vars)
    }

    /// Write this set as `.skelvars` into a target directory
    pub fn save(&self, target: &Path) -> Result<()> {
        let path = target.join(SKELVARS_FILE);
        let map: Map<String, Value> = self
            .vars
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();

        let json = serde_json::to_string_pretty(&map).map_err(|source| {
            SkeletonError::InvalidSkelvars {
                path: path.clone(),
                source,
            }
        })?;
        fs::write(&path, json).map_err(io_error(&path))
    }

    /// Replace every occurrence of each key, one key at a time.
    ///
    /// Empty keys are ignored.
    pub fn substitute(&self, content: &str) -> String {
        let mut content = content.to_string();
        for (key, value) in &self.vars {
            if key.is_empty() || !content.contains(key.as_str()) {
                continue;
            }
            content = content.replace(key.as_str(), value);
        }
        content
    }
}

impl FromIterator<(String, String)> for Variables {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut vars = Self::new();
        for (key, value) in iter {
            vars.set(&key, &value);
        }
        vars
    }
}

fn declaration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"SKEL[A-Z0-9_]+\n?").expect("declaration pattern is valid"))
}

/// Strip leftover `SKEL...` tokens, together with one newline right after each
pub fn clean_skel_vars(content: &str) -> String {
    declaration_pattern().replace_all(content, "").into_owned()
}

/// Clean one file in place. Returns whether the file changed.
///
/// Binary and non-UTF-8 files are left alone.
pub fn clean_skel_vars_in_file(path: &Path) -> Result<bool> {
    let bytes = fs::read(path).map_err(io_error(path))?;
    if is_binary_file(&bytes) {
        return Ok(false);
    }
    let Ok(content) = String::from_utf8(bytes) else {
        tracing::warn!("Skipping non-UTF-8 file during cleanup: {}", path.display());
        return Ok(false);
    };

    let cleaned = clean_skel_vars(&content);
    if cleaned == content {
        return Ok(false);
    }

    fs::write(path, cleaned).map_err(io_error(path))?;
    Ok(true)
}

/// Clean every file under `path` except `.skelvars` files.
/// Returns the number of files changed.
pub fn clean_skel_vars_in_dir(path: &Path) -> Result<usize> {
    let mut changed = 0;
    for entry in WalkDir::new(path) {
        let entry = entry?;
        if !entry.file_type().is_file() || entry.file_name() == SKELVARS_FILE {
            continue;
        }
        if clean_skel_vars_in_file(entry.path())? {
            tracing::debug!("Cleaned declaration tokens in {}", entry.path().display());
            changed += 1;
        }
    }
    Ok(changed)
}

/// Find the distinct `SKEL...` tokens used in a string, sorted
pub fn find_declaration_tokens(content: &str) -> Vec<String> {
    let mut tokens: Vec<String> = declaration_pattern()
        .find_iter(content)
        .map(|m| m.as_str().trim_end_matches('\n').to_string())
        .collect();

    tokens.sort();
    tokens.dedup();
    tokens
}

/// Check if a file is likely binary (should not have variable substitution)
pub fn is_binary_file(content: &[u8]) -> bool {
    // Check for null bytes in first 8KB
    let check_len = content.len().min(8192);
    content[..check_len].contains(&0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_substitute_basic() {
        let mut vars = Variables::new();
        vars.set("SKELNAME", "World");

        assert_eq!(vars.substitute("Hi SKELNAME, SKELNAME!"), "Hi World, World!");
    }

    #[test]
    fn test_substitute_cascades_in_order() {
        // FIRST's value contains SECOND's token, and SECOND comes later
        let mut vars = Variables::new();
        vars.set("FIRST", "x-SECOND");
        vars.set("SECOND", "y");

        assert_eq!(vars.substitute("FIRST"), "x-y");
    }

    #[test]
    fn test_substitute_no_cascade_backwards() {
        // SECOND's value contains FIRST's token, but FIRST has already run
        let mut vars = Variables::new();
        vars.set("FIRST", "a");
        vars.set("SECOND", "b-FIRST");

        assert_eq!(vars.substitute("SECOND FIRST"), "b-FIRST a");
    }

    #[test]
    fn test_substitute_twice_is_stable() {
        let mut vars = Variables::new();
        vars.set("SKELA", "alpha");
        vars.set("SKELB", "beta");

        let once = vars.substitute("SKELA and SKELB");
        assert_eq!(vars.substitute(&once), once);
    }

    #[test]
    fn test_substitute_ignores_empty_key() {
        let mut vars = Variables::new();
        vars.set("", "boom");

        assert_eq!(vars.substitute("abc"), "abc");
    }

    #[test]
    fn test_set_keeps_position() {
        let mut vars = Variables::new();
        vars.set("A", "1");
        vars.set("B", "2");
        vars.set("A", "3");

        let entries: Vec<_> = vars.entries().collect();
        assert_eq!(entries, vec![("A", "3"), ("B", "2")]);
    }

    #[test]
    fn test_overlay_caller_wins() {
        let mut saved = Variables::new();
        saved.set("SKELNAME", "saved");
        saved.set("SKELKEEP", "kept");

        let mut caller = Variables::new();
        caller.set("SKELNAME", "caller");

        saved.overlay(&caller);
        assert_eq!(saved.get("SKELNAME"), Some("caller"));
        assert_eq!(saved.get("SKELKEEP"), Some("kept"));
    }

    #[test]
    fn test_from_pairs() {
        let vars = Variables::from_pairs(&["FOO=bar", " BAZ =a=b"]).unwrap();
        assert_eq!(vars.get("FOO"), Some("bar"));
        assert_eq!(vars.get("BAZ"), Some("a=b"));

        assert!(matches!(
            Variables::from_pairs(&["novalue"]),
            Err(SkeletonError::InvalidVariable(_))
        ));
        assert!(Variables::from_pairs(&["=x"]).is_err());
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(Variables::load(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_load_and_save() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(SKELVARS_FILE),
            r#"{"SKELNAME": "demo", "SKELPORT": 8080}"#,
        )
        .unwrap();

        let vars = Variables::load(dir.path()).unwrap();
        assert_eq!(vars.get("SKELNAME"), Some("demo"));
        assert_eq!(vars.get("SKELPORT"), Some("8080"));

        let out = TempDir::new().unwrap();
        vars.save(out.path()).unwrap();
        assert_eq!(Variables::load(out.path()).unwrap().get("SKELPORT"), Some("8080"));
    }

    #[test]
    fn test_load_invalid() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(SKELVARS_FILE), "[1, 2]").unwrap();

        assert!(matches!(
            Variables::load(dir.path()),
            Err(SkeletonError::InvalidSkelvars { .. })
        ));
    }

    #[test]
    fn test_clean_skel_vars() {
        assert_eq!(clean_skel_vars("a\nSKELBLOCK_X\nb"), "a\nb");
        assert_eq!(clean_skel_vars("value: SKELUNSET"), "value: ");
        assert_eq!(clean_skel_vars("nothing here"), "nothing here");
    }

    #[test]
    fn test_clean_dir_skips_skelvars() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(SKELVARS_FILE), r#"{"SKELNAME": "x"}"#).unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/a.txt"), "keep\nSKELMARK\n").unwrap();
        fs::write(dir.path().join("b.bin"), b"SKELMARK\x00").unwrap();

        let changed = clean_skel_vars_in_dir(dir.path()).unwrap();
        assert_eq!(changed, 1);
        assert_eq!(fs::read_to_string(dir.path().join("sub/a.txt")).unwrap(), "keep\n");
        assert_eq!(
            fs::read_to_string(dir.path().join(SKELVARS_FILE)).unwrap(),
            r#"{"SKELNAME": "x"}"#
        );
        assert_eq!(fs::read(dir.path().join("b.bin")).unwrap(), b"SKELMARK\x00");
    }

    #[test]
    fn test_find_declaration_tokens() {
        let tokens = find_declaration_tokens("SKELNAME is SKELNAME\nSKELBLOCK_IMPORTS\n");
        assert_eq!(tokens, vec!["SKELBLOCK_IMPORTS".to_string(), "SKELNAME".to_string()]);
    }

    #[test]
    fn test_is_binary() {
        assert!(!is_binary_file(b"Hello, world!"));
        assert!(is_binary_file(b"Hello\x00world"));
    }
}
