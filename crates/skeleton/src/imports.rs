//! Import header handling for importable source files
//!
//! When a `.py` file is appended or prepended onto an existing one, the new
//! file's import lines are lifted out of its body and merged into the import
//! header at the top of the target instead of landing mid-file.

use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;

/// Extension of files whose imports are merged
pub const IMPORTABLE_EXTENSION: &str = "py";

/// Prefix of comment lines kept in the header preamble
const COMMENT_PREFIX: &str = "#";

/// Set of raw import statements
pub type ImportSet = BTreeSet<String>;

fn import_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(from (.+) )?import (.+)$").expect("import pattern is valid")
    })
}

/// Whether `line` is an `import x` or `from x import y` statement
pub fn is_import(line: &str) -> bool {
    import_pattern().is_match(line)
}

/// Whether a target path gets import merging
pub fn is_importable(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(IMPORTABLE_EXTENSION)
}

/// Split the leading import block off `content`.
///
/// Blank lines inside the header are dropped. Everything from the first
/// non-blank, non-import line onwards is body, untouched. Content whose first
/// line is blank opts out: it comes back unchanged with no imports.
pub fn extract_imports(content: &str) -> (String, ImportSet) {
    let mut imports = ImportSet::new();

    if content.split('\n').next() == Some("") {
        return (content.to_string(), imports);
    }

    let mut body = Vec::new();
    let mut in_body = false;
    for line in content.split('\n') {
        if in_body {
            body.push(line);
        } else if line.is_empty() {
            continue;
        } else if is_import(line) {
            imports.insert(line.to_string());
        } else {
            in_body = true;
            body.push(line);
        }
    }

    (body.join("\n"), imports)
}

/// Merge `imports` into the import header of `content`.
///
/// Blank and comment lines of the header are kept as a preamble, followed by
/// the union of existing and new imports, then the rest of the file from the
/// first line that is neither. A file that is all header still gets the
/// merged imports after its preamble.
pub fn merge_imports(content: &str, imports: &ImportSet) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut merged: ImportSet = imports.clone();
    let mut preamble: Vec<&str> = Vec::new();
    let mut body_start = lines.len();

    for (i, &line) in lines.iter().enumerate() {
        if is_import(line) {
            merged.insert(line.to_string());
        } else if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
            preamble.push(line);
        } else {
            body_start = i;
            break;
        }
    }

    let mut out = preamble;
    out.extend(merged.iter().map(String::as_str));
    out.extend(&lines[body_start..]);
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(lines: &[&str]) -> ImportSet {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_is_import() {
        assert!(is_import("import os"));
        assert!(is_import("from os import path"));
        assert!(!is_import("important = 1"));
        assert!(!is_import("  import os"));
    }

    #[test]
    fn test_is_importable() {
        assert!(is_importable(Path::new("pkg/app.py")));
        assert!(!is_importable(Path::new("pkg/app.pyc")));
        assert!(!is_importable(Path::new("README")));
    }

    #[test]
    fn test_extract_imports() {
        let (body, imports) =
            extract_imports("import os\n\nfrom sys import argv\nimport os\nx = 1\n\nimport late");

        assert_eq!(body, "x = 1\n\nimport late");
        assert_eq!(imports, set(&["from sys import argv", "import os"]));
    }

    #[test]
    fn test_extract_leading_blank_opts_out() {
        let content = "\nimport os\nx = 1";
        let (body, imports) = extract_imports(content);

        assert_eq!(body, content);
        assert!(imports.is_empty());
    }

    #[test]
    fn test_extract_only_imports() {
        let (body, imports) = extract_imports("import os\nimport sys");
        assert_eq!(body, "");
        assert_eq!(imports.len(), 2);
    }

    #[test]
    fn test_merge_imports_keeps_preamble() {
        let content = "#!/usr/bin/env python\n# header\n\nimport sys\n\ndef main():\n    pass";
        let merged = merge_imports(content, &set(&["import os", "import sys"]));

        assert_eq!(
            merged,
            "#!/usr/bin/env python\n# header\n\n\nimport os\nimport sys\ndef main():\n    pass"
        );
    }

    #[test]
    fn test_merge_imports_no_duplicates() {
        let merged = merge_imports("import os\nbody()", &set(&["import os"]));
        assert_eq!(merged, "import os\nbody()");
    }

    #[test]
    fn test_merge_imports_header_only_file() {
        let merged = merge_imports("# only\nimport sys", &set(&["import os"]));
        assert_eq!(merged, "# only\nimport os\nimport sys");
    }

    #[test]
    fn test_merge_imports_body_untouched_after_header() {
        let merged = merge_imports("x = 1\nimport os\n# c", &set(&["import re"]));
        assert_eq!(merged, "import re\nx = 1\nimport os\n# c");
    }
}
