//! Merge methods
//!
//! A template file picks how it lands on an existing target file through its
//! name: `config.__APPEND__.conf` is appended to `config.conf`. Without a tag
//! the target is overwritten. Any tag other than APPEND/PREPEND names a block:
//! the content is injected wherever the target holds `SKELBLOCK_<TAG>`.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use crate::variables::Variables;

/// How a template file is merged into an existing target file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeMethod {
    /// Replace the target content
    Overwrite,
    /// Existing content, newline, new content
    Append,
    /// New content, newline, existing content
    Prepend,
    /// Inject at every `SKELBLOCK_<tag>` marker
    Block(String),
}

impl MergeMethod {
    /// Interpret a tag that already had its underscores stripped
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "" => Self::Overwrite,
            "APPEND" => Self::Append,
            "PREPEND" => Self::Prepend,
            other => Self::Block(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Overwrite => "overwrite",
            Self::Append => "APPEND",
            Self::Prepend => "PREPEND",
            Self::Block(tag) => tag.as_str(),
        }
    }
}

impl fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn tagged_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<stem>.+)\.(?P<tag>[A-Z_][A-Z0-9_]*)\.(?P<ext>[^.]+)$")
            .expect("merge tag pattern is valid")
    })
}

/// Split a file name into its clean name and merge method.
///
/// `foo.__APPEND__.txt` gives `("foo.txt", Append)`; a name without a tag
/// segment (or with a tag made only of underscores) is returned unchanged
/// with `Overwrite`.
pub fn split_merge_method(file_name: &str) -> (String, MergeMethod) {
    let Some(caps) = tagged_name_pattern().captures(file_name) else {
        return (file_name.to_string(), MergeMethod::Overwrite);
    };

    let tag = caps["tag"].trim_matches('_');
    if tag.is_empty() {
        return (file_name.to_string(), MergeMethod::Overwrite);
    }

    let clean = format!("{}.{}", &caps["stem"], &caps["ext"]);
    (clean, MergeMethod::from_tag(tag))
}

/// Marker token for a named block
pub fn block_marker(tag: &str) -> String {
    format!("SKELBLOCK_{}", tag)
}

/// Replace every `marker` in `target` with `content` followed by the marker
/// on its own line, so later merges into the same block land after this one.
///
/// Each occurrence receives the content; a target with two markers gets it
/// twice.
pub fn inject_at_marker(target: &str, marker: &str, content: &str) -> String {
    let mut block = Variables::new();
    block.set(marker, &format!("{}\n{}", content, marker));
    block.substitute(target)
}
