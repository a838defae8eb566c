//! Hierarchical ignore rules
//!
//! Patterns are collected from every `.gitignore` in the tree. A pattern
//! found in a subdirectory is prefixed with that directory's path relative
//! to the context root, so it can never match anything outside its own
//! subtree. All patterns are tested against every candidate path; rule order
//! is the tree discovery order and carries no matching semantics.

use crate::error::{ContextError, Result};
use glob::Pattern;
use std::fs;
use std::path::{Component, Path};
use tracing::{debug, warn};

const IGNORE_FILENAME: &str = ".gitignore";

/// Path components excluded unconditionally, independent of any rule file.
const DEPENDENCY_CACHES: &[&str] = &["node_modules", "__pycache__"];

#[derive(Debug)]
struct IgnoreRule {
    pattern: Pattern,
}

impl IgnoreRule {
    /// A rule matches the path itself or any ancestor directory of it, so a
    /// directory pattern like `build` also excludes `build/output.txt`.
    fn matches(&self, rel: &str) -> bool {
        if self.pattern.matches(rel) {
            return true;
        }
        rel.char_indices()
            .filter(|&(_, c)| c == '/')
            .any(|(i, _)| self.pattern.matches(&rel[..i]))
    }
}

/// Ordered set of ignore rules for one context root.
#[derive(Debug, Default)]
pub struct IgnoreRuleSet {
    rules: Vec<IgnoreRule>,
}

impl IgnoreRuleSet {
    /// Collect rules by walking the full tree once, in lexical order.
    /// A discovered ignore file that cannot be read is an error; an invalid
    /// pattern line is skipped with a warning.
    pub fn load(root: &Path) -> Result<Self> {
        let mut set = IgnoreRuleSet::default();
        set.collect(root, Path::new(""))?;
        debug!(rules = set.rules.len(), "Loaded ignore patterns");
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether the root-relative path is excluded from the build context.
    pub fn matches(&self, rel: &Path) -> bool {
        if has_hidden_segment(rel) || is_dependency_cache(rel) {
            return true;
        }
        let rel = posix_path(rel);
        self.rules.iter().any(|rule| rule.matches(&rel))
    }

    fn collect(&mut self, dir: &Path, rel_dir: &Path) -> Result<()> {
        let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<std::io::Result<_>>()?;
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let path = entry.path();
            let name = entry.file_name();
            if path.is_dir() {
                self.collect(&path, &rel_dir.join(&name))?;
            } else if name == IGNORE_FILENAME {
                self.read_ignore_file(&path, rel_dir)?;
            }
        }
        Ok(())
    }

    fn read_ignore_file(&mut self, path: &Path, rel_dir: &Path) -> Result<()> {
        let content = fs::read_to_string(path).map_err(|source| ContextError::IgnoreFile {
            path: path.to_path_buf(),
            source,
        })?;

        let prefix = posix_path(rel_dir);
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            // directory patterns keep their meaning without the trailing slash
            let line = line.trim_end_matches('/');
            let scoped = if prefix.is_empty() {
                line.to_string()
            } else {
                format!("{}/{}", prefix, line)
            };
            match Pattern::new(&scoped) {
                Ok(pattern) => self.rules.push(IgnoreRule { pattern }),
                Err(e) => {
                    warn!(pattern = %scoped, error = %e, "Skipping invalid ignore pattern");
                }
            }
        }
        Ok(())
    }
}

fn has_hidden_segment(rel: &Path) -> bool {
    rel.components().any(|c| match c {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}

fn is_dependency_cache(rel: &Path) -> bool {
    rel.components().any(|c| match c {
        Component::Normal(name) => DEPENDENCY_CACHES
            .iter()
            .any(|cache| name.to_string_lossy() == *cache),
        _ => false,
    })
}

/// Root-relative path with forward slashes, as archived.
pub(crate) fn posix_path(rel: &Path) -> String {
    let mut out = String::new();
    for component in rel.components() {
        if let Component::Normal(name) = component {
            if !out.is_empty() {
                out.push('/');
            }
            out.push_str(&name.to_string_lossy());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_hidden_segments_always_excluded() {
        let set = IgnoreRuleSet::default();
        assert!(set.matches(Path::new(".env")));
        assert!(set.matches(Path::new(".git/config")));
        assert!(set.matches(Path::new("src/.secrets/key")));
        assert!(!set.matches(Path::new("src/main.rs")));
    }

    #[test]
    fn test_dependency_caches_always_excluded() {
        let set = IgnoreRuleSet::default();
        assert!(set.matches(Path::new("node_modules")));
        assert!(set.matches(Path::new("web/node_modules/react/index.js")));
        assert!(set.matches(Path::new("app/__pycache__/mod.pyc")));
        assert!(!set.matches(Path::new("docs/node_modules.md")));
    }

    #[test]
    fn test_root_patterns() {
        let temp_dir = tempdir().unwrap();
        fs::write(
            temp_dir.path().join(".gitignore"),
            "# build output\n\nbuild/\n*.log\n",
        )
        .unwrap();

        let set = IgnoreRuleSet::load(temp_dir.path()).unwrap();
        assert_eq!(set.len(), 2);

        assert!(set.matches(Path::new("build")));
        assert!(set.matches(Path::new("build/output.txt")));
        assert!(set.matches(Path::new("trace.log")));
        assert!(set.matches(Path::new("logs/app.log")));
        assert!(!set.matches(Path::new("builder/main.go")));
        assert!(!set.matches(Path::new("src/main.rs")));
    }

    #[test]
    fn test_subdirectory_patterns_stay_scoped() {
        let temp_dir = tempdir().unwrap();
        let sub = temp_dir.path().join("web");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join(".gitignore"), "dist\n").unwrap();

        let set = IgnoreRuleSet::load(temp_dir.path()).unwrap();

        assert!(set.matches(Path::new("web/dist")));
        assert!(set.matches(Path::new("web/dist/bundle.js")));
        // the same name outside the subdirectory is not covered
        assert!(!set.matches(Path::new("dist")));
        assert!(!set.matches(Path::new("api/dist/bundle.js")));
    }

    #[test]
    fn test_unreadable_ignore_file_is_an_error() {
        let temp_dir = tempdir().unwrap();
        // invalid UTF-8 makes the read fail regardless of permissions
        fs::write(temp_dir.path().join(".gitignore"), [0xff, 0xfe, 0xfd]).unwrap();

        let result = IgnoreRuleSet::load(temp_dir.path());
        assert!(matches!(result, Err(ContextError::IgnoreFile { .. })));
    }

    #[test]
    fn test_invalid_pattern_is_skipped() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join(".gitignore"), "[invalid\nvalid.txt\n").unwrap();

        let set = IgnoreRuleSet::load(temp_dir.path()).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.matches(Path::new("valid.txt")));
    }

    #[test]
    fn test_posix_path() {
        assert_eq!(posix_path(Path::new("a/b/c.txt")), "a/b/c.txt");
        assert_eq!(posix_path(Path::new("")), "");
    }
}
