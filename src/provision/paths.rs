//! Conventional install locations of language toolchains.
//!
//! After a provisioner is installed (or found already present) these
//! directories are added to the environment snapshot's `PATH` so later
//! provisioners can find the tools it provides.
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::config::expand_home;

/// Tool name to candidate directory patterns (`~` is the home directory,
/// `*` matches one path segment).
const PATH_HINTS: &[(&str, &[&str])] = &[
    ("cargo", &["~/.cargo/bin"]),
    ("rustc", &["~/.cargo/bin"]),
    ("rustup", &["~/.cargo/bin"]),
    ("npm", &["~/.npm-global/bin", "~/.npm-packages/bin"]),
    ("node", &["~/.npm-global/bin", "~/.npm-packages/bin"]),
    ("pip", &["~/.local/bin"]),
    ("python", &["~/.local/bin"]),
    ("go", &["~/go/bin"]),
    ("gem", &["~/.gem/ruby/*/bin"]),
    (
        "composer",
        &["~/.composer/vendor/bin", "~/.config/composer/vendor/bin"],
    ),
];

/// Candidate patterns for `tool`; empty for tools not in the table.
#[must_use]
pub fn candidates(tool: &str) -> &'static [&'static str] {
    PATH_HINTS
        .iter()
        .find(|(name, _)| *name == tool)
        .map_or(&[][..], |(_, patterns)| *patterns)
}

/// Existing directories the provided tools conventionally install into.
///
/// Ordered by tool, then pattern, then (for wildcards) path; duplicates are
/// removed keeping the first occurrence.
#[must_use]
pub fn detect_path_additions(provides: &BTreeSet<String>, home: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for tool in provides {
        for pattern in candidates(tool) {
            for dir in resolve(pattern, home) {
                if !found.contains(&dir) {
                    found.push(dir);
                }
            }
        }
    }
    found
}

/// Expand `~` and any wildcard segments of `pattern`, keeping directories.
fn resolve(pattern: &str, home: &Path) -> Vec<PathBuf> {
    if !pattern.contains('*') {
        let path = expand_home(pattern, home);
        return if path.is_dir() { vec![path] } else { Vec::new() };
    }

    // Glob patterns are strings; a home that is not UTF-8 cannot be matched.
    let Some(home) = home.to_str() else {
        return Vec::new();
    };
    // The home prefix is literal even if it contains glob metacharacters.
    let escaped_home = glob::Pattern::escape(home);
    let expanded = expand_home(pattern, Path::new(&escaped_home));
    match glob::glob(&expanded.to_string_lossy()) {
        Ok(paths) => paths
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::fs;

    fn provides(tools: &[&str]) -> BTreeSet<String> {
        tools.iter().map(|t| (*t).to_string()).collect()
    }

    #[test]
    fn plain_pattern_returns_existing_dir() {
        let home = tempfile::tempdir().unwrap();
        let cargo_bin = home.path().join(".cargo/bin");
        fs::create_dir_all(&cargo_bin).unwrap();

        let found = detect_path_additions(&provides(&["cargo"]), home.path());
        assert_eq!(found, vec![cargo_bin]);
    }

    #[test]
    fn missing_dir_is_not_returned() {
        let home = tempfile::tempdir().unwrap();
        assert!(detect_path_additions(&provides(&["go"]), home.path()).is_empty());
    }

    #[test]
    fn middle_wildcard_resolves_versioned_dir() {
        let home = tempfile::tempdir().unwrap();
        let versioned = home.path().join(".gem/ruby/3.0.0/bin");
        fs::create_dir_all(&versioned).unwrap();
        // A version directory without bin/ does not match.
        fs::create_dir_all(home.path().join(".gem/ruby/2.7.0")).unwrap();

        let found = detect_path_additions(&provides(&["gem"]), home.path());
        assert_eq!(found, vec![versioned]);
    }

    #[test]
    fn wildcard_matching_a_file_is_ignored() {
        let home = tempfile::tempdir().unwrap();
        fs::create_dir_all(home.path().join(".gem/ruby/3.1.0")).unwrap();
        fs::write(home.path().join(".gem/ruby/3.1.0/bin"), "").unwrap();
        assert!(detect_path_additions(&provides(&["gem"]), home.path()).is_empty());
    }

    #[test]
    fn shared_dirs_are_deduplicated() {
        let home = tempfile::tempdir().unwrap();
        fs::create_dir_all(home.path().join(".cargo/bin")).unwrap();
        let found = detect_path_additions(&provides(&["cargo", "rustc", "rustup"]), home.path());
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn multiple_candidates_keep_pattern_order() {
        let home = tempfile::tempdir().unwrap();
        let global = home.path().join(".npm-global/bin");
        let packages = home.path().join(".npm-packages/bin");
        fs::create_dir_all(&packages).unwrap();
        fs::create_dir_all(&global).unwrap();

        let found = detect_path_additions(&provides(&["npm"]), home.path());
        assert_eq!(found, vec![global, packages]);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_home_is_joined_not_left_relative() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt as _;

        let root = tempfile::tempdir().unwrap();
        let home = root.path().join(OsStr::from_bytes(b"h\xffome"));
        let cargo_bin = home.join(".cargo/bin");
        if fs::create_dir_all(&cargo_bin).is_err() {
            // Filesystem refuses non-UTF-8 names.
            return;
        }
        assert_eq!(
            detect_path_additions(&provides(&["cargo"]), &home),
            vec![cargo_bin]
        );
        assert!(detect_path_additions(&provides(&["gem"]), &home).is_empty());
    }

    #[test]
    fn unknown_tools_have_no_candidates() {
        assert!(candidates("ripgrep").is_empty());
        assert_eq!(candidates("go"), &["~/go/bin"]);
    }
}
