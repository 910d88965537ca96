//! Conditional guards around snippet bodies.
use super::Dialect;

/// Literal rewrites that turn a POSIX test condition into its fish spelling.
///
/// Applied in order; anything not listed passes through unchanged.
const FISH_REWRITES: &[(&str, &str)] = &[
    ("command -v", "type -q"),
    ("[ -f", "test -f"),
    (" ]", ""),
    (">/dev/null 2>&1", ""),
];

/// Translate a POSIX-style condition to fish syntax.
#[must_use]
pub fn to_fish_condition(condition: &str) -> String {
    FISH_REWRITES
        .iter()
        .fold(condition.to_string(), |acc, (from, to)| acc.replace(from, to))
        .trim()
        .to_string()
}

/// Wrap `content` in an `if` block for `dialect`, indenting each line by
/// four spaces.
pub fn wrap(dialect: Dialect, condition: &str, content: &str, out: &mut Vec<String>) {
    let (open, close) = match dialect {
        Dialect::Fish => (format!("if {}", to_fish_condition(condition)), "end"),
        Dialect::Bash | Dialect::Zsh => (format!("if {condition}; then"), "fi"),
    };
    out.push(open);
    out.extend(content.split('\n').map(|line| format!("    {line}")));
    out.push(close.to_string());
}
