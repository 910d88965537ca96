//! Staged shell initialization scripts.
//!
//! Snippets are grouped into three load stages so that cheap, essential
//! setup (environment variables, `PATH`) runs before slower integrations
//! such as prompt themes or completion systems. Each snippet may carry
//! per-dialect bodies, a `{shell}`-templated default and an optional guard
//! condition written in POSIX test syntax.
pub mod guard;

use std::fmt;

use clap::ValueEnum;

/// Shell initialization stage, ordered by load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum)]
pub enum ShellStage {
    /// Critical environment and `PATH` setup.
    Early,
    /// Regular tool integrations.
    Main,
    /// Slow or cosmetic integrations.
    Late,
}

impl ShellStage {
    /// All stages in load order.
    pub const ALL: [Self; 3] = [Self::Early, Self::Main, Self::Late];

    /// Ordinal used in configuration files.
    #[must_use]
    pub const fn ordinal(self) -> i64 {
        match self {
            Self::Early => 0,
            Self::Main => 5,
            Self::Late => 9,
        }
    }

    /// Parse a configuration ordinal; only 0, 5 and 9 are valid.
    #[must_use]
    pub const fn from_ordinal(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Early),
            5 => Some(Self::Main),
            9 => Some(Self::Late),
            _ => None,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Early => "EARLY",
            Self::Main => "MAIN",
            Self::Late => "LATE",
        }
    }
}

/// Supported shell dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Dialect {
    /// GNU Bash.
    Bash,
    /// Z shell.
    Zsh,
    /// Friendly interactive shell.
    Fish,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bash => write!(f, "bash"),
            Self::Zsh => write!(f, "zsh"),
            Self::Fish => write!(f, "fish"),
        }
    }
}

/// A unit of shell initialization text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellSnippet {
    /// Snippet name; also the sort key within a stage.
    pub name: String,
    /// Comment emitted above the snippet (falls back to `name`).
    pub description: String,
    /// Load stage.
    pub stage: ShellStage,
    /// Optional POSIX-style guard condition.
    pub condition: Option<String>,
    /// Bash-specific body.
    pub bash: Option<String>,
    /// Zsh-specific body.
    pub zsh: Option<String>,
    /// Fish-specific body.
    pub fish: Option<String>,
    /// Fallback body; `{shell}` is replaced with the dialect name.
    pub default: Option<String>,
}

impl ShellSnippet {
    /// Create an empty snippet in the main stage.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            stage: ShellStage::Main,
            condition: None,
            bash: None,
            zsh: None,
            fish: None,
            default: None,
        }
    }

    /// Body to emit for `dialect`; empty when the snippet has none.
    #[must_use]
    pub fn content(&self, dialect: Dialect) -> String {
        let specific = match dialect {
            Dialect::Bash => self.bash.as_deref(),
            Dialect::Zsh => self.zsh.as_deref(),
            Dialect::Fish => self.fish.as_deref(),
        };
        match (specific, self.default.as_deref()) {
            (Some(body), _) if !body.is_empty() => body.to_string(),
            (_, Some(template)) if !template.is_empty() => {
                template.replace("{shell}", &dialect.to_string())
            }
            _ => String::new(),
        }
    }
}

/// Generate initialization text for `dialect`.
///
/// With `stage` set, only that stage's snippets are rendered, without
/// header or stage label. Otherwise all stages are emitted in load order
/// below a header, each introduced by a banner comment; stages with no
/// output are omitted.
#[must_use]
pub fn generate(dialect: Dialect, snippets: &[ShellSnippet], stage: Option<ShellStage>) -> String {
    if let Some(stage) = stage {
        return render_stage(dialect, snippets, stage);
    }

    let mut sections = vec![header(dialect)];
    for stage in ShellStage::ALL {
        let content = render_stage(dialect, snippets, stage);
        if !content.is_empty() {
            sections.push(format!("\n# ═══ {} STAGE ═══", stage.label()));
            sections.push(content);
        }
    }
    sections.join("\n")
}

fn header(dialect: Dialect) -> String {
    format!(
        "# Generated by dot: staged shell initialization for {dialect}\n\
         # Stages load in order: early, main, late\n"
    )
}

/// Render one stage: snippets sorted by name, each preceded by a comment
/// and followed by a blank line, trailing whitespace removed.
#[must_use]
pub fn render_stage(dialect: Dialect, snippets: &[ShellSnippet], stage: ShellStage) -> String {
    let mut selected: Vec<&ShellSnippet> = snippets.iter().filter(|s| s.stage == stage).collect();
    selected.sort_by(|a, b| a.name.cmp(&b.name));

    let mut lines = Vec::new();
    for snippet in selected {
        let content = snippet.content(dialect);
        if content.is_empty() {
            continue;
        }
        let title = if snippet.description.is_empty() {
            &snippet.name
        } else {
            &snippet.description
        };
        lines.push(format!("# {title}"));
        match snippet.condition.as_deref() {
            Some(condition) if !condition.is_empty() => {
                guard::wrap(dialect, condition, &content, &mut lines);
            }
            _ => lines.push(content),
        }
        lines.push(String::new());
    }
    lines.join("\n").trim_end().to_string()
}
