//! Shell snippets from `[shell_integration.snippets.*]`.
use serde::Deserialize;

use crate::error::ConfigError;
use crate::shell::{ShellSnippet, ShellStage};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct RawSnippet {
    description: String,
    stage: Option<i64>,
    condition: Option<String>,
    bash: Option<String>,
    zsh: Option<String>,
    fish: Option<String>,
    default: Option<String>,
}

impl RawSnippet {
    pub(super) fn into_snippet(self, name: &str) -> Result<ShellSnippet, ConfigError> {
        let stage = match self.stage {
            None => ShellStage::Main,
            Some(value) => {
                ShellStage::from_ordinal(value).ok_or_else(|| ConfigError::InvalidStage {
                    item: name.to_string(),
                    value,
                })?
            }
        };
        Ok(ShellSnippet {
            name: name.to_string(),
            description: self.description,
            stage,
            condition: self.condition.filter(|c| !c.trim().is_empty()),
            bash: self.bash,
            zsh: self.zsh,
            fish: self.fish,
            default: self.default,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn snippet_fields_are_carried_over() {
        let raw: RawSnippet = toml::from_str(
            "description = \"Prompt\"\nstage = 9\ncondition = \"command -v starship\"\n\
             default = \"eval \\\"$(starship init {shell})\\\"\"\n",
        )
        .unwrap();
        let s = raw.into_snippet("starship").unwrap();
        assert_eq!(s.name, "starship");
        assert_eq!(s.stage, ShellStage::Late);
        assert_eq!(s.condition.as_deref(), Some("command -v starship"));
        assert!(s.default.unwrap().contains("{shell}"));
    }

    #[test]
    fn blank_condition_means_unguarded() {
        let raw: RawSnippet = toml::from_str("condition = \"  \"").unwrap();
        assert_eq!(raw.into_snippet("x").unwrap().condition, None);
    }

    #[test]
    fn bad_stage_is_rejected() {
        let raw: RawSnippet = toml::from_str("stage = 1").unwrap();
        assert!(raw.into_snippet("x").is_err());
    }
}
