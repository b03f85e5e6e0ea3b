//! Print one fully resolved target.
//!
//! ```bash
//! targetgen render-target prod-app
//! targetgen render-target prod-app --format json
//! ```

use anyhow::Result;
use clap::{Args, ValueEnum};

use super::common::{CommandContext, GlobalOptions};
use crate::core::TargetError;
use crate::project::Target;
use crate::targets::DynamicTarget;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum RenderFormat {
    #[default]
    Yaml,
    Json,
}

/// Arguments of `targetgen render-target`.
#[derive(Args, Debug)]
pub struct RenderTargetCommand {
    /// Name of the resolved target
    pub name: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = RenderFormat::Yaml)]
    pub format: RenderFormat,
}

impl RenderTargetCommand {
    pub async fn execute(self, options: &GlobalOptions) -> Result<()> {
        let context = CommandContext::load(options).await?;
        let targets = context.resolve().await?;
        let target = find_target(&targets, &self.name)?;
        print!("{}", self.render(target)?);
        Ok(())
    }

    pub fn render(&self, target: &Target) -> Result<String> {
        Ok(match self.format {
            RenderFormat::Yaml => serde_yaml::to_string(target)?,
            RenderFormat::Json => serde_json::to_string_pretty(target)? + "\n",
        })
    }
}

/// Look up a resolved target by name, suggesting close names on a miss.
pub fn find_target<'a>(targets: &'a [DynamicTarget], name: &str) -> Result<&'a Target, TargetError> {
    if let Some(found) = targets.iter().find(|t| t.target.name == name) {
        return Ok(&found.target);
    }

    let mut similar: Vec<&str> = targets
        .iter()
        .map(|t| t.target.name.as_str())
        .filter(|candidate| strsim::levenshtein(candidate, name) <= name.len().max(3) / 3)
        .collect();
    similar.truncate(3);

    let hint = if similar.is_empty() {
        String::new()
    } else {
        format!(" (did you mean {}?)", similar.join(", "))
    };
    Err(TargetError::config(format!("target '{name}' not found{hint}")))
}
