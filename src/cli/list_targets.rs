//! List the resolved targets of a project.
//!
//! # Examples
//!
//! ```bash
//! targetgen list-targets
//! targetgen list-targets --format json
//! ```
//!
//! ## Text Format (Default)
//! ```text
//! NAME      BASE                      CLUSTER  REF
//! dev-app   {{ target.args.env }}-app dev      env/dev
//! prod-app  {{ target.args.env }}-app prod     env/prod
//! ```

use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;

use super::common::{CommandContext, GlobalOptions};
use crate::targets::DynamicTarget;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    /// Human readable table
    #[default]
    Text,
    Json,
    Yaml,
}

/// Arguments of `targetgen list-targets`.
#[derive(Args, Debug)]
pub struct ListTargetsCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = ListFormat::Text)]
    pub format: ListFormat,
}

impl ListTargetsCommand {
    pub async fn execute(self, options: &GlobalOptions) -> Result<()> {
        let context = CommandContext::load(options).await?;
        let targets = context.resolve().await?;
        println!("{}", self.render(&targets)?);
        Ok(())
    }

    /// Format `targets` for output.
    pub fn render(&self, targets: &[DynamicTarget]) -> Result<String> {
        Ok(match self.format {
            ListFormat::Json => serde_json::to_string_pretty(targets)?,
            ListFormat::Yaml => serde_yaml::to_string(targets)?,
            ListFormat::Text => render_table(targets),
        })
    }
}

fn render_table(targets: &[DynamicTarget]) -> String {
    if targets.is_empty() {
        return "No targets found.".to_string();
    }

    let rows: Vec<[String; 4]> = targets
        .iter()
        .map(|t| {
            let git_ref = t.target.target_config.as_ref().and_then(|tc| tc.git_ref.clone());
            [
                t.target.name.clone(),
                t.base_target_name.clone(),
                t.target.cluster.clone().unwrap_or_else(|| "-".to_string()),
                git_ref.unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();

    let headers = ["NAME", "BASE", "CLUSTER", "REF"];
    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let line = |cells: [&str; 4]| {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = line(headers).bold().to_string();
    for row in &rows {
        out.push('\n');
        out.push_str(&line([&row[0], &row[1], &row[2], &row[3]]));
    }
    out
}
