use crate::utils;
use colored::Colorize;
use stackflow_core::{ConfigStore, StackReferenceName};
use std::path::Path;

/// Print the exports of `organization/project/stack`
pub async fn handle(project_root: &Path, reference: &str, json: bool) -> anyhow::Result<()> {
    let reference: StackReferenceName = reference.parse()?;
    let engine = stackflow::local_engine(project_root, &ConfigStore::new());
    let outputs = engine.stack_outputs(&reference).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outputs)?);
    } else {
        println!("{} {}", "Outputs of".bold(), reference.to_string().cyan());
        utils::print_outputs(&outputs);
    }
    Ok(())
}
