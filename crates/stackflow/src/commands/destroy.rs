use crate::utils;
use colored::Colorize;
use stackflow_core::StackName;
use std::path::Path;

pub async fn handle(
    project_root: &Path,
    program: &str,
    stack: Option<String>,
    yes: bool,
) -> anyhow::Result<()> {
    let program = utils::find_program(program)?;
    let stack: StackName = utils::determine_stack_name(stack)?;

    if !yes {
        anyhow::bail!(
            "Destroying {} ({}) deletes every resource; re-run with --yes to confirm",
            program.name(),
            stack
        );
    }

    println!(
        "{}",
        format!("Destroying {} ({})...", program.name(), stack).red()
    );
    let config = utils::load_config(project_root, &stack)?;
    let engine = stackflow::local_engine(project_root, &config);
    let operation = engine.destroy(program.name(), &stack).await?;

    for step in &operation.steps {
        println!("  {} {}", "-".red(), step.urn);
    }
    println!();
    println!("{} {}", "✓".green().bold(), operation.summary());
    Ok(())
}
