use crate::utils;
use colored::Colorize;
use stackflow_cloud::StepOp;
use stackflow_core::run_program;
use std::path::Path;

pub async fn handle(
    project_root: &Path,
    program: &str,
    stack: Option<String>,
) -> anyhow::Result<()> {
    let program = utils::find_program(program)?;
    let stack = utils::determine_stack_name(stack)?;
    println!(
        "{}",
        format!("Updating {} ({})...", program.name(), stack).green()
    );

    let config = utils::load_config(project_root, &stack)?;
    let engine = stackflow::local_engine(project_root, &config);
    for provider in engine.providers() {
        let status = provider.check_auth().await?;
        if !status.authenticated {
            anyhow::bail!(
                "{}: {}",
                provider.display_name(),
                status.error.unwrap_or_default()
            );
        }
    }

    let graph = run_program(program.as_ref(), stack, config)?;
    let result = engine.up(&graph).await?;

    println!();
    for step in &result.operation.steps {
        let marker = match step.op {
            StepOp::Create => "+".green(),
            StepOp::Update => "~".yellow(),
            StepOp::Delete => "-".red(),
            StepOp::Same => " ".normal(),
        };
        println!("  {} {:7} {}", marker, step.op.to_string(), step.urn);
    }

    println!();
    println!("{}", "Outputs:".bold());
    utils::print_outputs(&result.outputs);

    println!();
    println!(
        "{} {} ({}ms)",
        "✓".green().bold(),
        result.operation.summary(),
        result.operation.duration_ms
    );
    Ok(())
}
