use crate::utils;
use colored::Colorize;
use stackflow_core::run_program;
use std::path::Path;

/// Run a program and print its declared graph as JSON
pub fn handle(project_root: &Path, program: &str, stack: Option<String>) -> anyhow::Result<()> {
    let program = utils::find_program(program)?;
    let stack = utils::determine_stack_name(stack)?;
    eprintln!(
        "{}",
        format!("Declaring {} for stack {}...", program.name(), stack).blue()
    );

    let config = utils::load_config(project_root, &stack)?;
    let graph = run_program(program.as_ref(), stack, config)?;
    println!("{}", serde_json::to_string_pretty(&graph)?);
    Ok(())
}
