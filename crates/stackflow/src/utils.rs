use colored::Colorize;
use serde_json::Value;
use stackflow_core::{ConfigStore, Program, StackName};
use std::collections::BTreeMap;
use std::path::Path;

/// Resolve the stack name given on the command line or in `STACKFLOW_STACK`
pub fn determine_stack_name(stack: Option<String>) -> anyhow::Result<StackName> {
    let Some(name) = stack else {
        anyhow::bail!(
            "No stack selected: pass -s <stack> or set STACKFLOW_STACK=<stack>"
        );
    };
    Ok(StackName::new(name)?)
}

/// Look up a bundled program, listing the available ones on failure
pub fn find_program(name: &str) -> anyhow::Result<Box<dyn Program>> {
    stackflow::programs::find(name).ok_or_else(|| {
        let available: Vec<String> = stackflow::programs::all()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        anyhow::anyhow!(
            "Unknown program '{}'\nAvailable programs: {}",
            name,
            available.join(", ")
        )
    })
}

/// Load the stack configuration and report where it came from
pub fn load_config(project_root: &Path, stack: &StackName) -> anyhow::Result<ConfigStore> {
    match stackflow_config::find_stack_config(project_root, stack.as_str())? {
        Some(path) => {
            eprintln!("📄 Config: {}", path.display().to_string().cyan());
            Ok(ConfigStore::load(&path)?)
        }
        None => {
            eprintln!("📄 Config: {}", "(none, using defaults)".dimmed());
            Ok(ConfigStore::new())
        }
    }
}

/// Print exports as `name: value`, strings without quotes
pub fn print_outputs(outputs: &BTreeMap<String, Value>) {
    if outputs.is_empty() {
        println!("  {}", "(no outputs)".dimmed());
        return;
    }
    let width = outputs.keys().map(String::len).max().unwrap_or(0);
    for (name, value) in outputs {
        let rendered = match value {
            Value::String(s) if s.contains('\n') => format!("\n{}", indent(s, 6)),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        println!("    {:width$}  {}", name.cyan(), rendered, width = width);
    }
}

fn indent(text: &str, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    text.lines()
        .map(|line| format!("{}{}", pad, line))
        .collect::<Vec<_>>()
        .join("\n")
}
