//! `get`, `set` and `presets` commands.

use std::path::Path;

use anyhow::{bail, Context, Result};
use trellis_config::log_cli_info;
use trellis_state::presets::available_presets;
use trellis_state::{StateContainer, Value};

fn open(file: &Path) -> Result<StateContainer> {
    let state = StateContainer::default();
    state
        .load_json(file)
        .with_context(|| format!("Failed to load {}", file.display()))?;
    Ok(state)
}

pub fn cmd_get(file: &Path, paths: &[String]) -> Result<()> {
    let state = open(file)?;
    let values = state.bulk_read(paths);

    for (path, value) in paths.iter().zip(values) {
        match value {
            Some(value) => println!("{} = {}", path, serde_json::to_string(&value)?),
            None => println!("{} (not found)", path),
        }
    }
    Ok(())
}

pub fn cmd_set(file: &Path, assignments: &[String]) -> Result<()> {
    let pairs = assignments
        .iter()
        .map(|a| parse_assignment(a))
        .collect::<Result<Vec<_>>>()?;

    let state = open(file)?;
    let total = pairs.len();
    let applied = state.bulk_write(pairs);
    state
        .save_json(file)
        .with_context(|| format!("Failed to save {}", file.display()))?;

    log_cli_info!("State updated", applied = applied, requested = total);
    println!("Applied {}/{} assignments to {}", applied, total, file.display());
    if applied < total {
        bail!("{} assignment(s) did not resolve", total - applied);
    }
    Ok(())
}

pub fn cmd_presets(dir: &Path, include_default: bool) -> Result<()> {
    for (name, path) in available_presets(dir, include_default) {
        let label = if name.is_empty() { "(default)" } else { name.as_str() };
        println!("{:<24} {}", label, path.display());
    }
    Ok(())
}

/// Split `PATH=VALUE`; VALUE is JSON when it parses, a plain string otherwise.
fn parse_assignment(text: &str) -> Result<(String, Value)> {
    let Some((path, raw)) = text.split_once('=') else {
        bail!("Expected PATH=VALUE, got {:?}", text);
    };
    let value = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(json) => Value::from(json),
        Err(_) => Value::from(raw),
    };
    Ok((path.to_string(), value))
}
