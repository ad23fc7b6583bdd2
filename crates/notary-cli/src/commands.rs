use anyhow::anyhow;
use colored::Colorize;
use notary_host::{Host, HostConfig, Response};
use serde_json::Value;

use crate::cli::*;
use crate::state;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let (function, response) = execute(&cli)?;
    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
        OutputFormat::Text => print_text(&function, &response),
    }
    Ok(())
}

/// Load state, run the command's invocation, and save state if it succeeded.
pub fn execute(cli: &Cli) -> anyhow::Result<(String, Response)> {
    let config = match &cli.config {
        Some(path) => HostConfig::load(path)?,
        None => HostConfig::default(),
    };
    let (function, args) = cli.command.invocation();

    let host = Host::new(state::load(&cli.state)?, config)?;
    let response = host
        .invoke(&function, &args)
        .map_err(|e| anyhow!("{} [{}]", e, e.kind()))?;
    state::save(&cli.state, host.ledger())?;
    Ok((function, response))
}

fn print_text(function: &str, response: &Response) {
    println!(
        "{} {} {}",
        "✓".green().bold(),
        function.bold(),
        format!("tx {}", response.tx_id.short_id()).dimmed()
    );
    let Some(payload) = &response.payload else {
        return;
    };
    match payload {
        Value::Array(items) if items.is_empty() => println!("  (none)"),
        Value::Array(items) => {
            for item in items {
                println!("  {}", summarize(item));
            }
        }
        Value::Object(map) if map.contains_key("users") && map.contains_key("assets") => {
            print_index_audit(&map["users"]);
            print_index_audit(&map["assets"]);
        }
        other => println!("  {}", summarize(other)),
    }
}

fn print_index_audit(audit: &Value) {
    let index = audit["index"].as_str().unwrap_or("?");
    let listed = audit["listed"].as_u64().unwrap_or(0);
    let dangling = audit["dangling"].as_array().map(Vec::len).unwrap_or(0);
    let duplicates = audit["duplicates"].as_array().map(Vec::len).unwrap_or(0);
    if dangling == 0 && duplicates == 0 {
        println!("  {}: {} entries, {}", index.bold(), listed, "clean".green());
    } else {
        println!(
            "  {}: {} entries, {} dangling {}, {} duplicate {}",
            index.bold(),
            listed,
            dangling.to_string().red(),
            audit["dangling"],
            duplicates.to_string().red(),
            audit["duplicates"]
        );
    }
}

/// One-line rendering of a record, profile, receipt or history entry.
fn summarize(value: &Value) -> String {
    if value.get("IsDelete") == Some(&Value::Bool(true)) {
        return format!("{} deleted", value["Timestamp"]).red().to_string();
    }
    if let Some(inner) = value.get("Value") {
        return format!("{} {}", value["Timestamp"].to_string().dimmed(), summarize(inner));
    }
    if let (Some(from), Some(to), Some(asset)) =
        (value.get("From"), value.get("To"), value.get("Asset"))
    {
        return format!(
            "{} -> {}  {} now {} / {}",
            summarize(from),
            summarize(to),
            asset["AssetID"].as_str().unwrap_or("?").yellow(),
            from["Balance"],
            to["Balance"]
        );
    }
    if let Some(user_id) = value.get("UserID").and_then(Value::as_str) {
        if let Some(balance) = value.get("Balance") {
            let mut line = format!(
                "{} {} {}  balance {}",
                user_id.yellow(),
                value["UserName"].as_str().unwrap_or(""),
                value["UserSurname"].as_str().unwrap_or(""),
                balance
            );
            if let Some(assets) = value.get("AssetList").and_then(Value::as_array) {
                let ids: Vec<&str> = assets.iter().filter_map(|a| a["AssetID"].as_str()).collect();
                line.push_str(&format!("  assets [{}]", ids.join(", ")));
            }
            return line;
        }
    }
    if let Some(asset_id) = value.get("AssetID").and_then(Value::as_str) {
        return format!(
            "{} ({}) owned by {}",
            asset_id.yellow(),
            value["AssetType"].as_str().unwrap_or(""),
            value["OwnerUserID"].as_str().unwrap_or("?")
        );
    }
    value.to_string()
}
