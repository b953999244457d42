use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use serde_json::Value;

use prov_gate::{AttributeIdentity, IdentityProvider};
use prov_ledger::{CommandRegistry, Ledger, LedgerConfig, LedgerService};
use prov_store::FileKvStore;
use prov_types::Actor;

use crate::cli::{Cli, Command, OutputFormat};

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let registry = Arc::new(CommandRegistry::standard()?);
    match cli.command {
        Command::Commands => {
            print!("{}", render_commands(&registry));
            Ok(())
        }
        Command::Invoke(args) => {
            let actor = AttributeIdentity::default()
                .with("username", args.actor)
                .with("role", args.role)
                .actor()?;
            let config = load_config(cli.config.as_deref())?;
            let out = execute(&cli.store, config, registry, Some(actor), &args.command, args.args).await?;
            print_output(&args.command, &out, &cli.format)
        }
        Command::Query(args) => {
            let config = load_config(cli.config.as_deref())?;
            let out = execute(&cli.store, config, registry, None, &args.command, args.args).await?;
            print_output(&args.command, &out, &cli.format)
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<LedgerConfig> {
    match path {
        Some(path) => LedgerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(LedgerConfig::default()),
    }
}

/// Open the store, run one command through the single-writer service, and
/// shut the service down.
async fn execute(
    store_path: &Path,
    config: LedgerConfig,
    registry: Arc<CommandRegistry>,
    actor: Option<Actor>,
    command: &str,
    args: Vec<String>,
) -> anyhow::Result<Value> {
    let store = FileKvStore::open(store_path)
        .with_context(|| format!("opening ledger store {}", store_path.display()))?;
    let span = tracing::info_span!("ledger", store = %store_path.display());
    let ledger = Arc::new(Ledger::new(Arc::new(store), config, span.clone()));

    let (handle, task) = LedgerService::spawn(ledger, registry, span);
    let result = handle.submit(actor, command, args).await;
    drop(handle);
    task.await.context("ledger service task failed")?;

    result.with_context(|| format!("{command} failed"))
}

fn print_output(command: &str, value: &Value, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => print!("{}", render_text(command, value)?),
    }
    Ok(())
}

fn render_commands(registry: &CommandRegistry) -> String {
    let mut out = String::new();
    for spec in registry.iter() {
        let role = match spec.role {
            Some(role) => role.to_string().yellow().to_string(),
            None if spec.requires_caller => "any actor".dimmed().to_string(),
            None => "open".dimmed().to_string(),
        };
        out.push_str(&format!(
            "{:<20} {:<16} {}\n",
            spec.name.bold(),
            role,
            spec.params.join(" ")
        ));
    }
    out
}

fn render_text(command: &str, value: &Value) -> anyhow::Result<String> {
    let mut out = String::new();
    match command {
        "getChain" => {
            let events = value.as_array().map(Vec::as_slice).unwrap_or_default();
            if events.is_empty() {
                out.push_str("Chain is empty.\n");
            }
            for (i, event) in events.iter().enumerate() {
                out.push_str(&format!(
                    "{:>3}. {:<9} {}  block {}{}\n",
                    i + 1,
                    text(&event["type"]).cyan(),
                    text(&event["value"]).bold(),
                    text(&event["block"]),
                    link_suffix(&event["linkReference"]),
                ));
            }
        }
        "verifyChain" => {
            let key = text(&value["chain_key"]);
            let violations = value["violations"].as_array().map(Vec::as_slice).unwrap_or_default();
            if violations.is_empty() {
                out.push_str(&format!(
                    "{} {} verified ({} events, {} sealed)\n",
                    "✓".green().bold(),
                    key.bold(),
                    value["length"],
                    value["sealed"]
                ));
            } else {
                out.push_str(&format!("{} {} has {} violation(s)\n", "✗".red().bold(), key.bold(), violations.len()));
                for v in violations {
                    out.push_str(&format!(
                        "  seq {}: {} {}\n",
                        v["seq"],
                        text(&v["kind"]).red(),
                        text(&v["description"])
                    ));
                }
            }
        }
        "getTransfers" => {
            let records = value.as_array().map(Vec::as_slice).unwrap_or_default();
            if records.is_empty() {
                out.push_str("No transfers.\n");
            }
            for r in records {
                out.push_str(&format!(
                    "{}  {} {} → {}  {}\n",
                    text(&r["date"]).dimmed(),
                    text(&r["id"]).bold(),
                    text(&r["from"]),
                    text(&r["to"]),
                    text(&r["description"]),
                ));
            }
        }
        _ if value.get("chainKey").is_some() => {
            out.push_str(&format!(
                "{} Created {} {} (chain {})\n",
                "✓".green().bold(),
                text(&value["kind"]),
                text(&value["key"]).bold(),
                text(&value["chainKey"]).yellow()
            ));
            for linked in value["linked"].as_array().map(Vec::as_slice).unwrap_or_default() {
                out.push_str(&format!("  linked → {}\n", text(linked).yellow()));
            }
        }
        _ if value.get("from").is_some() && value.get("to").is_some() => {
            out.push_str(&format!(
                "{} Transferred {} from {} to {} on {}\n",
                "✓".green().bold(),
                text(&value["id"]).bold(),
                text(&value["from"]),
                text(&value["to"]),
                text(&value["date"])
            ));
        }
        _ => match value {
            Value::Null => out.push_str(&format!("{}\n", "(absent)".dimmed())),
            Value::String(s) => out.push_str(&format!("{s}\n")),
            Value::Array(items) if items.iter().all(Value::is_string) => {
                if items.is_empty() {
                    out.push_str("(none)\n");
                }
                for item in items {
                    out.push_str(&format!("{}\n", text(item)));
                }
            }
            other => out.push_str(&format!("{}\n", serde_json::to_string_pretty(other)?)),
        },
    }
    Ok(out)
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn link_suffix(value: &Value) -> String {
    match value.as_str() {
        Some(link) if !link.is_empty() => format!("  link {}", link.dimmed()),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chain_rendering_lists_events_in_order() {
        let chain = json!([
            {"block": "1", "type": "Create", "value": "T01", "linkReference": ""},
            {"block": "2", "type": "Transform", "value": "RM01", "linkReference": "lot-7"},
        ]);
        let out = render_text("getChain", &chain).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("T01"));
        assert!(lines[1].contains("RM01"));
        assert!(lines[1].contains("lot-7"));
    }

    #[test]
    fn empty_chain_and_lists() {
        assert!(render_text("getChain", &json!([])).unwrap().contains("empty"));
        assert!(render_text("getAllOfKind", &json!([])).unwrap().contains("none"));
        assert!(render_text("read", &Value::Null).unwrap().contains("absent"));
    }

    #[test]
    fn created_rendering_shows_links() {
        let created = json!({
            "kind": "package",
            "key": "FP01",
            "chainKey": "package-FP01",
            "linked": ["processed-RM01", "animal-T01"],
        });
        let out = render_text("createPackagedGood", &created).unwrap();
        assert!(out.contains("FP01"));
        assert!(out.contains("processed-RM01"));
        assert!(out.contains("animal-T01"));
    }

    #[test]
    fn verify_rendering_reports_violations() {
        let report = json!({
            "chain_key": "animal-T01",
            "length": 2,
            "sealed": 2,
            "violations": [{"seq": 2, "kind": "DigestMismatch", "description": "bad"}],
        });
        let out = render_text("verifyChain", &report).unwrap();
        assert!(out.contains("1 violation"));
        assert!(out.contains("DigestMismatch"));
    }

    #[test]
    fn command_listing_names_every_command() {
        let registry = CommandRegistry::standard().unwrap();
        let out = render_commands(&registry);
        for name in ["createAnimal", "transferItem", "getChain", "verifyChain"] {
            assert!(out.contains(name));
        }
    }

    #[tokio::test]
    async fn execute_against_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let registry = Arc::new(CommandRegistry::standard().unwrap());
        let farmer = Actor::new("FarmerA", prov_types::RoleKind::Farmer);
        let args: Vec<String> = [
            "bovine", "angus", "A1", "T01", "2024-01-01", "400", "FarmerA", "alive", "1", "",
            "", "organic",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        execute(&path, LedgerConfig::default(), registry.clone(), Some(farmer), "createAnimal", args)
            .await
            .unwrap();
        let all = execute(
            &path,
            LedgerConfig::default(),
            registry,
            None,
            "getAllOfKind",
            vec!["animal".into()],
        )
        .await
        .unwrap();
        assert_eq!(all, json!(["T01"]));
    }
}
