//! Lorevine CLI - Command-line interface for the knowledge lineage store
//!
//! Usage: lorevine-cli [OPTIONS] <COMMAND>
//!
//! Inspection and maintenance for the game database. Supports JSON output
//! for scripting.

use clap::{Parser, Subcommand};
use lorevine_lib::db::{Category, Database, Knowledge};
use lorevine_lib::{genealogy, layout, orphans, seeds, settings};
use std::collections::HashMap;
use std::path::PathBuf;

// ============================================================================
// Main CLI Structure
// ============================================================================

#[derive(Parser)]
#[command(name = "lorevine-cli")]
#[command(version, about = "Lorevine knowledge lineage CLI", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Database path (default: auto-detect)
    #[arg(long, global = true)]
    db: Option<String>,

    /// Output as JSON for scripting
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List knowledge entries, newest first
    List {
        /// Filter by category (science, art, history, nature, philosophy, misc)
        #[arg(long)]
        category: Option<String>,
    },
    /// Show one knowledge entry in full
    Show {
        /// Knowledge ID
        id: String,
    },
    /// Show the lineage of a knowledge entry
    Genealogy {
        /// Knowledge ID
        id: String,
        /// ancestors, descendants, or both
        #[arg(long, default_value = "both")]
        direction: String,
    },
    /// List knowledge unreachable from any seed
    Orphans {
        /// Delete the orphans instead of listing them
        #[arg(long)]
        delete: bool,
    },
    /// Dump tree layout coordinates
    Tree {
        /// layered or centered
        #[arg(long, default_value = "layered")]
        strategy: String,
        /// Filter by category
        #[arg(long)]
        category: Option<String>,
    },
    /// Delete knowledge entries by exact title
    Delete {
        /// Title to match
        #[arg(long)]
        title: String,
    },
    /// Show the bootstrapped seed entries
    Seed,
    /// Read or change settings
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all settings
    List,
    /// Get a setting value
    Get {
        /// Setting key
        key: String,
    },
    /// Set a setting value
    Set {
        /// Setting key
        key: String,
        /// Setting value
        value: String,
    },
}

// ============================================================================
// Entry point
// ============================================================================

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run_cli(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> Result<(), String> {
    // Settings first: the database cascade consults the custom path
    let app_data_dir = dirs::data_dir()
        .map(|p| p.join("lorevine"))
        .unwrap_or_else(|| PathBuf::from("."));
    settings::init(app_data_dir);

    match cli.command {
        // Config touches only the settings file, never the database
        Commands::Config { cmd } => handle_config(cmd, cli.json),
        command => {
            let db_path = cli.db.map(PathBuf::from).unwrap_or_else(find_database);
            let db = Database::new(&db_path)
                .map_err(|e| format!("Failed to open database: {}", e))?;
            run_db_command(command, &db, cli.json)
        }
    }
}

fn run_db_command(command: Commands, db: &Database, json: bool) -> Result<(), String> {
    match command {
        Commands::List { category } => handle_list(category.as_deref(), db, json),
        Commands::Show { id } => handle_show(&id, db, json),
        Commands::Genealogy { id, direction } => handle_genealogy(&id, &direction, db, json),
        Commands::Orphans { delete } => handle_orphans(delete, db, json),
        Commands::Tree { strategy, category } => {
            handle_tree(&strategy, category.as_deref(), db, json)
        }
        Commands::Delete { title } => handle_delete(&title, db, json),
        Commands::Seed => handle_seed(db, json),
        Commands::Config { .. } => unreachable!(),
    }
}

// ============================================================================
// Command handlers
// ============================================================================

fn parse_category(raw: &str) -> Result<Category, String> {
    Category::from_str(raw).ok_or_else(|| {
        format!(
            "Unknown category: {} (use science, art, history, nature, philosophy, or misc)",
            raw
        )
    })
}

fn handle_list(category: Option<&str>, db: &Database, json: bool) -> Result<(), String> {
    let rows = match category {
        Some(raw) => db
            .list_by_category(parse_category(raw)?)
            .map_err(|e| e.to_string())?,
        None => db.list_all().map_err(|e| e.to_string())?,
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&rows).map_err(|e| e.to_string())?
        );
    } else if rows.is_empty() {
        println!("No knowledge entries found.");
    } else {
        println!("Knowledge entries ({}):\n", rows.len());
        for k in &rows {
            println!(
                "  {} gen {}  {}  [{}] {}",
                k.category.emoji(),
                k.generation,
                k.id,
                k.category.as_str(),
                k.title
            );
        }
    }

    Ok(())
}

fn handle_show(id: &str, db: &Database, json: bool) -> Result<(), String> {
    let knowledge = db
        .get_by_id(id)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("Knowledge '{}' not found", id))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&knowledge).map_err(|e| e.to_string())?
        );
        return Ok(());
    }

    println!("{} {}", knowledge.category.emoji(), knowledge.title);
    println!("id:          {}", knowledge.id);
    println!(
        "category:    {} ({})",
        knowledge.category.as_str(),
        knowledge.category.label()
    );
    println!("generation:  {}", knowledge.generation);
    println!(
        "parent:      {}",
        knowledge.parent_id.as_deref().unwrap_or("none")
    );
    println!(
        "created:     {} by {}",
        knowledge.created_at, knowledge.created_by
    );
    println!("children:    {}", knowledge.children_count);
    println!("times shown: {}", knowledge.times_shown);
    println!();
    println!("{}", knowledge.description);

    if !knowledge.chat_log.is_empty() {
        println!();
        println!("Chat log ({} messages):", knowledge.chat_log.len());
        for msg in &knowledge.chat_log {
            println!("  [{}] {}", msg.role.as_str(), msg.content);
        }
    }

    Ok(())
}

fn handle_genealogy(id: &str, direction: &str, db: &Database, json: bool) -> Result<(), String> {
    let direction = genealogy::Direction::from_str(direction).ok_or_else(|| {
        format!(
            "Unknown direction: {} (use ancestors, descendants, or both)",
            direction
        )
    })?;

    let all = db.list_all().map_err(|e| e.to_string())?;
    let view = genealogy::resolve_genealogy(&all, id, direction);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&view).map_err(|e| e.to_string())?
        );
        return Ok(());
    }

    if view.target.is_none() {
        println!("Knowledge '{}' not found.", id);
        return Ok(());
    }

    println!(
        "Lineage of '{}' ({} generations):\n",
        id, view.total_generations
    );
    for k in &view.genealogy {
        let marker = if k.id == id { "->" } else { "  " };
        println!(
            "{} gen {}  {} {}  ({})",
            marker,
            k.generation,
            k.category.emoji(),
            k.title,
            k.id
        );
    }

    Ok(())
}

fn handle_orphans(delete: bool, db: &Database, json: bool) -> Result<(), String> {
    if delete {
        let report = orphans::cleanup_orphans(db).map_err(|e| e.to_string())?;

        if json {
            println!(
                "{}",
                serde_json::to_string(&report).map_err(|e| e.to_string())?
            );
        } else if report.deleted_count == 0 {
            println!("No orphaned knowledge found.");
        } else {
            println!("Deleted {} orphaned entries:", report.deleted_count);
            for id in &report.deleted_ids {
                println!("  {}", id);
            }
        }
        return Ok(());
    }

    let all = db.list_all().map_err(|e| e.to_string())?;
    let report = orphans::find_orphans(&all);

    if json {
        println!(
            "{}",
            serde_json::to_string(&report).map_err(|e| e.to_string())?
        );
    } else if report.orphan_ids.is_empty() {
        println!("No orphaned knowledge found.");
    } else {
        let by_id: HashMap<&str, &Knowledge> = all.iter().map(|k| (k.id.as_str(), k)).collect();
        println!("Orphaned knowledge ({}):\n", report.orphan_ids.len());
        for id in &report.orphan_ids {
            if let Some(k) = by_id.get(id.as_str()) {
                println!("  {} gen {}  {}", k.id, k.generation, k.title);
            }
        }
        println!("\nRun with --delete to remove them.");
    }

    Ok(())
}

fn handle_tree(
    strategy: &str,
    category: Option<&str>,
    db: &Database,
    json: bool,
) -> Result<(), String> {
    let strategy = layout::LayoutStrategy::from_str(strategy)
        .ok_or_else(|| format!("Unknown strategy: {} (use layered or centered)", strategy))?;

    let nodes = match category {
        Some(raw) => db
            .list_by_category(parse_category(raw)?)
            .map_err(|e| e.to_string())?,
        None => db.list_all().map_err(|e| e.to_string())?,
    };

    let tree = layout::build_layout(&nodes, strategy);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&tree).map_err(|e| e.to_string())?
        );
        return Ok(());
    }

    println!(
        "{} layout: {} nodes, {} edges, canvas {:.0}x{:.0}\n",
        strategy.as_str(),
        tree.nodes.len(),
        tree.edges.len(),
        tree.canvas_width,
        tree.canvas_height
    );
    for node in &tree.nodes {
        println!("  ({:>6.0}, {:>5.0})  {}", node.x, node.y, node.id);
    }

    Ok(())
}

fn handle_delete(title: &str, db: &Database, json: bool) -> Result<(), String> {
    let deleted = db.delete_by_title(title).map_err(|e| e.to_string())?;

    if json {
        println!(r#"{{"deletedCount":{}}}"#, deleted);
    } else if deleted == 0 {
        println!("No entries titled '{}'.", title);
    } else {
        println!("Deleted {} entries titled '{}'.", deleted, title);
    }

    Ok(())
}

fn handle_seed(db: &Database, json: bool) -> Result<(), String> {
    // Opening the database already bootstraps missing seeds; report them.
    let seed_rows = db.list_seeds().map_err(|e| e.to_string())?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&seed_rows).map_err(|e| e.to_string())?
        );
        return Ok(());
    }

    println!(
        "Seed knowledge ({} of {} expected):\n",
        seed_rows.len(),
        seeds::seed_knowledge().len()
    );
    for k in &seed_rows {
        println!(
            "  {} {}  [{}] {}  (shown {}x, {} children)",
            k.category.emoji(),
            k.id,
            k.category.as_str(),
            k.title,
            k.times_shown,
            k.children_count
        );
    }

    Ok(())
}

fn handle_config(cmd: ConfigCommands, json: bool) -> Result<(), String> {
    match cmd {
        ConfigCommands::List => {
            let anthropic = settings::has_api_key();
            let db_path = settings::get_custom_db_path();
            let model = settings::get_ai_model();
            let usage = settings::get_usage_stats();

            if json {
                println!(
                    r#"{{"anthropic_api_key":{},"db_path":{},"model":"{}","total_input_tokens":{},"total_output_tokens":{},"synthesis_runs":{}}}"#,
                    anthropic,
                    db_path
                        .as_ref()
                        .map(|p| format!("\"{}\"", p))
                        .unwrap_or("null".to_string()),
                    model,
                    usage.total_input_tokens,
                    usage.total_output_tokens,
                    usage.synthesis_runs
                );
            } else {
                println!(
                    "anthropic-api-key: {}",
                    if anthropic { "set" } else { "not set" }
                );
                println!(
                    "db-path:           {}",
                    db_path.as_deref().unwrap_or("auto-detect")
                );
                println!("model:             {}", model);
                println!(
                    "usage:             {} in / {} out tokens over {} synthesis calls",
                    usage.total_input_tokens, usage.total_output_tokens, usage.synthesis_runs
                );
            }
        }
        ConfigCommands::Get { key } => {
            let value: String = match key.as_str() {
                "anthropic-api-key" => settings::get_masked_api_key()
                    .unwrap_or_else(|| "not set".to_string()),
                "db-path" => settings::get_custom_db_path()
                    .unwrap_or_else(|| "auto-detect".to_string()),
                "model" => settings::get_ai_model(),
                _ => return Err(format!("Unknown config key: {}", key)),
            };

            if json {
                println!(r#"{{"{}":"{}"}}"#, key, value);
            } else {
                println!("{}", value);
            }
        }
        ConfigCommands::Set { key, value } => {
            match key.as_str() {
                "anthropic-api-key" => settings::set_api_key(value.clone())?,
                "db-path" => {
                    let path = if value.is_empty() { None } else { Some(value.clone()) };
                    settings::set_custom_db_path(path)?;
                }
                "model" => settings::set_ai_model(value.clone())?,
                _ => return Err(format!("Unknown config key: {}", key)),
            }

            if json {
                println!(r#"{{"status":"ok"}}"#);
            } else {
                println!("Set {} = {}", key, value);
            }
        }
    }

    Ok(())
}

// ============================================================================
// Database path resolution
// ============================================================================

fn find_database() -> PathBuf {
    // 1. Environment variable
    if let Ok(path) = std::env::var("LOREVINE_DB") {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // 2. Walk up directory tree for .lorevine.db
    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        loop {
            let candidate = dir.join(".lorevine.db");
            if candidate.exists() {
                return candidate;
            }
            match dir.parent() {
                Some(p) => dir = p,
                None => break,
            }
        }
    }

    // 3. Custom path from settings
    if let Some(custom) = settings::get_custom_db_path() {
        if !custom.is_empty() {
            return PathBuf::from(custom);
        }
    }

    // 4. Default app data directory
    dirs::data_dir()
        .map(|p| p.join("lorevine/lorevine.db"))
        .unwrap_or_else(|| PathBuf::from("lorevine.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_genealogy_direction_defaults_to_both() {
        let cli = Cli::try_parse_from(["lorevine-cli", "genealogy", "seed-001"])
            .expect("should parse without --direction");
        match cli.command {
            Commands::Genealogy { id, direction } => {
                assert_eq!(id, "seed-001");
                assert_eq!(direction, "both");
            }
            _ => panic!("expected Genealogy"),
        }
    }

    #[test]
    fn test_tree_strategy_defaults_to_layered() {
        let cli = Cli::try_parse_from(["lorevine-cli", "tree"]).expect("should parse bare tree");
        match cli.command {
            Commands::Tree { strategy, category } => {
                assert_eq!(strategy, "layered");
                assert!(category.is_none());
            }
            _ => panic!("expected Tree"),
        }
    }

    #[test]
    fn test_global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["lorevine-cli", "list", "--json", "--db", "/tmp/x.db"])
            .expect("global flags should work after the subcommand");
        assert!(cli.json);
        assert_eq!(cli.db.as_deref(), Some("/tmp/x.db"));
    }

    #[test]
    fn test_delete_requires_title() {
        assert!(Cli::try_parse_from(["lorevine-cli", "delete"]).is_err());
        let cli = Cli::try_parse_from(["lorevine-cli", "delete", "--title", "Silent Harmony"])
            .expect("should parse with --title");
        match cli.command {
            Commands::Delete { title } => assert_eq!(title, "Silent Harmony"),
            _ => panic!("expected Delete"),
        }
    }
}
