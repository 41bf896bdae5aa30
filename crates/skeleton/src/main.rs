//! skeleton - Generate directory trees from templates
//!
//! Commands:
//! - apply <TARGET> <TEMPLATE>...: Apply a base template plus extensions
//! - list: List available templates
//! - vars <TEMPLATE>: Show declaration tokens used by a template

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use skeleton::{list_templates, Template, Variables};
use skeleton_core::{Config, Paths, SEARCH_PATH_ENV};

#[derive(Parser)]
#[command(name = "skeleton")]
#[command(about = "Generate and merge directory trees from skeleton templates")]
#[command(version)]
#[command(after_help = r#"MERGE TAGS:
    name.__APPEND__.ext     Append to an existing name.ext
    name.__PREPEND__.ext    Prepend to an existing name.ext
    name.__BLOCK__.ext      Insert at SKELBLOCK_BLOCK in an existing name.ext

SEARCH PATH:
    --path DIR, then $SKELETON_PATH, then search_path in config.json,
    then the user templates directory.

EXAMPLES:
    skeleton apply ./myapp python.base python.cli --var SKELNAME=myapp
    skeleton apply ./myapp python.docker --save-vars --var SKELPORT=8000
    skeleton list
"#)]
struct Cli {
    /// Extra template root searched first (repeatable)
    #[arg(long = "path", value_name = "DIR", global = true)]
    paths: Vec<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a template and its extensions to a directory
    Apply {
        /// Target directory (created if missing)
        target: PathBuf,

        /// Base template, followed by extensions
        #[arg(required = true)]
        templates: Vec<String>,

        /// Set template variable (KEY=VALUE)
        #[arg(long = "var", value_name = "KEY=VALUE")]
        vars: Vec<String>,

        /// Store the given variables in the target's .skelvars first
        #[arg(long)]
        save_vars: bool,
    },

    /// List available templates
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show declaration tokens used by a template
    Vars {
        /// Template name
        template: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let search_path = build_search_path(&cli.paths)?;

    match cli.command {
        Some(Commands::Apply {
            target,
            templates,
            vars,
            save_vars,
        }) => cmd_apply(&search_path, &target, &templates, &vars, save_vars),

        Some(Commands::List { json }) => cmd_list(&search_path, json),

        Some(Commands::Vars { template }) => cmd_vars(&search_path, &template),

        None => cmd_list(&search_path, false),
    }
}

fn build_search_path(explicit: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let paths = Paths::new();
    let config = Config::load(&paths)?;
    let env = std::env::var_os(SEARCH_PATH_ENV);

    let search_path = config.search_path(explicit, env.as_deref(), &paths);
    tracing::debug!("Search path: {:?}", search_path);
    Ok(search_path)
}

/// Apply templates to a target directory
fn cmd_apply(
    search_path: &[PathBuf],
    target: &Path,
    templates: &[String],
    pairs: &[String],
    save_vars: bool,
) -> Result<()> {
    let vars = Variables::from_pairs(pairs)?;

    if save_vars {
        std::fs::create_dir_all(target)
            .with_context(|| format!("Failed to create target: {}", target.display()))?;
        let mut saved = Variables::load(target)?;
        saved.overlay(&vars);
        saved.save(target)?;
        println!("info: Saved {} variables to {}", saved.len(), target.display());
    }

    println!("info: Applying {} to {}", templates.join(" + "), target.display());

    let report = skeleton::create(templates, target, vars, search_path)
        .with_context(|| format!("Failed to apply templates to {}", target.display()))?;

    println!(
        "success: {} entries merged ({} new)",
        report.objects, report.effective
    );

    Ok(())
}

/// List all available templates
fn cmd_list(search_path: &[PathBuf], json: bool) -> Result<()> {
    let templates = list_templates(search_path)?;

    if json {
        let json_output: Vec<_> = templates
            .iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "path": t.root.to_string_lossy(),
                    "description": t.description(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json_output)?);
        return Ok(());
    }

    println!("\x1b[1mAvailable Templates\x1b[0m");
    println!();

    if templates.is_empty() {
        println!("\x1b[2mNo templates found.\x1b[0m");
        println!("Searched:");
        for root in search_path {
            println!("  {}", root.display());
        }
        return Ok(());
    }

    for t in &templates {
        println!("  \x1b[32m{}\x1b[0m", t.name);
        if t.description() != "No description" {
            println!("    \x1b[2m{}\x1b[0m", t.description());
        }
    }

    Ok(())
}

/// Show declaration tokens used in a template
fn cmd_vars(search_path: &[PathBuf], template_name: &str) -> Result<()> {
    let template = Template::new(template_name, search_path)?;

    println!("\x1b[1mTemplate Variables: {}\x1b[0m", template.name);
    println!("\x1b[2mPath: {}\x1b[0m", template.root.display());
    println!();

    if let Some(ref metadata) = template.metadata {
        if !metadata.variables.is_empty() {
            println!("\x1b[36mDeclared in skeleton.json:\x1b[0m");
            for var in &metadata.variables {
                println!("  {}", var);
            }
            println!();
        }
    }

    let vars = template.find_variables()?;

    println!("\x1b[36mTokens Used in Template:\x1b[0m");
    if vars.is_empty() {
        println!("  (none found)");
    } else {
        for var in &vars {
            println!("  {}", var);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_apply_args() {
        let cli = Cli::parse_from([
            "skeleton",
            "apply",
            "out",
            "base",
            "ext",
            "--var",
            "SKELNAME=demo",
            "--path",
            "/tpl",
        ]);

        assert_eq!(cli.paths, vec![PathBuf::from("/tpl")]);
        match cli.command {
            Some(Commands::Apply {
                target,
                templates,
                vars,
                save_vars,
            }) => {
                assert_eq!(target, PathBuf::from("out"));
                assert_eq!(templates, vec!["base".to_string(), "ext".to_string()]);
                assert_eq!(vars, vec!["SKELNAME=demo".to_string()]);
                assert!(!save_vars);
            }
            _ => panic!("expected apply"),
        }
    }
}
