use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fixkit_config::ConfigLoader;
use fixkit_engine::{ActionKind, ConfirmationPrompt, Engine, FlatpakDirection};
use fixkit_plugins::{PluginDescriptor, PluginLoader, PluginRegistry};
use fixkit_security::{CommandScanner, RuleSet, ScanVerdict};

mod terminal;

use terminal::{AutoConfirm, HeadlessHost, PrintingNotifier, PrintingView, TerminalPrompt};

#[derive(Parser)]
#[command(name = "fixkit", version, about = "Fixkit - handy tweaks for your desktop")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List discovered plugins by category
    Plugins,

    /// Show the merged suspicious-command rules
    Rules,

    /// Scan a plugin's commands without running anything
    Scan {
        /// Plugin name, or category/name when ambiguous
        plugin: String,
    },

    /// Probe what activating a plugin would do
    Status {
        /// Plugin name, or category/name when ambiguous
        plugin: String,
    },

    /// Resolve and run a plugin's action
    Run {
        /// Plugin name, or category/name when ambiguous
        plugin: String,

        /// Answer yes to every confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_loader = ConfigLoader::new()?;
    config_loader.ensure_dirs()?;
    let config = config_loader.load()?;

    let level = cli
        .log_level
        .clone()
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level)),
        )
        .init();

    let rules = config_loader.merged_rules(&config);
    let registry = PluginLoader::new(config.resolved_plugin_dirs()).discover()?;

    match cli.command {
        Commands::Plugins => {
            if registry.is_empty() {
                println!("No plugins found. Looked in:");
                for dir in config.resolved_plugin_dirs() {
                    println!("  {}", dir.display());
                }
                return Ok(());
            }

            for category in registry.categories() {
                println!("{category}:");
                for plugin in registry.plugins_in(category) {
                    println!(
                        "  {} - {} {}",
                        plugin.name,
                        plugin.label,
                        plugin.description.as_deref().unwrap_or_default()
                    );
                }
            }
        }

        Commands::Rules => {
            if rules.is_empty() {
                println!("No rules loaded; command scanning is disabled.");
                return Ok(());
            }

            println!("{} rule(s), in priority order:", rules.len());
            for rule in rules.rules() {
                println!("  {}", rule.description);
                for variation in &rule.variations {
                    println!("    {variation}");
                }
            }
        }

        Commands::Scan { plugin } => {
            let plugin = find_plugin(&registry, &plugin)?;
            let scanner = CommandScanner::new(&rules);
            let scripts = &plugin.scripts;

            let mut flagged = 0;
            for (kind, script) in [
                ("exec", &scripts.exec),
                ("undo", &scripts.undo),
                ("status", &scripts.status),
                ("show", &scripts.show),
            ] {
                let Some(command) = script.as_ref().and_then(|s| s.command.as_deref()) else {
                    continue;
                };
                match scanner.scan(&plugin, command) {
                    ScanVerdict::Clean => println!("{kind}: clean"),
                    ScanVerdict::Flagged {
                        statement,
                        description,
                    } => {
                        flagged += 1;
                        println!("{kind}: flagged - '{statement}' might {description}");
                    }
                }
            }

            if flagged > 0 {
                bail!("{flagged} command(s) flagged");
            }
        }

        Commands::Status { plugin } => {
            let plugin = find_plugin(&registry, &plugin)?;
            let engine = build_engine(&rules, false);

            if plugin.flatpak.is_some() {
                match engine.flatpak().probe(&plugin).await {
                    Some(FlatpakDirection::Uninstall) => {
                        println!("{}: installed; next action: uninstall", plugin.key());
                    }
                    Some(FlatpakDirection::Install) => {
                        println!("{}: not installed; next action: install", plugin.key());
                    }
                    None => {}
                }
                return Ok(());
            }

            let resolved = engine.resolver().resolve(&plugin).await;
            let state = match resolved.kind {
                ActionKind::Undo => "applied",
                ActionKind::Exec => "not applied",
            };
            if resolved.is_runnable() {
                let action = match resolved.label() {
                    Some(label) if !label.is_empty() => label.to_string(),
                    _ => format!("{:?}", resolved.kind).to_lowercase(),
                };
                println!("{}: {state}; next action: {action}", plugin.key());
            } else {
                println!("{}: {state}; no runnable action", plugin.key());
            }
        }

        Commands::Run { plugin, yes } => {
            let plugin = find_plugin(&registry, &plugin)?;
            let engine = build_engine(&rules, yes);

            if plugin.flatpak.is_some() {
                if let Some(direction) = engine.flatpak().probe(&plugin).await {
                    println!("flatpak {} {}", direction.verb(), plugin.label);
                    if !engine.flatpak().toggle(&plugin, direction).await {
                        std::process::exit(1);
                    }
                }
                return Ok(());
            }

            let controller = engine.controller(plugin, Arc::new(PrintingView));
            if controller
                .activate()
                .await
                .is_some_and(|outcome| !outcome.ok())
            {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn build_engine(rules: &RuleSet, auto_confirm: bool) -> Engine {
    let prompt: Arc<dyn ConfirmationPrompt> = if auto_confirm {
        Arc::new(AutoConfirm)
    } else {
        Arc::new(TerminalPrompt::new())
    };
    Engine::new(rules, prompt, Arc::new(PrintingNotifier), Arc::new(HeadlessHost))
}

/// Resolve a plugin reference: `category/name` addresses one plugin
/// exactly; a bare name works as long as only one category has it.
fn find_plugin(registry: &PluginRegistry, reference: &str) -> Result<Arc<PluginDescriptor>> {
    if let Some((category, name)) = reference.split_once('/') {
        return registry
            .get(category, name)
            .with_context(|| format!("no plugin '{name}' under category '{category}'"));
    }

    let matches: Vec<_> = registry
        .iter()
        .filter(|plugin| plugin.name == reference)
        .cloned()
        .collect();

    match matches.as_slice() {
        [] => bail!("no plugin named '{reference}'"),
        [plugin] => Ok(plugin.clone()),
        _ => {
            let keys: Vec<String> = matches.iter().map(|plugin| plugin.key()).collect();
            bail!(
                "plugin name '{reference}' is ambiguous; use one of: {}",
                keys.join(", ")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixkit_plugins::ActionSet;

    fn descriptor(category: &str, name: &str) -> PluginDescriptor {
        PluginDescriptor {
            category: category.into(),
            label: name.to_uppercase(),
            description: None,
            icon: None,
            license: None,
            scripts: ActionSet::default(),
            flatpak: None,
            name: name.into(),
            path: Default::default(),
        }
    }

    fn registry() -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        registry.insert(descriptor("Tweaks", "fonts")).unwrap();
        registry.insert(descriptor("Apps", "fonts")).unwrap();
        registry.insert(descriptor("Utilities", "cleanup")).unwrap();
        registry
    }

    #[test]
    fn bare_name_finds_a_unique_plugin() {
        let found = find_plugin(&registry(), "cleanup").unwrap();
        assert_eq!(found.category, "Utilities");
    }

    #[test]
    fn ambiguous_name_lists_the_candidates() {
        let err = find_plugin(&registry(), "fonts").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("ambiguous"));
        assert!(message.contains("Tweaks/fonts"));
        assert!(message.contains("Apps/fonts"));
    }

    #[test]
    fn category_prefix_disambiguates() {
        let found = find_plugin(&registry(), "Apps/fonts").unwrap();
        assert_eq!(found.category, "Apps");
    }

    #[test]
    fn unknown_plugin_is_an_error() {
        assert!(find_plugin(&registry(), "nope").is_err());
        assert!(find_plugin(&registry(), "Tweaks/nope").is_err());
    }
}
