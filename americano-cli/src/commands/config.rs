//! Inspect the merged configuration and the files it came from

use crate::config::{ConfigLayer, ConfigLoader};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration after merging every layer
    Show {
        /// Print as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
    /// List config layers in merge order and whether each file exists
    Path,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    let layers = ConfigLoader::layers();
    match args.command {
        ConfigCommands::Show { json } => {
            let config = ConfigLoader::load_layers(&layers)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print!("{}", merged_header(&layers));
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
        ConfigCommands::Path => print!("{}", describe_layers(&layers)),
    }
    Ok(())
}

/// TOML comment naming the files that were merged
fn merged_header(layers: &[ConfigLayer]) -> String {
    let merged: Vec<_> = layers.iter().filter(|layer| layer.exists()).collect();
    if merged.is_empty() {
        return "# No config files found, showing defaults\n\n".to_string();
    }
    let mut header = String::new();
    for layer in merged {
        header.push_str(&format!("# merged {}: {}\n", layer.name, layer.path.display()));
    }
    header.push('\n');
    header
}

/// One line per layer, lowest precedence first
fn describe_layers(layers: &[ConfigLayer]) -> String {
    layers
        .iter()
        .map(|layer| {
            let status = if layer.exists() { "found" } else { "not found" };
            format!("{:<8} {} ({})\n", layer.name, layer.path.display(), status)
        })
        .collect()
}
