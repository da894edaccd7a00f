use std::io::Read;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use kubestate_render::{RenderLimits, Renderer};
use tracing::info;

mod directive;

#[derive(Parser, Debug)]
#[command(name = "kubestatectl", version, about = "Render Kubernetes manifests into state steps")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Yaml)]
    output: Output,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Yaml, Json }

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a manifest stream into ordered state steps
    Render {
        /// Manifest file, or `-` for stdin
        #[arg(default_value = "-")]
        input: PathBuf,
    },
    /// List the resource types that have a handler
    Handlers,
}

fn init_tracing() {
    let env = std::env::var("KUBESTATE_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn read_input(input: &PathBuf) -> Result<String> {
    if input.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text).context("reading manifests from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let renderer = Renderer::with_builtins().with_limits(RenderLimits::from_env());

    match cli.command {
        Commands::Render { input } => {
            info!(input = %input.display(), "render invoked");
            let text = read_input(&input)?;
            let manifests = directive::strip_directive(&text)?;
            let out = renderer
                .render(manifests)
                .with_context(|| format!("rendering {}", input.display()))?;
            match cli.output {
                Output::Yaml => print!("{}", serde_yaml::to_string(&out)?),
                Output::Json => println!("{}", serde_json::to_string_pretty(&out)?),
            }
        }
        Commands::Handlers => {
            let keys = renderer.registry().keys();
            match cli.output {
                Output::Yaml => {
                    for k in keys {
                        println!("{}", k);
                    }
                }
                Output::Json => println!("{}", serde_json::to_string_pretty(&keys)?),
            }
        }
    }

    Ok(())
}
