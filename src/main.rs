//! sbom-convert: convert SBOM documents between formats
//!
//! Reads CycloneDX, SPDX and native JSON documents and writes any of the
//! supported formats.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use sbom_convert::{
    cli,
    config::{AppConfig, CliOverrides, Validatable},
    pipeline::exit_codes,
};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build long version string with format support info
const fn build_long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\n\nSupported SBOM Formats:",
        "\n  Native:    sbom-json 1.0.0",
        "\n  CycloneDX: 1.4, 1.5, 1.6 (JSON, XML)",
        "\n  SPDX:      2.2, 2.3 (JSON, tag-value)",
        "\n  Table:     write-only package listing"
    )
}

#[derive(Parser)]
#[command(name = "sbom-convert")]
#[command(version, long_version = build_long_version())]
#[command(about = "Convert SBOM documents between formats", long_about = None)]
#[command(after_help = "EXIT CODES:
    0  Success
    1  Input format could not be identified
    2  Unsupported format or malformed input
    3  Any other error

EXAMPLES:
    # Convert a CycloneDX document to SPDX JSON
    sbom-convert convert bom.cdx.json -o spdx-json=sbom.spdx.json

    # Write several formats at once, one of them to stdout
    sbom-convert convert sbom.json -o cyclonedx-xml@1.4=bom.xml -o table

    # Identify unlabeled documents
    sbom-convert identify *.json")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Arguments for the `convert` subcommand
#[derive(Parser)]
struct ConvertArgs {
    /// SBOM to convert (`-` for stdin)
    input: PathBuf,

    /// Output destination, `<format>[@<version>][=<path>]`; repeatable.
    /// Without a path the output goes to stdout.
    #[arg(short, long = "output", value_name = "DEST")]
    output: Vec<String>,

    /// CycloneDX version the unversioned names resolve to
    #[arg(long, value_name = "VERSION")]
    cyclonedx_version: Option<String>,

    /// SPDX version the unversioned names resolve to
    #[arg(long, value_name = "VERSION")]
    spdx_version: Option<String>,

    /// Base URI of generated SPDX document namespaces
    #[arg(long, value_name = "URI")]
    spdx_namespace_base: Option<String>,

    /// Write compact JSON instead of pretty-printing
    #[arg(long)]
    compact: bool,

    /// Refuse inputs larger than this many bytes
    #[arg(long, value_name = "BYTES")]
    max_bytes: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an SBOM to one or more formats
    Convert(ConvertArgs),

    /// Report the format of each input without converting it
    Identify {
        /// Documents to identify (`-` for stdin)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// List supported formats, versions and aliases
    Formats {
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show, discover, or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Sub-subcommands for the `config` command
#[derive(Subcommand)]
enum ConfigAction {
    /// Print current effective configuration (merged from defaults + file)
    Show,
    /// Print the JSON Schema of the config file format
    Schema {
        /// Write schema to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate an example .sbom-convert.yaml in the current directory
    Init,
    /// Print config file search paths and discovered config file
    Path,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            exit_codes::ERROR
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Convert(args) => {
            let overrides = CliOverrides {
                pretty: args.compact.then_some(false),
                cyclonedx_version: args.cyclonedx_version,
                spdx_version: args.spdx_version,
                spdx_namespace_base: args.spdx_namespace_base,
                max_bytes: args.max_bytes,
                quiet: cli.quiet,
                ..CliOverrides::default()
            };
            let mut config = load_config(cli.config.as_deref(), &overrides)?;
            // Command-line destinations are resolved by the pipeline so that an
            // unknown format maps to its own exit code.
            config.merge(&CliOverrides {
                destinations: args.output,
                ..CliOverrides::default()
            });
            cli::run_convert(&args.input, &config)
        }

        Commands::Identify { inputs, json } => {
            let config = load_config(cli.config.as_deref(), &quiet_overrides(cli.quiet))?;
            cli::run_identify(&inputs, json, &config)
        }

        Commands::Formats { json } => {
            let config = load_config(cli.config.as_deref(), &quiet_overrides(cli.quiet))?;
            cli::run_formats(json, &config)?;
            Ok(exit_codes::SUCCESS)
        }

        Commands::Config { action } => {
            run_config(action, cli.config.as_deref())?;
            Ok(exit_codes::SUCCESS)
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "sbom-convert", &mut io::stdout());
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn quiet_overrides(quiet: bool) -> CliOverrides {
    CliOverrides {
        quiet,
        ..CliOverrides::default()
    }
}

/// Load the config file, merge command-line values and validate the result.
fn load_config(path: Option<&Path>, overrides: &CliOverrides) -> Result<AppConfig> {
    let (config, loaded_from) = AppConfig::from_file_with_overrides(path, overrides);
    if let Some(path) = &loaded_from {
        tracing::debug!("Using config file {}", path.display());
    }

    let errors = config.validate();
    if !errors.is_empty() {
        let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
        anyhow::bail!("invalid configuration:\n  {}", details.join("\n  "));
    }
    Ok(config)
}

fn run_config(action: ConfigAction, path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let (config, loaded_from) = sbom_convert::config::load_or_default(path);
            if let Some(path) = &loaded_from {
                eprintln!("# Loaded from: {}", path.display());
            } else {
                eprintln!("# No config file found; showing defaults");
            }
            let yaml = serde_yaml::to_string(&config).context("failed to serialize config")?;
            print!("{yaml}");
        }
        ConfigAction::Schema { output } => {
            let schema = sbom_convert::config::generate_json_schema();
            match output {
                Some(path) => {
                    std::fs::write(&path, &schema)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("Schema written to {}", path.display());
                }
                None => println!("{schema}"),
            }
        }
        ConfigAction::Init => {
            let target = std::env::current_dir()
                .context("cannot determine current directory")?
                .join(".sbom-convert.yaml");
            if target.exists() {
                anyhow::bail!(
                    "{} already exists. Remove it first to re-initialize.",
                    target.display()
                );
            }
            std::fs::write(&target, sbom_convert::config::generate_example_config())
                .with_context(|| format!("failed to write {}", target.display()))?;
            eprintln!("Created {}", target.display());
        }
        ConfigAction::Path => {
            let search_paths = [
                std::env::current_dir().ok(),
                dirs::config_dir().map(|p| p.join("sbom-convert")),
                dirs::home_dir(),
            ];
            eprintln!("Config file search paths (in order):");
            for dir in search_paths.into_iter().flatten() {
                eprintln!("  {}", dir.display());
            }
            eprintln!("  (plus the enclosing git repository root, after the current directory)");
            eprintln!();
            match sbom_convert::config::discover_config_file(path) {
                Some(found) => eprintln!("Active config file: {}", found.display()),
                None => eprintln!("No config file found."),
            }
        }
    }
    Ok(())
}
