use clap::{Parser, Subcommand, ValueEnum};

mod commands;

#[derive(Parser)]
#[command(
    name = "stackpack",
    about = "stackpack — pack infrastructure resources into deployment containers",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan a manifest into phase-1 and phase-2 containers.
    ///
    /// Reference problems are reported as warnings; the plan is still
    /// printed and the exit code stays zero.
    Plan {
        /// Path to the manifest (.toml or .json)
        #[arg(short, long, default_value = "stackpack.toml")]
        manifest: String,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
        /// Override the container namespace
        #[arg(short, long)]
        namespace: Option<String>,
        /// Override the phase-1 capacity
        #[arg(long, allow_negative_numbers = true)]
        resource_capacity: Option<i64>,
        /// Override the phase-2 capacity
        #[arg(long, allow_negative_numbers = true)]
        edge_capacity: Option<i64>,
    },
    /// Load and validate a manifest without planning.
    Validate {
        #[arg(short, long, default_value = "stackpack.toml")]
        manifest: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stackpack=info".parse()?)
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Plan {
            manifest,
            format,
            namespace,
            resource_capacity,
            edge_capacity,
        } => {
            let overrides = stackpack_core::config::SettingsOverrides {
                namespace,
                resource_capacity,
                edge_capacity,
            };
            commands::plan::plan(&manifest, format, &overrides)
        }
        Commands::Validate { manifest } => commands::validate::validate(&manifest),
    }
}
