//! widgetkit CLI - builds hashed widget bundles and their HTML wrappers.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "widgetkit")]
#[command(about = "Build hashed widget bundles and their HTML wrappers")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to widgetkit.toml config file (relative to --root)
    #[arg(short, long, default_value = "widgetkit.toml", global = true)]
    config: PathBuf,

    /// Project root
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a widget project in the current directory
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },

    /// Build every widget once
    Build {
        /// Widget names to build (defaults to all)
        targets: Vec<String>,

        /// Output directory (defaults to config or "assets")
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip minification
        #[arg(long)]
        no_minify: bool,

        #[command(flatten)]
        urls: UrlArgs,
    },

    /// Build, serve the output, and rebuild on source changes
    Dev {
        /// Widget names to build (defaults to all)
        targets: Vec<String>,

        /// Port to listen on
        #[arg(short, long, default_value = "4444")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[command(flatten)]
        urls: UrlArgs,
    },

    /// Serve a built output directory
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4444")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory to serve (defaults to the configured output directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

/// Asset URLs embedded in generated HTML.
#[derive(Args, Debug, Default)]
pub struct UrlArgs {
    /// Public URL the built assets are served from
    #[arg(long, env = "BASE_URL")]
    base_url: Option<String>,

    /// Telemetry endpoint advertised to widgets
    #[arg(long, env = "TELEMETRY_URL")]
    telemetry_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    let config_path = cli.root.join(&cli.config);

    // Execute command
    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(&cli.root, yes).await?;
        }
        Commands::Build {
            targets,
            output,
            no_minify,
            urls,
        } => {
            let overrides = config::Overrides {
                targets,
                out_dir: output,
                minify: if no_minify { Some(false) } else { None },
                base_url: urls.base_url,
                telemetry_url: urls.telemetry_url,
            };
            commands::build::run(&cli.root, &config_path, overrides).await?;
        }
        Commands::Dev {
            targets,
            port,
            host,
            urls,
        } => {
            let overrides = config::Overrides {
                targets,
                base_url: urls.base_url,
                telemetry_url: urls.telemetry_url,
                ..Default::default()
            };
            commands::dev::run(&cli.root, &config_path, overrides, host, port).await?;
        }
        Commands::Serve { port, host, dir } => {
            commands::serve::run(&cli.root, &config_path, dir, host, port).await?;
        }
    }

    Ok(())
}
