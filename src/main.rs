//! CLI entry point for mdpress

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mdpress::generator::BuildOptions;
use mdpress::server::ServeOptions;
use mdpress::{commands, Site};

#[derive(Parser)]
#[command(name = "mdpress")]
#[command(version)]
#[command(about = "Publish a directory of Markdown documents as a static site", long_about = None)]
struct Cli {
    /// Configuration file (defaults to <input>/_config.yml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the site
    #[command(alias = "b")]
    Build {
        /// Content directory
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Fail on duplicate slugs or any document error, writing nothing
        #[arg(long)]
        strict: bool,

        /// Rebuild when the content changes
        #[arg(short, long)]
        watch: bool,
    },

    /// Remove the output directory
    Clean {
        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List documents and what they would render to
    List {
        /// Content directory
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Create a new document
    New {
        /// Content directory
        #[arg(short, long)]
        input: PathBuf,

        /// Title of the new document
        title: String,

        /// Layout to render it with
        #[arg(short, long)]
        layout: Option<String>,

        /// URL of the new document (defaults to the slugified title)
        #[arg(short, long)]
        url: Option<String>,
    },

    /// Build, then serve the output with live reload
    #[command(alias = "s")]
    Serve {
        /// Content directory
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(long, default_value = "localhost")]
        ip: String,

        /// Do not rebuild on changes
        #[arg(long)]
        no_watch: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        "mdpress=debug,info"
    } else {
        "mdpress=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Build {
            input,
            output,
            strict,
            watch,
        } => {
            let site = Site::open(&input, Some(output), cli.config)?;
            let options = BuildOptions { strict };
            commands::build::run(&site, options)?;

            if watch {
                tokio::task::spawn_blocking(move || commands::build::watch(&site, options, |_| {}))
                    .await??;
            }
        }

        Commands::Clean { output } => {
            commands::clean::run(&output)?;
        }

        Commands::List { input } => {
            let site = Site::open(&input, None, cli.config)?;
            commands::list::run(&site)?;
        }

        Commands::New {
            input,
            title,
            layout,
            url,
        } => {
            let site = Site::open(&input, None, cli.config)?;
            tracing::info!("Creating new document: {}", title);
            commands::new::run(&site, &title, layout.as_deref(), url.as_deref())?;
        }

        Commands::Serve {
            input,
            output,
            port,
            ip,
            no_watch,
        } => {
            let site = Site::open(&input, Some(output), cli.config)?;
            commands::build::run(&site, BuildOptions::default())?;

            mdpress::server::start(
                &site,
                ServeOptions {
                    ip,
                    port,
                    watch: !no_watch,
                },
            )
            .await?;
        }
    }

    Ok(())
}
