//! CLI entry point for spacetraveling

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "spacetraveling")]
#[command(version)]
#[command(about = "A blog rendered from a Prismic content repository", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter _config.yml
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Pre-render the home page and the first posts
    #[command(alias = "g")]
    Generate,

    /// Start the blog server
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,

        /// Serve without pre-rendering first
        #[arg(long)]
        skip_generate: bool,
    },

    /// Clean the public folder
    Clean,

    /// List every published post
    List,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "spacetraveling=debug,info"
    } else {
        "spacetraveling=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing site in {:?}", target_dir);
            spacetraveling::commands::init::init_site(&target_dir)?;
            println!("Initialized site in {:?}", target_dir);
        }

        Commands::Generate => {
            let site = spacetraveling::Site::new(&base_dir)?;
            tracing::info!("Generating pages...");
            site.generate().await?;
            println!("Generated successfully!");
        }

        Commands::Server {
            port,
            ip,
            open,
            skip_generate,
        } => {
            let site = spacetraveling::Site::new(&base_dir)?;

            if !skip_generate {
                tracing::info!("Generating pages...");
                if let Err(e) = site.generate().await {
                    tracing::warn!("Pre-rendering failed, pages will render on demand: {}", e);
                }
            }

            tracing::info!("Starting server at http://{}:{}", ip, port);
            spacetraveling::server::start(&site, &ip, port, open).await?;
        }

        Commands::Clean => {
            let site = spacetraveling::Site::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List => {
            let site = spacetraveling::Site::new(&base_dir)?;
            spacetraveling::commands::list::run(&site).await?;
        }

        Commands::Version => {
            println!("spacetraveling version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
