//! CLI entry point for ghost-front

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ghost_front::GhostFront;

#[derive(Parser)]
#[command(name = "ghost-front")]
#[command(version)]
#[command(about = "A server-rendered blog front end for the Ghost Content API", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Config file, relative to the base directory (defaults to ghost-front.yml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,
    },

    /// Export the site as static files
    #[command(alias = "g")]
    Generate,

    /// Print the sitemap
    Sitemap {
        /// Print the entry list as JSON instead of XML
        #[arg(long)]
        json: bool,
    },

    /// List CMS content
    List {
        /// Type of content to list (post, page, tag)
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "ghost_front=debug,info"
    } else {
        "ghost_front=info"
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
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Serve { port, ip } => {
            let site = GhostFront::new(&base_dir, config)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            ghost_front::server::start(&site, &ip, port).await?;
        }

        Commands::Generate => {
            let site = GhostFront::new(&base_dir, config)?;
            tracing::info!("Generating static files...");
            let summary = ghost_front::commands::generate::run(&site).await?;
            println!(
                "Generated {} posts, {} pages and {} tags in {:?}",
                summary.posts, summary.pages, summary.tags, site.public_dir
            );
        }

        Commands::Sitemap { json } => {
            let site = GhostFront::new(&base_dir, config)?;
            print!("{}", ghost_front::commands::sitemap::run(&site, json).await?);
        }

        Commands::List { r#type } => {
            let site = GhostFront::new(&base_dir, config)?;
            print!("{}", ghost_front::commands::list::run(&site, &r#type).await?);
        }

        Commands::Version => {
            println!("ghost-front version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
