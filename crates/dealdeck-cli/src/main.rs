mod catalog;
mod consent;
mod favorites;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "dealdeck")]
#[command(about = "Dealdeck offer catalog command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List offers visible in a country
    Offers {
        /// Country code (e.g. IN); probes geolocation when omitted
        #[arg(long)]
        country: Option<String>,
        /// Category slug (e.g. ai-tools, github)
        #[arg(long)]
        category: Option<String>,
        /// Curation rail: featured, hidden-gems, underrated, developer-pack
        #[arg(long)]
        rail: Option<String>,
        /// Free-text search over name, offer, description and tags
        #[arg(long)]
        search: Option<String>,
    },
    /// List derived categories with counts
    Categories {
        /// Country code (e.g. IN); probes geolocation when omitted
        #[arg(long)]
        country: Option<String>,
        /// Also list the subcategories of this category slug
        #[arg(long)]
        category: Option<String>,
    },
    /// Manage offers saved on this device
    Favorites {
        #[command(subcommand)]
        command: FavoritesCommands,
    },
    /// Show or change analytics consent saved on this device
    Consent {
        #[command(subcommand)]
        command: ConsentCommands,
    },
    /// Probe geolocation once and print the resolved country
    Geo,
    /// Database operations
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum FavoritesCommands {
    /// Show saved offers
    List,
    /// Save an offer by id
    Add { id: i64 },
    /// Remove a saved offer by id
    Remove { id: i64 },
    /// Remove every saved offer
    Clear,
}

#[derive(Debug, Subcommand)]
enum ConsentCommands {
    /// Show the saved answers
    Show,
    /// Allow analytics
    Grant,
    /// Refuse analytics
    Deny,
    /// Forget every answer
    Reset,
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("dealdeck: run with --help to list commands");
        return Ok(());
    };

    let config = dealdeck_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match command {
        Commands::Offers {
            country,
            category,
            rail,
            search,
        } => {
            catalog::run_offers(
                &config,
                catalog::OfferFilters {
                    country: country.as_deref(),
                    category: category.as_deref(),
                    rail: rail.as_deref(),
                    search: search.as_deref(),
                },
            )
            .await?;
        }
        Commands::Categories { country, category } => {
            catalog::run_categories(&config, country.as_deref(), category.as_deref()).await?;
        }
        Commands::Favorites { command } => match command {
            FavoritesCommands::List => favorites::run_list(&config),
            FavoritesCommands::Add { id } => favorites::run_add(&config, id).await?,
            FavoritesCommands::Remove { id } => favorites::run_remove(&config, id)?,
            FavoritesCommands::Clear => favorites::run_clear(&config)?,
        },
        Commands::Consent { command } => match command {
            ConsentCommands::Show => consent::run_show(&config),
            ConsentCommands::Grant => consent::run_set_analytics(&config, true)?,
            ConsentCommands::Deny => consent::run_set_analytics(&config, false)?,
            ConsentCommands::Reset => consent::run_reset(&config)?,
        },
        Commands::Geo => catalog::run_geo(&config).await?,
        Commands::Db { command } => run_db(&config, &command).await?,
    }

    Ok(())
}

async fn run_db(config: &dealdeck_core::AppConfig, command: &DbCommands) -> anyhow::Result<()> {
    let database_url = config
        .database_url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for db commands"))?;
    let pool = dealdeck_db::connect_pool(
        database_url,
        dealdeck_db::PoolConfig::from_app_config(config),
    )
    .await?;

    match command {
        DbCommands::Ping => {
            dealdeck_db::health_check(&pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            dealdeck_db::run_migrations(&pool).await?;
            println!("migrations applied");
        }
    }
    Ok(())
}
