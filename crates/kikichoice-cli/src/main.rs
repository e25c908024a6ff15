mod upload_images;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "kikichoice-cli")]
#[command(about = "kikichoice catalog command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance.
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Upload product and variant images from a directory tree.
    UploadImages(UploadImagesArgs),
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database is reachable.
    Ping,
    /// Apply pending migrations.
    Migrate,
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub(crate) struct UploadImagesArgs {
    /// Log what would be uploaded or deleted without changing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Delete each entity's existing images before uploading.
    #[arg(long)]
    pub clean_first: bool,

    /// Also record images in the LOCAL_DB_* mirror database.
    #[arg(long)]
    pub sync_local: bool,

    /// Root directory holding one sub-directory per SKU.
    #[arg(default_value = "./images")]
    pub source: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("kikichoice-cli: no command given, see --help");
        return Ok(());
    };

    let config = kikichoice_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match command {
        Commands::Db { command } => run_db(&config, &command).await,
        Commands::UploadImages(args) => {
            let result = upload_images::run_upload_images(&config, &args).await?;
            println!();
            print!("{result}");
            Ok(())
        }
    }
}

async fn run_db(config: &kikichoice_core::AppConfig, command: &DbCommands) -> anyhow::Result<()> {
    let pool_config = kikichoice_db::PoolConfig::from_app_config(config);
    let pool = kikichoice_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        DbCommands::Ping => {
            kikichoice_db::health_check(&pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = kikichoice_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
    }

    pool.close().await;
    Ok(())
}
