use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use shelf_kernel::settings::{Environment, Settings};

#[derive(Debug, Parser)]
#[command(name = "shelf-cli", version, about = "Operate a SHELF deployment")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve,
    /// Apply pending schema migrations
    Migrate,
    /// Load sample authors and books
    Fixtures {
        /// Keep existing rows instead of purging them first
        #[arg(long)]
        append: bool,
        /// Allow loading into a production environment
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load SHELF settings")?;
    shelf_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Serve => shelf_app::bootstrap::serve(settings).await,
        Command::Migrate => {
            let (registry, db) = shelf_app::bootstrap::prepare(&settings).await?;
            db.close().await;
            tracing::info!(modules = registry.module_count(), "schema is up to date");
            Ok(())
        }
        Command::Fixtures { append, force } => {
            if settings.environment == Environment::Production && !force {
                bail!("refusing to load fixtures into production without --force");
            }

            let (_registry, db) = shelf_app::bootstrap::prepare(&settings).await?;
            let mut rng = StdRng::from_entropy();
            let report = shelf_app::fixtures::load(&db, &mut rng, append).await?;
            db.close().await;
            tracing::info!(?report, "fixtures loaded");

            println!(
                "loaded {} authors and {} books (purged {} authors, {} books)",
                report.authors, report.books, report.purged_authors, report.purged_books
            );
            Ok(())
        }
    }
}
