use std::sync::Arc;

use anyhow::{bail, Context};
use bookstore_app::{modules::books::repository::InMemoryBookRepository, Application};
use bookstore_kernel::settings::Settings;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bookstore-cli", version, about = "Bookstore service administration")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Print the OpenAPI document to stdout
    Openapi {
        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let settings = load_settings()?;
            let app = Application::build(&settings).await?;
            app.run(&settings).await
        }
        Command::Migrate => {
            let settings = load_settings()?;
            if settings.database.url.is_none() {
                bail!("database.url must be set to run migrations");
            }

            let app = Application::build(&settings).await?;
            let applied = app.migrate().await?;
            tracing::info!(applied, "migrate finished");
            Ok(())
        }
        Command::Openapi { pretty } => {
            // Documentation only; no storage is touched
            let app = Application::with_repository(Arc::new(InMemoryBookRepository::new()), None);
            let openapi = bookstore_http::build_openapi(app.registry());

            let json = if pretty {
                openapi.to_pretty_json()
            } else {
                openapi.to_json()
            }
            .context("failed to serialize OpenAPI document")?;

            println!("{json}");
            Ok(())
        }
    }
}

fn load_settings() -> anyhow::Result<Settings> {
    let settings = Settings::load().with_context(|| "failed to load bookstore settings")?;
    bookstore_telemetry::init(&settings.telemetry);
    tracing::info!(env = ?settings.environment, "bookstore-cli starting");
    Ok(settings)
}
