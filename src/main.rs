use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use planboard::{api, db};

#[derive(Parser)]
#[command(name = "planboard")]
#[command(about = "Project planning with Gantt scheduling and critical-path analysis")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Planboard server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Database file (defaults to the platform data directory)
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "planboard=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(port: u16, db_path: Option<PathBuf>) -> anyhow::Result<()> {
    let db = match db_path {
        Some(path) => db::Database::open(path)?,
        None => db::Database::open_default()?,
    };
    db.migrate()?;

    let app = api::create_router(db);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Planboard server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Serve { port, db }) => serve(port, db).await?,
        None => {
            // Default: start server on the default port
            serve(3000, None).await?;
        }
    }

    Ok(())
}
