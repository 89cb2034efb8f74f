/// Encore Server - play analytics over HTTP
use clap::{Parser, Subcommand};
use encore_core::{PlayAnalytics, PlayCountTargets, SystemClock, TrackId};
use encore_server::{config::ServerConfig, create_router, state::AppState};
use encore_storage::SqlitePlayStore;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "encore-server")]
#[command(about = "Encore play analytics server", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "ENCORE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Record one play of a track now
    RecordPlay {
        /// Track id
        track_id: TrackId,
    },
    /// Print the windowed play counts of a track
    Counts {
        /// Track id
        track_id: TrackId,
    },
    /// Replace a track's history so it matches the given counts
    SetCounts {
        /// Track id
        track_id: TrackId,
        #[arg(long, allow_negative_numbers = true)]
        all: Option<i64>,
        #[arg(long, allow_negative_numbers = true)]
        month: Option<i64>,
        #[arg(long, allow_negative_numbers = true)]
        week: Option<i64>,
        #[arg(long, allow_negative_numbers = true)]
        day: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "encore_server=info,encore_core=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::load(cli.config.as_deref())?;
    config.validate()?;

    match cli.command {
        Commands::Serve => {
            serve(config).await?;
        }
        Commands::RecordPlay { track_id } => {
            let analytics = open_analytics(&config).await?;
            let event = analytics.record_play(track_id).await?;
            println!("Recorded play {} of track {} at {}", event.id, track_id, event.played_at);
        }
        Commands::Counts { track_id } => {
            let analytics = open_analytics(&config).await?;
            let counts = analytics.snapshot(track_id).await?;
            println!("{}", serde_json::to_string_pretty(&counts)?);
        }
        Commands::SetCounts {
            track_id,
            all,
            month,
            week,
            day,
        } => {
            let analytics = open_analytics(&config).await?;
            let targets = PlayCountTargets {
                all,
                month,
                week,
                day,
            };
            let report = analytics.set_aggregate_counts(track_id, targets).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Connect, migrate and wire the analytics service against the configured database
async fn open_analytics(config: &ServerConfig) -> anyhow::Result<PlayAnalytics> {
    let pool = encore_storage::create_pool_with(
        &config.storage.database_url,
        config.storage.max_connections,
    )
    .await?;
    encore_storage::run_migrations(&pool).await?;

    let store = SqlitePlayStore::new(pool).with_batch_size(config.storage.insert_batch_size);
    Ok(PlayAnalytics::new(Arc::new(store), Arc::new(SystemClock)).with_config(config.analytics))
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Encore Server");
    tracing::info!("Host: {}", config.server.host);
    tracing::info!("Port: {}", config.server.port);

    let analytics = open_analytics(&config).await?;
    tracing::info!("Database connected");

    let state =
        AppState::new(Arc::new(analytics)).with_max_batch_tracks(config.server.max_batch_tracks);
    let app = create_router(state);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
