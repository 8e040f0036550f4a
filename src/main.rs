use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use todo_assist::config::{Cli, Command, DescribeArgs, ServeArgs};
use todo_assist::server::{self, AppState};
use todo_assist::store::SupabaseStore;
use todo_assist::{DescriptionClient, DescriptionGenerator, DraftStatus, Error, ProviderFactory};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // .env is optional
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("todo_assist=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Describe(args) => describe(args).await,
    }
}

async fn serve(args: ServeArgs) -> Result<(), Error> {
    let provider = ProviderFactory::create(&args.provider_config()?)?;
    info!(provider = provider.name(), model = %args.model, "provider client ready");

    let generator = Arc::new(DescriptionGenerator::new(provider, args.generation_settings()));
    let mut state = AppState::new(Arc::clone(&generator));

    match args.supabase() {
        Some((url, key)) => {
            let store = SupabaseStore::new(url, key)?;
            state = state.with_store(Arc::new(store));
            info!("todo routes enabled");
        }
        None => warn!("SUPABASE_URL/SUPABASE_ANON_KEY not set, todo routes disabled"),
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("failed to bind {addr}: {e}")))?;

    server::serve(listener, state, shutdown_signal()).await?;

    drop(generator);
    info!("server stopped, provider client closed");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

async fn describe(args: DescribeArgs) -> Result<(), Error> {
    let client = DescriptionClient::new(&args.endpoint)?;
    let mut printed = 0;
    let mut stdout = std::io::stdout();

    let description = client
        .generate(&args.title, args.word_limit, |draft| {
            if *draft.status() == DraftStatus::Streaming {
                let text = draft.text();
                let fresh: String = text.chars().skip(printed).collect();
                printed = text.chars().count();
                let _ = write!(stdout, "{fresh}");
                let _ = stdout.flush();
            }
        })
        .await?;

    println!();
    println!("{description}");
    Ok(())
}
