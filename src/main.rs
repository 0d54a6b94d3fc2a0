use clap::Parser;
use learnhall::db::Db;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// libSQL database URL (`file:` prefix for a local SQLite file).
    #[clap(env)]
    url: String,

    /// libSQL authentication token (remote databases only).
    #[clap(env, default_value = "")]
    auth_token: String,

    /// The address to bind to.
    #[arg(short, long, env, default_value = "127.0.0.1:1414")]
    address: String,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "tracing=info,learnhall=debug".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .init();

    let args = Args::parse();
    tracing::info!("learnhall v{} starting", learnhall::utils::VERSION);

    let db = Db::new(args.url, args.auth_token).await?;
    let app = learnhall::router(learnhall::AppState { db });

    let listener = tokio::net::TcpListener::bind(&args.address).await?;
    tracing::info!("listening on {}", args.address);
    axum::serve(listener, app).await?;

    Ok(())
}
