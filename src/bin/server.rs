use std::{
    env::{self},
    fs::OpenOptions,
    net::SocketAddr,
    num::NonZeroU64,
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;

use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use finance_tracker::{
    AppState, DEFAULT_PAGE_SIZE, ReportConfig, build_router, graceful_shutdown,
    logging_middleware, require_timezone,
};

/// The REST API server for finance_tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// The number of records rendered by each report batch.
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: NonZeroU64,

    /// The maximum number of report batches rendered at once per export.
    #[arg(long, default_value_t = 4)]
    max_workers: usize,

    /// The number of seconds an export may take before it is abandoned.
    #[arg(long, default_value_t = 60)]
    export_timeout_secs: u64,

    /// The directory under which exports create their temporary files.
    /// Defaults to the system's temporary directory.
    #[arg(long)]
    work_root: Option<PathBuf>,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let secret = env::var("SECRET").expect("The environment variable 'SECRET' must be set");

    if let Err(error) = require_timezone(&args.timezone) {
        tracing::error!("{error}, expected a canonical name such as \"Pacific/Auckland\"");
        std::process::exit(1);
    }

    let defaults = ReportConfig::default();
    let report_config = ReportConfig {
        page_size: args.page_size,
        max_workers: args.max_workers,
        export_timeout: Duration::from_secs(args.export_timeout_secs),
        work_root: args.work_root.unwrap_or(defaults.work_root),
        local_timezone: args.timezone,
        ..defaults
    };

    let conn = Connection::open(&args.db_path).expect("Could not open the database.");
    let app_state =
        AppState::new(conn, &secret, report_config).expect("Could not initialize the database.");

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = build_router(app_state).layer(middleware::from_fn(logging_middleware));
    let router = add_tracing_layer(router);

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .expect("The server stopped unexpectedly.");
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but errors are
        // already logged where they are handled.
        .on_failure(());

    router.layer(tracing_layer)
}
