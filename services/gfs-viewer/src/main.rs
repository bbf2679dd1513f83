//! GFS viewer server and command-line renderer.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use forecast::DEFAULT_HOST;
use gfs_viewer::config::{select_deployment, DEFAULT_DEPLOYMENTS_DIR};
use gfs_viewer::{render_map, router, AppState, ForecastSource, MapRequest};
use opendap::ClientConfig;
use renderer::MapRenderer;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LISTEN: &str = "0.0.0.0:8080";

#[derive(Parser, Debug)]
#[command(name = "gfs-viewer")]
#[command(about = "Regional GFS forecast map viewer")]
struct Args {
    /// Deployment name (looked up in --deployments-dir) or YAML file path
    #[arg(short, long, env = "GFS_DEPLOYMENT")]
    deployment: Option<String>,

    /// Directory holding deployment YAML files
    #[arg(long, default_value = DEFAULT_DEPLOYMENTS_DIR, env = "GFS_DEPLOYMENTS_DIR")]
    deployments_dir: PathBuf,

    /// GrADS Data Server host or base URL
    #[arg(long, default_value = DEFAULT_HOST, env = "GFS_DATA_HOST")]
    data_host: String,

    /// Serve synthetic data instead of contacting the data server
    #[arg(long, env = "GFS_OFFLINE")]
    offline: bool,

    /// Upstream connect timeout in seconds
    #[arg(long, default_value_t = 30, env = "GFS_CONNECT_TIMEOUT")]
    connect_timeout: u64,

    /// Upstream request timeout in seconds
    #[arg(long, default_value_t = 120, env = "GFS_REQUEST_TIMEOUT")]
    request_timeout: u64,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "GFS_LOG_JSON")]
    log_json: bool,

    /// Number of tokio worker threads (default: number of CPU cores)
    #[arg(long, env = "GFS_WORKER_THREADS")]
    worker_threads: Option<usize>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Listen address
        #[arg(short, long, default_value = DEFAULT_LISTEN, env = "GFS_LISTEN_ADDR")]
        listen: String,
    },
    /// Render one map to a PNG file and exit
    Render {
        /// Run date, YYYY-MM-DD (default: today UTC)
        #[arg(long)]
        date: Option<String>,

        /// Run cycle: 00, 06, 12 or 18
        #[arg(long, default_value = "00")]
        cycle: String,

        /// Forecast hour, 0-240
        #[arg(long, default_value = "0")]
        step: String,

        /// Parameter selector or key (pratesfc, tmp2m, ugrd10m, prmsl)
        #[arg(long)]
        parameter: String,

        /// Output file (default: the download name, e.g. tmp2m_t+006.png)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder.build().context("Failed to create Tokio runtime")?;
    runtime.block_on(async_main(args))
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = fmt().with_env_filter(filter).with_target(true).with_level(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn async_main(args: Args) -> Result<()> {
    init_tracing(&args.log_level, args.log_json);

    let deployment = select_deployment(args.deployment.as_deref(), &args.deployments_dir)?;
    let source = if args.offline {
        ForecastSource::offline(&deployment)
    } else {
        let config = ClientConfig {
            connect_timeout: Duration::from_secs(args.connect_timeout),
            request_timeout: Duration::from_secs(args.request_timeout),
            user_agent: format!("gfs-viewer/{}", env!("CARGO_PKG_VERSION")),
        };
        ForecastSource::remote(&args.data_host, config).context("Failed to create data server client")?
    };
    info!(deployment = %deployment.name, source = %source.describe(), "Starting GFS viewer");

    let renderer = MapRenderer::new(deployment).context("Failed to load map assets")?;
    let state = Arc::new(AppState::new(source, renderer));

    let command = args.command.unwrap_or_else(|| Command::Serve {
        listen: std::env::var("GFS_LISTEN_ADDR").unwrap_or_else(|_| DEFAULT_LISTEN.to_string()),
    });
    match command {
        Command::Serve { listen } => serve(state, &listen).await,
        Command::Render {
            date,
            cycle,
            step,
            parameter,
            output,
        } => {
            let date = date.unwrap_or_else(|| Utc::now().date_naive().format("%Y-%m-%d").to_string());
            let request = MapRequest::parse(&date, &cycle, &step, &parameter)?;
            render_to_file(&state, &request, output.as_deref()).await
        }
    }
}

async fn serve(state: Arc<AppState>, listen: &str) -> Result<()> {
    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    info!("Prometheus metrics exporter initialized");

    let app = router(state, prometheus_handle);

    let addr: SocketAddr = listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", listen))?;
    info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn render_to_file(state: &AppState, request: &MapRequest, output: Option<&Path>) -> Result<()> {
    let map = render_map(state, request).await?;
    let path = output.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(&map.file_name));
    std::fs::write(&path, &map.png).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = map.png.len(), valid = %map.valid_time, "Wrote map");
    Ok(())
}
