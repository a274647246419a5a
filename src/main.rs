use chat_proxy::config::config_search_paths;
use chat_proxy::providers::ProviderPreset;
use chat_proxy::{build_router, AppState, CompletionProxy, ProxyConfig, SharedLogger};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "chat-proxy",
    about = "Forward chat requests to an OpenAI-compatible API and answer in Anthropic message format",
    version
)]
struct Cli {
    /// Path to config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Provider name (overrides config)
    #[arg(long)]
    provider: Option<String>,

    /// Upstream model identifier (overrides config)
    #[arg(short, long)]
    model: Option<String>,

    /// Log file path
    #[arg(long, default_value = "chat-proxy.log")]
    log_file: PathBuf,

    /// Print config search paths and exit
    #[arg(long)]
    show_config_paths: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if cli.show_config_paths {
        println!("Config search paths:");
        for (i, path) in config_search_paths().iter().enumerate() {
            println!("  {}. {}", i + 1, path.display());
        }
        return Ok(());
    }

    let mut config = ProxyConfig::find_and_load(cli.config.as_deref())?;

    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(ref provider) = cli.provider {
        config.provider.name = provider.clone();
        if let Some(preset) = ProviderPreset::from_name(provider) {
            config.provider.base_url = Some(preset.base_url.to_string());
            config.provider.api_key_env = Some(preset.default_api_key_env.to_string());
        }
    }
    if let Some(ref model) = cli.model {
        config.provider.model = model.clone();
    }

    let logger = SharedLogger::new(&cli.log_file)?;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
        .build()?;

    // Resolve endpoint and credential eagerly so a bad config fails at startup
    let proxy = CompletionProxy::new(config.upstream_settings()?, client, logger.clone());
    let settings = proxy.settings();

    info!("chat-proxy v{}", env!("CARGO_PKG_VERSION"));
    info!("  Provider:  {}", config.provider.name);
    info!("  Endpoint:  {}", settings.endpoint);
    info!("  Model:     {}", settings.model);
    info!("  Params:    max_tokens={} temperature={}", settings.max_tokens, settings.temperature);
    info!("  Port:      {}", config.port);
    info!("  Log file:  {}", cli.log_file.display());

    logger.info(
        "startup",
        format!(
            "Starting chat-proxy provider={} model={} port={}",
            config.provider.name, settings.model, config.port
        ),
    );

    let state = Arc::new(AppState { proxy });

    let app = build_router(state);
    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("Listening on http://{}/chat", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
