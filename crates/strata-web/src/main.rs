use std::path::PathBuf;

use clap::Parser;
use strata_core::{AppConfigTrait, Environment};
use strata_http::{
    init_logging, log_shutdown_info, log_startup_info, HttpConfig, LogFormat, LoggingConfig,
    Server,
};
use strata_security::SecurityConfig;
use strata_web::demo::demo_router;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "strata-demo")]
#[command(about = "Demo server for the strata request pipeline")]
struct Cli {
    /// Host to bind the server to (overrides STRATA_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind the server to (overrides STRATA_PORT)
    #[arg(long, short)]
    port: Option<u16>,

    /// Security configuration file (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format: plain, pretty or json
    #[arg(long)]
    log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let environment = Environment::from_env()?;

    let mut logging = if environment.is_production() {
        LoggingConfig::production()
    } else {
        LoggingConfig::development()
    }
    .with_service("strata-demo", strata_web::VERSION);
    if let Some(format) = cli.log_format {
        logging = logging.with_format(format);
    }
    init_logging(logging).map_err(|e| anyhow::anyhow!(e))?;

    let mut http = HttpConfig::from_env()?;
    if let Some(host) = cli.host {
        http.host = host;
    }
    if let Some(port) = cli.port {
        http.port = port;
    }
    http.validate()?;

    let security = match &cli.config {
        Some(path) => SecurityConfig::from_yaml_file(path)?,
        None => SecurityConfig::default(),
    };

    info!(
        environment = %environment,
        config = ?cli.config,
        rate_limiting = security.rate_limiting.is_some(),
        cors = security.cors.is_some(),
        "starting strata demo"
    );

    let router = demo_router(&security, &http.health_check_path);
    log_startup_info("strata-demo", strata_web::VERSION);
    Server::new(http).serve(router).await?;
    log_shutdown_info("strata-demo");
    Ok(())
}
