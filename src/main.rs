//! LTI 1.3 tool server

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use lti_tool::{
    LtiTool,
    cli::{Cli, Command},
    config::Config,
    server, setup_tracing,
    trust::StaticSigningKey,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    match cli.command {
        Some(Command::CheckConfig) => check_config(&cli),
        Some(Command::Serve) | None => run_server(&cli).await,
    }
}

fn load_config(cli: &Cli) -> Option<Config> {
    match Config::load(cli.config.as_deref()) {
        Ok(mut config) => {
            if let Some(port) = cli.port {
                config.server.port = port;
            }
            if let Some(ref host) = cli.host {
                config.server.host = host.clone();
            }
            Some(config)
        }
        Err(e) => {
            error!("Failed to load configuration: {e}");
            None
        }
    }
}

fn check_config(cli: &Cli) -> ExitCode {
    let Some(config) = load_config(cli) else {
        return ExitCode::FAILURE;
    };

    if let Err(e) = config.validate() {
        eprintln!("❌ {e}");
        return ExitCode::FAILURE;
    }

    println!("✅ Registration for client {} is complete", config.client_id);
    println!("   Login:  {}", config.auth_login_url);
    println!("   Launch: {}", config.launch_url);
    println!("   Keys:   {}", config.key_set_url);
    println!("   Token:  {}", config.auth_token_url);
    if config.signing_key_path.is_none() {
        println!("   ⚠ No signing key: services and deep linking are unavailable");
    }
    ExitCode::SUCCESS
}

async fn run_server(cli: &Cli) -> ExitCode {
    let Some(config) = load_config(cli) else {
        return ExitCode::FAILURE;
    };

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {e}");
        return ExitCode::FAILURE;
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.server.port,
        client_id = %config.client_id,
        nonce_policy = ?config.nonce_policy,
        "Starting LTI tool"
    );

    let key_path = config.signing_key_path.clone();
    let tool = match LtiTool::new(config) {
        Ok(tool) => Arc::new(tool),
        Err(e) => {
            error!("Failed to create tool: {e}");
            return ExitCode::FAILURE;
        }
    };

    match key_path {
        Some(path) => match StaticSigningKey::from_rsa_pem_file(Path::new(&path)) {
            Ok(key) => tool.set_signing_key(Arc::new(key)),
            Err(e) => {
                error!("Failed to load signing key: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => warn!("No signing key configured; platform services are unavailable"),
    }

    let routes = match server::demo_routes() {
        Ok(routes) => routes,
        Err(e) => {
            error!("Failed to define routes: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server::serve(tool, routes).await {
        error!("Server error: {e}");
        return ExitCode::FAILURE;
    }

    info!("Tool shutdown complete");
    ExitCode::SUCCESS
}
