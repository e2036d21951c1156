//! # Lead-Relay Service
//!
//! Binary entry point for the lead-relay HTTP service.
//!
//! This executable:
//! - Loads configuration from files and environment
//! - Initializes logging
//! - Builds the CRM client, resolver, and per-source handlers
//! - Starts the HTTP server from lead-relay-api
//!
//! Exit codes: 1 bind failure, 2 server failure, 3 configuration error.

use lead_relay_api::{start_server, HandlerRegistry, LeadSource, ServiceConfig, ServiceError};
use lead_relay_core::handlers::{BayutWhatsappHandler, DubizzleWhatsappHandler};
use lead_relay_core::{CrmApi, ResponsiblePersonResolver, RestCrmClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -------------------------------------------------------------------------
    // Load configuration
    //
    // Sources (applied in order — later sources override earlier ones):
    //  1. /etc/lead-relay/service.yaml     — system-wide defaults
    //  2. ./config/service.yaml            — deployment-local override
    //  3. Path given by LR_CONFIG_FILE env — operator-specified file
    //  4. Environment variables prefixed LR__ (double-underscore separator)
    //     e.g. LR__SERVER__PORT=9090 sets server.port = 9090
    //
    // All sections carry serde defaults, so absent files produce a valid
    // config apart from the CRM base URL, which must be supplied. A
    // malformed file or an uncoercible environment variable is a hard error.
    //
    // Configuration is loaded before logging is initialized (the logging
    // section decides the output format), so these failures go to stderr.
    // -------------------------------------------------------------------------
    let mut config_builder = config::Config::builder()
        .add_source(
            config::File::with_name("/etc/lead-relay/service")
                .required(false)
                .format(config::FileFormat::Yaml),
        )
        .add_source(
            config::File::with_name("config/service")
                .required(false)
                .format(config::FileFormat::Yaml),
        );

    // Optional explicit path supplied by the operator.
    if let Ok(explicit_path) = std::env::var("LR_CONFIG_FILE") {
        if !explicit_path.is_empty() {
            config_builder = config_builder.add_source(
                config::File::with_name(&explicit_path)
                    .required(true)
                    .format(config::FileFormat::Yaml),
            );
        }
    }

    let config = match config_builder
        .add_source(config::Environment::with_prefix("LR").separator("__"))
        .build()
    {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to build configuration; aborting: {e}");
            std::process::exit(3);
        }
    };

    let service_config: ServiceConfig = match config.try_deserialize() {
        Ok(sc) => sc,
        Err(e) => {
            eprintln!(
                "Could not deserialize service configuration; aborting. \
                 Fix the configuration and restart: {e}"
            );
            std::process::exit(3);
        }
    };

    if let Err(e) = service_config.validate() {
        eprintln!("Service configuration is invalid; aborting: {e}");
        std::process::exit(3);
    }

    // -------------------------------------------------------------------------
    // Initialize logging
    //
    // RUST_LOG wins when set; otherwise the configured directive applies.
    // -------------------------------------------------------------------------
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&service_config.logging.level));

    if service_config.logging.json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!("Starting Lead-Relay Service");

    // -------------------------------------------------------------------------
    // Build the CRM pipeline and handler registry
    //
    // Every supported lead source gets its handler registered here; the
    // dispatcher treats a source without a handler as an unknown route.
    // -------------------------------------------------------------------------
    let crm_client = match RestCrmClient::new(
        service_config.crm_api.base_url.clone(),
        Duration::from_secs(service_config.crm_api.timeout_seconds),
    ) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!(error = %e, "Failed to build CRM client; aborting");
            std::process::exit(3);
        }
    };

    let crm_config = Arc::new(service_config.crm.clone());
    let crm_api = CrmApi::new(crm_client);
    let resolver = ResponsiblePersonResolver::new(crm_api.clone(), crm_config.clone());

    let mut registry = HandlerRegistry::new();
    registry.register(LeadSource::BayutWhatsapp, Arc::new(BayutWhatsappHandler));
    registry.register(
        LeadSource::DubizzleWhatsapp,
        Arc::new(DubizzleWhatsappHandler::new(
            crm_api,
            resolver,
            crm_config,
        )),
    );

    for source in LeadSource::ALL {
        if registry.contains(source) {
            info!(source = %source, "Registered lead source handler");
        }
    }

    info!(
        host = %service_config.server.host,
        port = service_config.server.port,
        "Starting HTTP server"
    );

    // Start the server
    if let Err(e) = start_server(service_config, registry).await {
        error!("Failed to start server: {}", e);

        let exit_code = match e {
            ServiceError::BindFailed { .. } => 1,
            ServiceError::ServerFailed { .. } => 2,
            ServiceError::Configuration(_) => 3,
        };

        std::process::exit(exit_code);
    }

    Ok(())
}
