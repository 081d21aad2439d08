//! # Command Line Interface
//!
//! Runs the classification server, or classifies a single request offline
//! against the configured route table and mapping document.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::api::start_server;
use crate::classifier::{InboundRequest, LazyBody, RequestClassifier};
use crate::config::AppConfig;
use crate::observability::{init_logging, log_config_info};
use crate::routing::RouteTable;
use crate::{APP_NAME, VERSION};

#[derive(Debug, Parser)]
#[command(name = "route-classifier")]
#[command(about = "Gateway request classification service")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Mapping document override
    #[arg(long, global = true)]
    pub mapping_file: Option<String>,

    /// Route table override
    #[arg(long, global = true)]
    pub routes_file: Option<String>,

    /// Mount prefix override
    #[arg(long, global = true)]
    pub script_name: Option<String>,

    /// Bind host override
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port override
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve the classification endpoint (default)
    Serve,

    /// Classify one request and print its descriptors as JSON
    Classify {
        /// HTTP method
        method: String,

        /// Request path, including the mount prefix
        path: String,

        /// Raw query string
        #[arg(long)]
        query: Option<String>,

        /// File holding the request body
        #[arg(long)]
        body: Option<PathBuf>,
    },

    /// Load the route table and mapping document, then exit
    Check,
}

impl Cli {
    /// Apply flag overrides on top of environment configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(mapping_file) = &self.mapping_file {
            config.classifier.mapping_file = mapping_file.clone();
        }
        if let Some(routes_file) = &self.routes_file {
            config.classifier.routes_file = routes_file.clone();
        }
        if let Some(script_name) = &self.script_name {
            config.classifier.script_name = script_name.clone();
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.verbose {
            config.observability.log_level = "debug".to_string();
        }
    }
}

pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    cli.apply(&mut config);
    config.validate()?;

    init_logging(&config.observability)?;
    info!(app_name = APP_NAME, version = VERSION, "Starting route classifier");
    log_config_info(&config);

    let classifier = Arc::new(build_classifier(&config)?);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => start_server(&config.server, classifier).await?,
        Commands::Classify { method, path, query, body } => {
            let body = match body {
                Some(file) => std::fs::read(&file)
                    .with_context(|| format!("reading request body {}", file.display()))?,
                None => Vec::new(),
            };
            let request = InboundRequest::new(&method, &path)
                .with_query(query.as_deref())
                .with_body(LazyBody::from_bytes(body));
            let descriptors = classifier
                .classify(&request)
                .map_err(|e| anyhow::anyhow!("{} ({})", e.status_line(), e))?;
            println!("{}", serde_json::to_string_pretty(&descriptors)?);
        }
        Commands::Check => info!("Route table and mapping document loaded"),
    }

    Ok(())
}

/// Load the route table and prime the mapping cache so broken files fail fast.
fn build_classifier(config: &AppConfig) -> anyhow::Result<RequestClassifier> {
    let routes_path = config.classifier.routes_path()?;
    let routes = RouteTable::from_file(&routes_path)
        .with_context(|| format!("loading route table {}", routes_path.display()))?;

    let classifier = RequestClassifier::from_config(&config.classifier, Arc::new(routes))?;
    classifier.mappings().document().with_context(|| {
        format!("loading mapping document {}", classifier.mappings().path().display())
    })?;

    Ok(classifier)
}
