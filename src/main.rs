use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dialectic_engine::{
    config::{Config, LogFormat},
    langbase::{LangbaseBackend, LangbaseClient},
    resolve_personas, DialecticRequest, DialecticService,
};

/// Run a thesis → antithesis → synthesis reasoning pass over a query.
#[derive(Debug, Parser)]
#[command(name = "dialectic", version, about)]
struct Args {
    /// The question to reason about
    query: String,

    /// Number of antithesis/synthesis cycles
    #[arg(short, long, default_value_t = 1)]
    iterations: u32,

    /// Persona group (balanced, rigorous, all) or comma-separated persona names
    #[arg(short, long)]
    personas: Option<String>,

    /// Include the conflict score debug block
    #[arg(long)]
    debug: bool,

    /// Include the per-iteration trace
    #[arg(long)]
    trace: bool,

    /// Bypass the result cache
    #[arg(long)]
    no_cache: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    if args.no_cache {
        config.cache.enabled = false;
    }

    // Initialize logging
    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        model = %config.engine.model,
        "Dialectic engine starting"
    );

    let personas = resolve_personas(args.personas.as_deref().unwrap_or_default())?;

    // Initialize Langbase client
    let client = match LangbaseClient::new(&config.langbase, config.request.clone()) {
        Ok(c) => {
            info!(base_url = %config.langbase.base_url, "Langbase client initialized");
            c
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize Langbase client");
            return Err(e.into());
        }
    };

    // Ensure the pipe exists with the configured model settings
    if let Err(e) = client
        .ensure_pipe(
            &config.langbase.pipe,
            &config.engine.model,
            config.engine.temperature,
            config.engine.max_tokens,
        )
        .await
    {
        error!(error = %e, pipe = %config.langbase.pipe, "Failed to ensure dialectic pipe exists");
        return Err(e.into());
    }

    let backend = LangbaseBackend::new(client, &config.langbase.pipe, &config.engine.model);
    let service = DialecticService::new(config, Arc::new(backend));

    let request = DialecticRequest::new(args.query)
        .with_iterations(args.iterations)
        .with_personas(personas)
        .with_debug(args.debug)
        .with_trace(args.trace);

    let result = match service.run(request).await {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "Dialectic run failed");
            return Err(e.into());
        }
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
