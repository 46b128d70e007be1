mod config;
mod enrich;
mod export;
mod handles;
mod model;
mod outreach;
mod pipeline;
mod providers;
mod reconcile;
mod scoring;
mod storage;
mod utils;

use config::{load_config, AppConfig, QueryConfig};
use enrich::{DuckDuckGoSearcher, HttpSiteScraper, HttpSocialProber};
use futures::future::join_all;
use model::Lead;
use outreach::TemplatePitchGenerator;
use pipeline::Pipeline;
use providers::{GeoapifyProvider, GooglePlacesProvider, NominatimProvider, SourceProvider};
use std::sync::Arc;
use std::time::Duration;
use storage::SqliteStorage;
use tokio::sync::Mutex;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("😱 Panic occurred: {:?}", panic_info);
    }));

    // Load configuration from file
    let config: Arc<AppConfig> = match load_config("config.json") {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    let client = match reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            error!("HTTP client build error: {}", e);
            return;
        }
    };

    let storage = match SqliteStorage::new(&config.db_path) {
        Ok(s) => Arc::new(Mutex::new(s)),
        Err(e) => {
            error!("Failed to initialize storage: {:?}", e);
            return;
        }
    };

    // Ranked source providers; disabled ones (no API key) are skipped.
    let providers: Vec<Arc<dyn SourceProvider>> = vec![
        Arc::new(GooglePlacesProvider::new(
            client.clone(),
            config.google_places_api_key.clone(),
        )),
        Arc::new(GeoapifyProvider::new(
            client.clone(),
            config.geoapify_api_key.clone(),
        )),
        Arc::new(NominatimProvider::new(client.clone())),
    ];

    let pipeline = Arc::new(Pipeline::new(
        providers,
        Arc::new(NominatimProvider::new(client.clone())),
        Arc::new(HttpSiteScraper::new(client.clone())),
        Arc::new(HttpSocialProber::new(client.clone())),
        Arc::new(DuckDuckGoSearcher::new(client.clone())),
        Arc::new(TemplatePitchGenerator::new()),
        storage,
        Duration::from_millis(config.probe_delay_ms),
        config.max_handle_candidates,
    ));

    info!("Queries to process: {}", config.queries.len());
    let tasks: Vec<_> = config
        .queries
        .iter()
        .map(|query| run_query(pipeline.clone(), query.clone()))
        .collect();
    let results = join_all(tasks).await;
    let leads: Vec<Lead> = results.into_iter().flatten().collect();

    if let Some(path) = &config.export_csv_path {
        match export::write_csv(path, &leads) {
            Ok(()) => info!("Exported {} leads to {}", leads.len(), path),
            Err(e) => error!("CSV export failed: {}", e),
        }
    }

    info!("Done. {} leads processed.", leads.len());
}

/// Runs one configured query; a persistence failure ends that query but not
/// the process.
async fn run_query(pipeline: Arc<Pipeline>, query: QueryConfig) -> Vec<Lead> {
    match pipeline.run(&query).await {
        Ok(leads) => leads,
        Err(e) => {
            error!(
                "Query '{}' in {} aborted: {}",
                query.business_type, query.city, e
            );
            Vec::new()
        }
    }
}
