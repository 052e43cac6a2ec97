mod config;
mod error;
mod graph_builder;
mod importer;
mod model;
mod store;

use anyhow::Result;
use config::Config;
use store::Neo4jStore;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("🚀 Meeting graph importer starting...");

    let config = Config::from_env().with_input_override(std::env::args().nth(1));

    let store = match Neo4jStore::connect(&config.neo4j).await {
        Ok(store) => store,
        Err(e) => {
            error!("❌ {}", e);
            println!("Failed to connect to Neo4j!");
            anyhow::bail!("could not connect to {:?}", config.neo4j.uri);
        }
    };

    // The store is released on every path out of here
    let outcome = run(&store, &config).await;
    store.close();
    outcome
}

async fn run(store: &Neo4jStore, config: &Config) -> Result<()> {
    if !store::test_connection(store).await {
        println!("Connection test failed!");
        anyhow::bail!("Neo4j connection test failed");
    }
    println!("Successfully connected to Neo4j!");

    if !importer::import_file(store, &config.meetings_file, config.batch).await {
        println!("Import of {} failed!", config.meetings_file.display());
        anyhow::bail!("import of {:?} failed", config.meetings_file);
    }
    println!("Imported {} into Neo4j", config.meetings_file.display());

    let counts = store::graph_counts(store).await?;
    println!("Number of nodes in database: {}", counts.nodes);
    println!("Number of relationships in database: {}", counts.relationships);

    Ok(())
}

#[cfg(test)]
mod tests;
