//! People service
//!
//! Serves an in-memory `people` store at `/people/` and `/people/:id`.
//!
//! ```bash
//! STORE_HTTP_SERVICE__PORT=3000 cargo run -p people-service
//! curl -H 'Range: items=0-9' 'localhost:3000/people/?sortBy=+surname,-age'
//! ```

use std::sync::Arc;

use store_http::prelude::*;

fn people_store(config: &Config) -> MemoryStore {
    let descriptor = StoreDescriptor::from_config("people", "/people/:id", &config.http)
        .with_sortable_fields(["name", "surname", "age"])
        .with_default_sort(SortSpec::new().with("surname", SortDirection::Ascending));

    MemoryStore::new(descriptor)
        .with_required_fields(["name", "surname"])
        .with_records([
            json!({ "id": "1", "name": "Tony", "surname": "Mobily", "age": 40 }),
            json!({ "id": "2", "name": "Chiara", "surname": "Mobily", "age": 9 }),
            json!({ "id": "3", "name": "Sara", "surname": "Fabbri", "age": 38 }),
        ])
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load_for_service("people-service")?;
    init_tracing(&config)?;

    let store = Arc::new(people_store(&config));
    let registrar = RouteRegistrar::new(store)?;
    tracing::info!(
        base_path = %registrar.paths().base_path,
        id_path = %registrar.paths().id_path,
        "People store ready"
    );

    Server::new(config).serve(registrar.into_router()).await?;

    Ok(())
}
