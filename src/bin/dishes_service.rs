use std::io;
use std::sync::Arc;

use actix_web::{middleware, web, App, HttpServer};

use caloriecam::api;
use caloriecam::classifier::{Classifier, HttpClassifier};
use caloriecam::config::DishesConfig;
use caloriecam::models::NewDish;
use caloriecam::service::{DishService, PredictionOrchestrator, QueryService};
use caloriecam::store::{blob, pg, BlobStore, CachedDishRepository, PgStore, RedisBlobStore};

fn other<E: std::fmt::Display>(e: E) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = DishesConfig::from_env().map_err(other)?;

    // set up database connection pool
    let pool = pg::connect(&config.database_url, config.db_pool_size).map_err(other)?;
    let circuit_breaker = failsafe::Config::new().build();
    let store = Arc::new(PgStore::new(pool, circuit_breaker));

    if let Some(seed_path) = &config.seed_path {
        let seed = NewDish::read_seed(seed_path)?;
        let inserted = store.seed(&seed).map_err(other)?;
        log::info!(
            "seeded {} of {} dishes from {}",
            inserted,
            seed.len(),
            seed_path.display()
        );
    }

    let redis_pool = blob::redis_pool(&config.redis_url).map_err(other)?;
    let blobs: Arc<dyn BlobStore> =
        Arc::new(RedisBlobStore::new(redis_pool.clone(), config.image_ttl));
    let dishes = DishService::new(Arc::new(CachedDishRepository::new(
        store.clone(),
        redis_pool,
        config.dish_cache_ttl,
    )));
    let classifier: Arc<dyn Classifier> = Arc::new(
        HttpClassifier::new(&config.nn_service_url, config.nn_timeout).map_err(other)?,
    );

    let orchestrator = web::Data::new(PredictionOrchestrator::new(
        blobs,
        classifier,
        dishes.clone(),
        store.clone(),
    ));
    let queries = web::Data::new(QueryService::new(store, dishes.clone()));
    let dishes = web::Data::new(dishes);

    log::info!("starting {} at http://{}", api::SERVICE_TITLE, config.bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(orchestrator.clone())
            .app_data(queries.clone())
            .app_data(dishes.clone())
            .wrap(middleware::Logger::default())
            .configure(api::configure)
    })
    .bind(config.bind_addr.as_str())?
    .run()
    .await
}
