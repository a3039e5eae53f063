use std::io;
use std::sync::Arc;

use actix_web::{middleware, web, App, HttpServer};

use caloriecam::config::NnConfig;
use caloriecam::nn::engine::SavedModelEngine;
use caloriecam::nn::{api, ClassNames, NeuralNetworkService};
use caloriecam::store::{blob, RedisBlobStore};

fn other<E: std::fmt::Display>(e: E) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = NnConfig::from_env().map_err(other)?;

    let class_names = ClassNames::load(&config.class_names_path);
    let engine = SavedModelEngine::load(&config.model_dir, &config.input_op, &config.output_op)
        .map_err(other)?;

    let redis_pool = blob::redis_pool(&config.redis_url).map_err(other)?;
    let nn_service = web::Data::new(NeuralNetworkService::new(
        Arc::new(RedisBlobStore::new(redis_pool, None)),
        Arc::new(engine),
        class_names,
        config.num_classes,
        (config.img_height, config.img_width),
    ));

    log::info!("starting {} at http://{}", api::SERVICE_TITLE, config.bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(nn_service.clone())
            .wrap(middleware::Logger::default())
            .configure(api::configure)
    })
    .bind(config.bind_addr.as_str())?
    .run()
    .await
}
