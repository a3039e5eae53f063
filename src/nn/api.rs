use actix_web::{get, web, HttpResponse};
use serde::{Deserialize, Serialize};

use super::service::{NeuralNetworkService, NnError};
use crate::error::ErrorBody;

pub const SERVICE_TITLE: &str = "NeuralNetworkService";

#[derive(Debug, Serialize, Deserialize)]
pub struct GetPrediction {
    pub predicted_class: String,
}

#[get("/")]
async fn root() -> HttpResponse {
    HttpResponse::Ok().json(format!("Hello, from {}", SERVICE_TITLE))
}

#[get("/predict/{id}")]
async fn get_prediction(
    id: web::Path<String>,
    nn_service: web::Data<NeuralNetworkService>,
) -> Result<HttpResponse, NnError> {
    match nn_service.get_prediction(id.as_str()).await? {
        Some(predicted_class) => Ok(HttpResponse::Ok().json(GetPrediction { predicted_class })),
        None => Ok(HttpResponse::NotFound().json(ErrorBody {
            detail: "Image not found or prediction failed",
        })),
    }
}

#[get("/classes")]
async fn get_all_classes(nn_service: web::Data<NeuralNetworkService>) -> HttpResponse {
    HttpResponse::Ok().json(nn_service.get_all_classes())
}

#[get("/classes/count")]
async fn get_classes_count(nn_service: web::Data<NeuralNetworkService>) -> HttpResponse {
    HttpResponse::Ok().json(nn_service.get_cnt_classes())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(root).service(
        web::scope("/nn")
            .service(get_prediction)
            .service(get_classes_count)
            .service(get_all_classes),
    );
}
