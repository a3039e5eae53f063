use actix_multipart::Multipart;
use actix_web::web::{self, Bytes, BytesMut};
use actix_web::{get, post, HttpResponse};
use futures_util::TryStreamExt;
use serde::Deserialize;

use crate::error::{Result, ServiceError};
use crate::models::SubmitStatus;
use crate::service::{
    DishService, PredictionOrchestrator, QueryService, DEFAULT_DISH_LIMIT,
    DEFAULT_PREDICTION_LIMIT,
};

pub const SERVICE_TITLE: &str = "DishesService";

const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct Page {
    skip: Option<i64>,
    limit: Option<i64>,
}

impl Page {
    fn resolve(&self, default_limit: i64) -> (i64, i64) {
        (
            self.skip.unwrap_or(0).max(0),
            self.limit.unwrap_or(default_limit).max(0),
        )
    }
}

#[get("/")]
async fn root() -> HttpResponse {
    HttpResponse::Ok().json(format!("Hello, from {}", SERVICE_TITLE))
}

#[post("/load_image/{prediction_name}")]
async fn load_image(
    prediction_name: web::Path<String>,
    payload: Multipart,
    orchestrator: web::Data<PredictionOrchestrator>,
) -> Result<HttpResponse> {
    let image = read_upload(payload).await?;
    let prediction = orchestrator.submit(prediction_name.as_str(), image).await?;
    Ok(HttpResponse::Ok().json(SubmitStatus::success(prediction.id)))
}

#[get("/predict/{predict_id}")]
async fn get_prediction(
    predict_id: web::Path<i32>,
    queries: web::Data<QueryService>,
) -> Result<HttpResponse> {
    let info = queries.get(predict_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(info))
}

#[get("/predictions")]
async fn list_predictions(
    page: web::Query<Page>,
    queries: web::Data<QueryService>,
) -> Result<HttpResponse> {
    let (skip, limit) = page.resolve(DEFAULT_PREDICTION_LIMIT);
    let predictions = queries.list(skip, limit).await?;
    Ok(HttpResponse::Ok().json(predictions))
}

#[get("/dishes")]
async fn list_dishes(
    page: web::Query<Page>,
    dishes: web::Data<DishService>,
) -> Result<HttpResponse> {
    let (skip, limit) = page.resolve(DEFAULT_DISH_LIMIT);
    let all = dishes.all_dishes(skip, limit).await?;
    Ok(HttpResponse::Ok().json(all))
}

#[get("/dishes/{dish_id}")]
async fn get_dish(
    dish_id: web::Path<i32>,
    dishes: web::Data<DishService>,
) -> Result<HttpResponse> {
    let dish_id = dish_id.into_inner();
    let dish = dishes
        .dish_by_id(dish_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Dish {} not found", dish_id)))?;
    Ok(HttpResponse::Ok().json(dish))
}

async fn read_upload(mut payload: Multipart) -> Result<Bytes> {
    let invalid = |e: actix_multipart::MultipartError| ServiceError::InvalidRequest(e.to_string());

    while let Some(mut field) = payload.try_next().await.map_err(invalid)? {
        if field.content_disposition().get_name() != Some(UPLOAD_FIELD) {
            while field.try_next().await.map_err(invalid)?.is_some() {}
            continue;
        }
        let mut data = BytesMut::new();
        while let Some(chunk) = field.try_next().await.map_err(invalid)? {
            data.extend_from_slice(&chunk);
        }
        return Ok(data.freeze());
    }

    Err(ServiceError::InvalidRequest(format!(
        "multipart field {:?} is required",
        UPLOAD_FIELD
    )))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(root).service(
        web::scope("/dish")
            .service(load_image)
            .service(get_prediction)
            .service(list_predictions)
            .service(list_dishes)
            .service(get_dish),
    );
}
