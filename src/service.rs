use std::sync::Arc;

use actix_web::web::{self, Bytes};

use crate::classifier::Classifier;
use crate::error::{Result, ServiceError};
use crate::models::{Dish, NewPrediction, Prediction, PredictionInfo};
use crate::store::{BlobStore, DishRepository, PredictionRepository};

pub const DEFAULT_DISH_LIMIT: i64 = 100;
pub const DEFAULT_PREDICTION_LIMIT: i64 = 5;

#[derive(Clone)]
pub struct DishService {
    repo: Arc<dyn DishRepository>,
}

impl DishService {
    pub fn new(repo: Arc<dyn DishRepository>) -> Self {
        DishService { repo }
    }

    pub async fn all_dishes(&self, skip: i64, limit: i64) -> Result<Vec<Dish>> {
        let repo = Arc::clone(&self.repo);
        Ok(web::block(move || repo.all_dishes(skip, limit)).await??)
    }

    pub async fn dish_by_name(&self, name: &str) -> Result<Option<Dish>> {
        let repo = Arc::clone(&self.repo);
        let name = name.to_string();
        Ok(web::block(move || repo.dish_by_name(&name)).await??)
    }

    pub async fn dish_by_id(&self, dish_id: i32) -> Result<Option<Dish>> {
        let repo = Arc::clone(&self.repo);
        Ok(web::block(move || repo.dish_by_id(dish_id)).await??)
    }
}

//blob write, classify, dish lookup, insert. first failure aborts, nothing is undone
pub struct PredictionOrchestrator {
    blobs: Arc<dyn BlobStore>,
    classifier: Arc<dyn Classifier>,
    dishes: DishService,
    predictions: Arc<dyn PredictionRepository>,
}

impl PredictionOrchestrator {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        classifier: Arc<dyn Classifier>,
        dishes: DishService,
        predictions: Arc<dyn PredictionRepository>,
    ) -> Self {
        PredictionOrchestrator {
            blobs,
            classifier,
            dishes,
            predictions,
        }
    }

    pub async fn submit(&self, display_label: &str, image: Bytes) -> Result<Prediction> {
        let blobs = Arc::clone(&self.blobs);
        let image_ref = web::block(move || blobs.put(&image)).await??;
        log::debug!("stored image {} for {:?}", image_ref, display_label);

        let label = match self.classifier.classify(&image_ref).await {
            Ok(label) => label,
            Err(e) => {
                log::warn!("classification failed, image {} left orphaned: {}", image_ref, e);
                return Err(e.into());
            }
        };
        log::debug!("image {} classified as {:?}", image_ref, label);

        let dish = self.dishes.dish_by_name(&label).await?.ok_or_else(|| {
            log::warn!("no dish for label {:?}, image {} left orphaned", label, image_ref);
            ServiceError::NotFound(format!("No dish named {:?}", label))
        })?;

        let new_prediction = NewPrediction {
            dish_id: dish.id,
            prediction_name: display_label.to_string(),
            result: label,
            image_id: Some(image_ref),
        };
        let predictions = Arc::clone(&self.predictions);
        let prediction = web::block(move || predictions.create_prediction(new_prediction)).await??;
        log::info!(
            "prediction {} created: {:?} -> {}",
            prediction.id,
            prediction.prediction_name,
            dish.name
        );
        Ok(prediction)
    }
}

#[derive(Clone)]
pub struct QueryService {
    predictions: Arc<dyn PredictionRepository>,
    dishes: DishService,
}

impl QueryService {
    pub fn new(predictions: Arc<dyn PredictionRepository>, dishes: DishService) -> Self {
        QueryService {
            predictions,
            dishes,
        }
    }

    pub async fn get(&self, prediction_id: i32) -> Result<PredictionInfo> {
        let predictions = Arc::clone(&self.predictions);
        let prediction = web::block(move || predictions.prediction_by_id(prediction_id))
            .await??
            .ok_or_else(|| ServiceError::NotFound(format!("Prediction {} not found", prediction_id)))?;

        let dish = self
            .dishes
            .dish_by_id(prediction.dish_id)
            .await?
            .ok_or_else(|| {
                ServiceError::DataIntegrity(format!(
                    "prediction {} references missing dish {}",
                    prediction.id, prediction.dish_id
                ))
            })?;

        Ok(PredictionInfo::join(&prediction, &dish))
    }

    pub async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Prediction>> {
        let predictions = Arc::clone(&self.predictions);
        Ok(web::block(move || predictions.all_predictions(skip, limit)).await??)
    }
}
