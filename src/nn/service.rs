use std::sync::Arc;
use std::time::Instant;

use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use thiserror::Error;

use super::engine::{Engine, EngineError};
use super::labels::ClassNames;
use super::preprocess::{argmax, preprocess};
use crate::error::ErrorBody;
use crate::store::{BlobStore, StorageError};

#[derive(Debug, Error)]
pub enum NnError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("image could not be decoded: {0}")]
    Decode(#[from] image::ImageError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("model produced no scores")]
    EmptyOutput,

    #[error("model output index {0} has no class name")]
    UnknownClass(usize),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<BlockingError> for NnError {
    fn from(e: BlockingError) -> Self {
        NnError::Internal(e.to_string())
    }
}

impl ResponseError for NnError {
    fn status_code(&self) -> StatusCode {
        match self {
            NnError::Storage(StorageError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            NnError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = self.to_string();
        HttpResponse::build(self.status_code()).json(ErrorBody { detail: &message })
    }
}

pub struct NeuralNetworkService {
    blobs: Arc<dyn BlobStore>,
    engine: Arc<dyn Engine>,
    class_names: Arc<ClassNames>,
    num_classes: usize,
    img_height: u32,
    img_width: u32,
}

impl NeuralNetworkService {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        engine: Arc<dyn Engine>,
        class_names: ClassNames,
        num_classes: usize,
        (img_height, img_width): (u32, u32),
    ) -> Self {
        if class_names.len() != num_classes {
            log::warn!(
                "model has {} classes but {} class names are loaded",
                num_classes,
                class_names.len()
            );
        }
        NeuralNetworkService {
            blobs,
            engine,
            class_names: Arc::new(class_names),
            num_classes,
            img_height,
            img_width,
        }
    }

    //None when there is no such image or it is empty
    pub async fn get_prediction(&self, image_id: &str) -> Result<Option<String>, NnError> {
        let blobs = Arc::clone(&self.blobs);
        let engine = Arc::clone(&self.engine);
        let class_names = Arc::clone(&self.class_names);
        let (height, width) = (self.img_height, self.img_width);
        let image_id = image_id.to_string();

        web::block(move || -> Result<Option<String>, NnError> {
            let image = match blobs.get(&image_id)? {
                Some(image) if !image.is_empty() => image,
                _ => return Ok(None),
            };
            let started = Instant::now();
            let tensor = preprocess(&image, height, width)?;
            let scores = engine.predict(&tensor)?;
            let index = argmax(&scores).ok_or(NnError::EmptyOutput)?;
            let class_name = class_names
                .get(index)
                .ok_or(NnError::UnknownClass(index))?
                .to_string();
            log::info!(
                "image {} classified as {} in {} msec",
                image_id,
                class_name,
                started.elapsed().as_millis()
            );
            Ok(Some(class_name))
        })
        .await?
    }

    pub fn get_all_classes(&self) -> Vec<String> {
        self.class_names.to_vec()
    }

    pub fn get_cnt_classes(&self) -> usize {
        self.num_classes
    }
}
