use thiserror::Error;

use crate::models::{Dish, NewPrediction, Prediction};

pub mod blob;
pub mod cache;
pub mod memory;
pub mod pg;

pub use blob::{BlobStore, MemoryBlobStore, RedisBlobStore};
pub use cache::CachedDishRepository;
pub use memory::MemoryStore;
pub use pg::PgStore;

#[derive(Debug, Error)]
pub enum StorageError {
    //circuit open or backend unreachable
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store error: {0}")]
    Backend(String),

    #[error("integrity violation: {0}")]
    Integrity(String),
}

pub type StoreResult<T> = Result<T, StorageError>;

pub trait DishRepository: Send + Sync {
    fn all_dishes(&self, skip: i64, limit: i64) -> StoreResult<Vec<Dish>>;

    fn dish_by_id(&self, dish_id: i32) -> StoreResult<Option<Dish>>;

    //exact, case sensitive
    fn dish_by_name(&self, name: &str) -> StoreResult<Option<Dish>>;
}

pub trait PredictionRepository: Send + Sync {
    fn all_predictions(&self, skip: i64, limit: i64) -> StoreResult<Vec<Prediction>>;

    fn prediction_by_id(&self, prediction_id: i32) -> StoreResult<Option<Prediction>>;

    fn create_prediction(&self, new_prediction: NewPrediction) -> StoreResult<Prediction>;
}

impl<T: DishRepository + ?Sized> DishRepository for std::sync::Arc<T> {
    fn all_dishes(&self, skip: i64, limit: i64) -> StoreResult<Vec<Dish>> {
        (**self).all_dishes(skip, limit)
    }

    fn dish_by_id(&self, dish_id: i32) -> StoreResult<Option<Dish>> {
        (**self).dish_by_id(dish_id)
    }

    fn dish_by_name(&self, name: &str) -> StoreResult<Option<Dish>> {
        (**self).dish_by_name(name)
    }
}
