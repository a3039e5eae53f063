use std::sync::{Mutex, MutexGuard};

use super::{DishRepository, PredictionRepository, StorageError, StoreResult};
use crate::models::{Dish, NewDish, NewPrediction, Prediction};

#[derive(Default)]
struct Tables {
    dishes: Vec<Dish>,
    predictions: Vec<Prediction>,
    last_dish_id: i32,
    last_prediction_id: i32,
}

//same unique-name and foreign-key rules as the postgres schema
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dishes(seed: Vec<NewDish>) -> StoreResult<Self> {
        let store = Self::new();
        store.seed(&seed)?;
        Ok(store)
    }

    //existing names are skipped, like the postgres seed
    pub fn seed(&self, seed: &[NewDish]) -> StoreResult<usize> {
        let mut tables = self.lock()?;
        let mut inserted = 0;
        for new_dish in seed {
            if tables.dishes.iter().any(|d| d.name == new_dish.name) {
                continue;
            }
            tables.last_dish_id += 1;
            let id = tables.last_dish_id;
            tables.dishes.push(Dish {
                id,
                name: new_dish.name.clone(),
                calories: new_dish.calories,
                protein: new_dish.protein,
                fat: new_dish.fat,
                carbs: new_dish.carbs,
            });
            inserted += 1;
        }
        Ok(inserted)
    }

    //no cascade, predictions referencing the dish are left dangling
    pub fn remove_dish(&self, dish_id: i32) -> StoreResult<Option<Dish>> {
        let mut tables = self.lock()?;
        let position = tables.dishes.iter().position(|d| d.id == dish_id);
        Ok(position.map(|i| tables.dishes.remove(i)))
    }

    pub fn prediction_count(&self) -> usize {
        self.lock().map(|t| t.predictions.len()).unwrap_or(0)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StorageError::Backend("memory store poisoned".to_string()))
    }
}

fn page<T: Clone>(rows: &[T], skip: i64, limit: i64) -> Vec<T> {
    rows.iter()
        .skip(skip.max(0) as usize)
        .take(limit.max(0) as usize)
        .cloned()
        .collect()
}

impl DishRepository for MemoryStore {
    fn all_dishes(&self, skip: i64, limit: i64) -> StoreResult<Vec<Dish>> {
        Ok(page(&self.lock()?.dishes, skip, limit))
    }

    fn dish_by_id(&self, dish_id: i32) -> StoreResult<Option<Dish>> {
        Ok(self.lock()?.dishes.iter().find(|d| d.id == dish_id).cloned())
    }

    fn dish_by_name(&self, name: &str) -> StoreResult<Option<Dish>> {
        Ok(self.lock()?.dishes.iter().find(|d| d.name == name).cloned())
    }
}

impl PredictionRepository for MemoryStore {
    fn all_predictions(&self, skip: i64, limit: i64) -> StoreResult<Vec<Prediction>> {
        Ok(page(&self.lock()?.predictions, skip, limit))
    }

    fn prediction_by_id(&self, prediction_id: i32) -> StoreResult<Option<Prediction>> {
        Ok(self
            .lock()?
            .predictions
            .iter()
            .find(|p| p.id == prediction_id)
            .cloned())
    }

    fn create_prediction(&self, new_prediction: NewPrediction) -> StoreResult<Prediction> {
        let mut tables = self.lock()?;
        if !tables.dishes.iter().any(|d| d.id == new_prediction.dish_id) {
            return Err(StorageError::Integrity(format!(
                "dish {} does not exist",
                new_prediction.dish_id
            )));
        }
        tables.last_prediction_id += 1;
        let prediction = Prediction {
            id: tables.last_prediction_id,
            dish_id: new_prediction.dish_id,
            prediction_name: new_prediction.prediction_name,
            result: new_prediction.result,
            image_id: new_prediction.image_id,
        };
        tables.predictions.push(prediction.clone());
        Ok(prediction)
    }
}
