use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::schema::{dishes, predictions};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable)]
pub struct Dish {
    pub id: i32,
    pub name: String,
    pub calories: i32,
    pub protein: f64, //grams
    pub fat: f64,
    pub carbs: f64,
}

impl Dish {
    pub(crate) fn from_u8(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }

    pub(crate) fn to_u8(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }
}

#[derive(Debug, Clone, Deserialize, Insertable)]
#[table_name = "dishes"]
pub struct NewDish {
    pub name: String,
    pub calories: i32,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
}

impl NewDish {
    pub fn read_seed(path: &Path) -> io::Result<Vec<NewDish>> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable)]
pub struct Prediction {
    pub id: i32,
    pub dish_id: i32, //foreign key
    pub prediction_name: String,
    //raw classifier label
    pub result: String,
    pub image_id: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[table_name = "predictions"]
pub struct NewPrediction {
    pub dish_id: i32,
    pub prediction_name: String,
    pub result: String,
    pub image_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionInfo {
    pub prediction_name: String,
    pub dish_name: String,
    pub calories: i32,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
}

impl PredictionInfo {
    pub fn join(prediction: &Prediction, dish: &Dish) -> Self {
        PredictionInfo {
            prediction_name: prediction.prediction_name.clone(),
            dish_name: dish.name.clone(),
            calories: dish.calories,
            protein: dish.protein,
            fat: dish.fat,
            carbs: dish.carbs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitStatus {
    pub status: String,
    pub id: i32,
}

impl SubmitStatus {
    pub fn success(id: i32) -> Self {
        SubmitStatus {
            status: "success".to_string(),
            id,
        }
    }
}
