use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

fn string<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).unwrap_or_else(|| default.to_string())
}

fn parsed<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn optional<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

//durations must be positive, redis refuses a zero expiry
fn seconds(key: &'static str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: secs.to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

fn database_url<F>(lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("DATABASE_URL") {
        return url;
    }
    format!(
        "postgres://{}:{}@{}:{}/{}",
        string(lookup, "POSTGRES_USER", "admin"),
        string(lookup, "POSTGRES_PASSWORD", "password"),
        string(lookup, "POSTGRES_HOST", "localhost"),
        string(lookup, "POSTGRES_PORT", "5432"),
        string(lookup, "POSTGRES_DB", "caloriecam"),
    )
}

fn redis_url<F>(lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("REDIS_URL") {
        return url;
    }
    format!(
        "redis://{}:{}/",
        string(lookup, "REDIS_HOST", "localhost"),
        string(lookup, "REDIS_PORT", "6379"),
    )
}

#[derive(Debug, Clone)]
pub struct DishesConfig {
    pub bind_addr: String,
    pub database_url: String,
    pub db_pool_size: u32,
    pub redis_url: String,
    pub nn_service_url: String,
    pub nn_timeout: Duration,
    //None keeps uploaded images forever
    pub image_ttl: Option<Duration>,
    pub dish_cache_ttl: Duration,
    pub seed_path: Option<PathBuf>,
}

impl DishesConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(DishesConfig {
            bind_addr: string(&lookup, "DISHES_BIND", "0.0.0.0:8001"),
            database_url: database_url(&lookup),
            db_pool_size: parsed(&lookup, "DB_POOL_SIZE", 10)?,
            redis_url: redis_url(&lookup),
            nn_service_url: string(
                &lookup,
                "NN_SERVICE_URL",
                "http://caloriecam-nn-service:8000/nn/predict",
            ),
            nn_timeout: seconds(
                "NN_TIMEOUT_SECONDS",
                parsed(&lookup, "NN_TIMEOUT_SECONDS", 60)?,
            )?,
            image_ttl: optional(&lookup, "IMAGE_TTL_SECONDS")?
                .map(|secs| seconds("IMAGE_TTL_SECONDS", secs))
                .transpose()?,
            dish_cache_ttl: seconds(
                "DISH_CACHE_TTL_SECONDS",
                parsed(&lookup, "DISH_CACHE_TTL_SECONDS", 60)?,
            )?,
            seed_path: lookup("DISHES_SEED_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

#[derive(Debug, Clone)]
pub struct NnConfig {
    pub bind_addr: String,
    pub redis_url: String,
    pub model_dir: PathBuf,
    pub class_names_path: PathBuf,
    pub num_classes: usize,
    pub img_height: u32,
    pub img_width: u32,
    pub input_op: String,
    pub output_op: String,
}

impl NnConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(NnConfig {
            bind_addr: string(&lookup, "NN_BIND", "0.0.0.0:8000"),
            redis_url: redis_url(&lookup),
            model_dir: PathBuf::from(string(&lookup, "MODEL_DIR", "resources/saved_model")),
            class_names_path: PathBuf::from(string(
                &lookup,
                "CLASS_NAMES_PATH",
                "resources/class_names.txt",
            )),
            num_classes: parsed(&lookup, "NUM_CLASSES", 101)?,
            img_height: parsed(&lookup, "IMG_HEIGHT", 224)?,
            img_width: parsed(&lookup, "IMG_WIDTH", 224)?,
            input_op: string(&lookup, "INPUT_OP", "serving_default_input_1"),
            output_op: string(&lookup, "OUTPUT_OP", "StatefulPartitionedCall"),
        })
    }
}
