use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind};

use failsafe::backoff::EqualJittered;
use failsafe::failure_policy::{ConsecutiveFailures, OrElse, SuccessRateOverTimeWindow};
use failsafe::{CircuitBreaker, StateMachine};

use super::{DishRepository, PredictionRepository, StorageError, StoreResult};
use crate::models::{Dish, NewDish, NewPrediction, Prediction};
use crate::query::{self, DbError};

pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

pub type CircuitBreakerType = StateMachine<
    OrElse<SuccessRateOverTimeWindow<EqualJittered>, ConsecutiveFailures<EqualJittered>>,
    (),
>;

pub fn connect(database_url: &str, max_size: u32) -> StoreResult<DbPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    r2d2::Pool::builder()
        .max_size(max_size)
        .build(manager)
        .map_err(|e| StorageError::Unavailable(e.to_string()))
}

enum Failure {
    Pool(String),
    Query(DbError),
}

//every call goes through the circuit breaker
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
    circuit_breaker: CircuitBreakerType,
}

impl PgStore {
    pub fn new(pool: DbPool, circuit_breaker: CircuitBreakerType) -> Self {
        PgStore {
            pool,
            circuit_breaker,
        }
    }

    pub fn seed(&self, seed: &[NewDish]) -> StoreResult<usize> {
        if seed.is_empty() {
            return Ok(0);
        }
        self.guarded(|conn| query::seed_dishes(seed, conn))
    }

    fn guarded<R, F>(&self, op: F) -> StoreResult<R>
    where
        F: FnOnce(&PgConnection) -> Result<R, DbError>,
    {
        let result = self.circuit_breaker.call(|| -> Result<R, Failure> {
            let conn = self
                .pool
                .get()
                .map_err(|e| Failure::Pool(e.to_string()))?;
            op(&*conn).map_err(Failure::Query)
        });
        match result {
            Ok(val) => Ok(val),
            Err(failsafe::Error::Rejected) => Err(StorageError::Unavailable(
                "relational store circuit is open".to_string(),
            )),
            Err(failsafe::Error::Inner(Failure::Pool(msg))) => Err(StorageError::Unavailable(msg)),
            Err(failsafe::Error::Inner(Failure::Query(e))) => Err(from_db_error(e)),
        }
    }
}

fn from_db_error(e: DbError) -> StorageError {
    match e.downcast_ref::<diesel::result::Error>() {
        Some(diesel::result::Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info)) => {
            StorageError::Integrity(info.message().to_string())
        }
        _ => StorageError::Backend(e.to_string()),
    }
}

impl DishRepository for PgStore {
    fn all_dishes(&self, skip: i64, limit: i64) -> StoreResult<Vec<Dish>> {
        self.guarded(|conn| query::find_all_dishes(skip, limit, conn))
    }

    fn dish_by_id(&self, dish_id: i32) -> StoreResult<Option<Dish>> {
        self.guarded(|conn| query::find_dish_by_id(dish_id, conn))
    }

    fn dish_by_name(&self, name: &str) -> StoreResult<Option<Dish>> {
        self.guarded(|conn| query::find_dish_by_name(name, conn))
    }
}

impl PredictionRepository for PgStore {
    fn all_predictions(&self, skip: i64, limit: i64) -> StoreResult<Vec<Prediction>> {
        self.guarded(|conn| query::find_all_predictions(skip, limit, conn))
    }

    fn prediction_by_id(&self, prediction_id: i32) -> StoreResult<Option<Prediction>> {
        self.guarded(|conn| query::find_prediction_by_id(prediction_id, conn))
    }

    fn create_prediction(&self, new_prediction: NewPrediction) -> StoreResult<Prediction> {
        self.guarded(|conn| query::insert_prediction(&new_prediction, conn))
    }
}
