use std::ops::DerefMut;
use std::time::Duration;

use r2d2_redis::redis::{Commands, RedisError};

use super::blob::RedisPool;
use super::{DishRepository, StoreResult};
use crate::models::Dish;

//single-dish lookups are cached in redis as bincode, misses are not cached
pub struct CachedDishRepository<R> {
    inner: R,
    redis_pool: RedisPool,
    ttl: Duration,
}

impl<R: DishRepository> CachedDishRepository<R> {
    pub fn new(inner: R, redis_pool: RedisPool, ttl: Duration) -> Self {
        CachedDishRepository {
            inner,
            redis_pool,
            ttl,
        }
    }

    fn cached<F>(&self, key: &str, load: F) -> StoreResult<Option<Dish>>
    where
        F: FnOnce() -> StoreResult<Option<Dish>>,
    {
        let mut redis_conn = match self.redis_pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                //cache is down, go straight to the db and don't bother caching
                log::warn!("dish cache unavailable: {}", e);
                return load();
            }
        };
        let redis_conn = redis_conn.deref_mut();

        let hit: Result<Option<Vec<u8>>, RedisError> = redis_conn.get(key);
        match hit {
            Ok(Some(bytes)) => match Dish::from_u8(&bytes) {
                Ok(dish) => return Ok(Some(dish)),
                Err(e) => log::warn!("dropping undecodable cache entry {}: {}", key, e),
            },
            Ok(None) => {}
            Err(e) => {
                log::warn!("dish cache read failed for {}: {}", key, e);
                return load();
            }
        }

        let dish = load()?;
        if let Some(dish) = &dish {
            match dish.to_u8() {
                Ok(value) => {
                    let stored: Result<(), RedisError> =
                        redis_conn.set_ex(key, value, self.ttl.as_secs() as usize);
                    if let Err(e) = stored {
                        log::warn!("dish cache write failed for {}: {}", key, e);
                    }
                }
                Err(e) => log::warn!("could not encode dish {}: {}", dish.id, e),
            }
        }
        Ok(dish)
    }
}

fn name_key(name: &str) -> String {
    format!("dish:name:{}", name)
}

fn id_key(dish_id: i32) -> String {
    format!("dish:id:{}", dish_id)
}

impl<R: DishRepository> DishRepository for CachedDishRepository<R> {
    fn all_dishes(&self, skip: i64, limit: i64) -> StoreResult<Vec<Dish>> {
        self.inner.all_dishes(skip, limit)
    }

    fn dish_by_id(&self, dish_id: i32) -> StoreResult<Option<Dish>> {
        self.cached(&id_key(dish_id), || self.inner.dish_by_id(dish_id))
    }

    fn dish_by_name(&self, name: &str) -> StoreResult<Option<Dish>> {
        self.cached(&name_key(name), || self.inner.dish_by_name(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use r2d2_redis::{r2d2, RedisConnectionManager};

    use crate::models::NewDish;
    use crate::store::{MemoryStore, StorageError};

    struct Counting {
        inner: MemoryStore,
        calls: AtomicUsize,
    }

    impl DishRepository for Counting {
        fn all_dishes(&self, skip: i64, limit: i64) -> StoreResult<Vec<Dish>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.all_dishes(skip, limit)
        }

        fn dish_by_id(&self, dish_id: i32) -> StoreResult<Option<Dish>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.dish_by_id(dish_id)
        }

        fn dish_by_name(&self, name: &str) -> StoreResult<Option<Dish>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.dish_by_name(name)
        }
    }

    struct Failing;

    impl DishRepository for Failing {
        fn all_dishes(&self, _skip: i64, _limit: i64) -> StoreResult<Vec<Dish>> {
            Err(StorageError::Unavailable("db down".to_string()))
        }

        fn dish_by_id(&self, _dish_id: i32) -> StoreResult<Option<Dish>> {
            Err(StorageError::Unavailable("db down".to_string()))
        }

        fn dish_by_name(&self, _name: &str) -> StoreResult<Option<Dish>> {
            Err(StorageError::Unavailable("db down".to_string()))
        }
    }

    //nothing listens on port 1
    fn unreachable_redis() -> RedisPool {
        let manager = RedisConnectionManager::new("redis://127.0.0.1:1/").unwrap();
        r2d2::Pool::builder()
            .connection_timeout(Duration::from_millis(200))
            .min_idle(Some(0))
            .build_unchecked(manager)
    }

    fn counting_pizza_repo() -> CachedDishRepository<Counting> {
        let inner = MemoryStore::with_dishes(vec![NewDish {
            name: "pizza".to_string(),
            calories: 266,
            protein: 11.0,
            fat: 10.0,
            carbs: 33.0,
        }])
        .unwrap();
        CachedDishRepository::new(
            Counting {
                inner,
                calls: AtomicUsize::new(0),
            },
            unreachable_redis(),
            Duration::from_secs(60),
        )
    }

    #[test]
    fn redis_down_falls_back_to_the_inner_repository() {
        let repo = counting_pizza_repo();

        let pizza = repo.dish_by_name("pizza").unwrap().unwrap();
        assert_eq!(pizza.calories, 266);
        let by_id = repo.dish_by_id(pizza.id).unwrap();
        assert_eq!(by_id, Some(pizza));
        assert_eq!(repo.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn misses_pass_through_while_redis_is_down() {
        let repo = counting_pizza_repo();

        assert_eq!(repo.dish_by_name("Pizza").unwrap(), None);
        assert_eq!(repo.dish_by_id(999).unwrap(), None);
        assert_eq!(repo.all_dishes(0, 10).unwrap().len(), 1);
        assert_eq!(repo.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn inner_errors_surface_when_redis_is_down() {
        let repo = CachedDishRepository::new(Failing, unreachable_redis(), Duration::from_secs(60));
        assert!(matches!(
            repo.dish_by_name("pizza"),
            Err(StorageError::Unavailable(_))
        ));
    }

    #[test]
    fn name_keys_keep_case() {
        assert_ne!(name_key("Pizza"), name_key("pizza"));
    }

    #[test]
    fn id_and_name_keys_never_collide() {
        assert_ne!(id_key(1), name_key("1"));
    }
}
