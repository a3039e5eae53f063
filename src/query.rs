use crate::models::{Dish, NewDish, NewPrediction, Prediction};
use crate::schema::{dishes, predictions};
use diesel::prelude::*;

pub(crate) type DbError = Box<dyn std::error::Error + Send + Sync>;

pub(crate) fn find_all_dishes(
    skip: i64,
    limit: i64,
    conn: &PgConnection,
) -> Result<Vec<Dish>, DbError> {
    let all_dishes = dishes::table
        .order(dishes::id)
        .offset(skip)
        .limit(limit)
        .load::<Dish>(conn)?;
    Ok(all_dishes)
}

pub(crate) fn find_dish_by_id(dish_id: i32, conn: &PgConnection) -> Result<Option<Dish>, DbError> {
    let dish = dishes::table
        .filter(dishes::id.eq(dish_id))
        .first::<Dish>(conn)
        .optional()?;
    Ok(dish)
}

//exact, case sensitive match
pub(crate) fn find_dish_by_name(name: &str, conn: &PgConnection) -> Result<Option<Dish>, DbError> {
    let dish = dishes::table
        .filter(dishes::name.eq(name))
        .first::<Dish>(conn)
        .optional()?;
    Ok(dish)
}

pub(crate) fn find_all_predictions(
    skip: i64,
    limit: i64,
    conn: &PgConnection,
) -> Result<Vec<Prediction>, DbError> {
    let all_predictions = predictions::table
        .order(predictions::id)
        .offset(skip)
        .limit(limit)
        .load::<Prediction>(conn)?;
    Ok(all_predictions)
}

pub(crate) fn find_prediction_by_id(
    prediction_id: i32,
    conn: &PgConnection,
) -> Result<Option<Prediction>, DbError> {
    let prediction = predictions::table
        .filter(predictions::id.eq(prediction_id))
        .first::<Prediction>(conn)
        .optional()?;
    Ok(prediction)
}

pub(crate) fn insert_prediction(
    new_prediction: &NewPrediction,
    conn: &PgConnection,
) -> Result<Prediction, DbError> {
    let prediction = diesel::insert_into(predictions::table)
        .values(new_prediction)
        .get_result::<Prediction>(conn)?;
    Ok(prediction)
}

//existing names are skipped, returns the number of new rows
pub(crate) fn seed_dishes(seed: &[NewDish], conn: &PgConnection) -> Result<usize, DbError> {
    let inserted = diesel::insert_into(dishes::table)
        .values(seed)
        .on_conflict(dishes::name)
        .do_nothing()
        .execute(conn)?;
    Ok(inserted)
}
