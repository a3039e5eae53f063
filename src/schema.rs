table! {
    dishes (id) {
        id -> Int4,
        name -> Varchar,
        calories -> Int4,
        protein -> Float8,
        fat -> Float8,
        carbs -> Float8,
    }
}

table! {
    predictions (id) {
        id -> Int4,
        dish_id -> Int4,
        prediction_name -> Varchar,
        result -> Varchar,
        image_id -> Nullable<Varchar>,
    }
}

joinable!(predictions -> dishes (dish_id));

allow_tables_to_appear_in_same_query!(dishes, predictions);
