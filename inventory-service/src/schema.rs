diesel::table! {
    warehouses (id) {
        id -> Int4,
        name -> Varchar,
        is_available -> Bool,
        created_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    products (id) {
        id -> Int4,
        name -> Varchar,
        size -> Numeric,
        code -> Varchar,
        quantity -> Int4,
        warehouse_id -> Int4,
        created_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(products -> warehouses (warehouse_id));

diesel::allow_tables_to_appear_in_same_query!(
    products,
    warehouses,
);
