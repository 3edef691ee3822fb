table! {
    records (id) {
        id -> Int8,
        name -> Varchar,
        amount -> Int8,
    }
}
