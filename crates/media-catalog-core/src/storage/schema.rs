diesel::table! {
    media (id) {
        id -> Int8,
        name -> Text,
        create_date -> Timestamp,
        last_modify -> Timestamp,
        file_size -> Int8,
        hash -> Nullable<Text>,
        #[sql_name = "type"]
        media_type -> Text,
        metadata -> Jsonb,
        paths -> Jsonb,
    }
}
