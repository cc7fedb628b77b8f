//! Esquema Diesel declarado a mano (reemplazable con `diesel print-schema`).

diesel::table! {
    factories (id) {
        id -> Uuid,
        name -> Text,
        lat -> Float8,
        lng -> Float8,
        landcode -> Text,
        factory_type -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    report_records (id) {
        id -> BigInt,
        factory_id -> Uuid,
        action -> Text,
        action_body -> Jsonb,
        contact -> Nullable<Text>,
        others -> Nullable<Text>,
        user_ip -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    images (id) {
        id -> Uuid,
        image_path -> Text,
        factory_id -> Nullable<Uuid>,
        report_record_id -> Nullable<BigInt>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(report_records -> factories (factory_id));

diesel::allow_tables_to_appear_in_same_query!(
    factories,
    report_records,
    images,
);
