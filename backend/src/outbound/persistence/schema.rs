//! Diesel table definitions for the challenge store.
//!
//! These must match `backend/migrations` exactly. Relations carry foreign
//! keys but no `ON DELETE CASCADE`; dependent rows are removed by explicit
//! cascade steps.

diesel::table! {
    /// Multi-day programs, one row per challenge.
    challenges (id) {
        id -> Uuid,
        /// Opaque identifier of the owning user.
        owner_id -> Varchar,
        name -> Varchar,
        description -> Text,
        start_date -> Timestamptz,
        end_date -> Nullable<Timestamptz>,
        /// Day the next completed entry advances past. Always at least 1.
        current_day -> Int4,
        /// One of `active`, `completed`, `failed`.
        status -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Ordered groups of tasks within a challenge.
    sections (id) {
        id -> Uuid,
        challenge_id -> Uuid,
        name -> Varchar,
        description -> Text,
        /// Dense 1-based position among the challenge's sections.
        #[sql_name = "order"]
        position -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Ordered daily habits within a section.
    tasks (id) {
        id -> Uuid,
        section_id -> Uuid,
        name -> Varchar,
        description -> Text,
        /// One of `boolean`, `number`, `text`.
        task_type -> Varchar,
        required -> Bool,
        restart_on_fail -> Bool,
        strikes_enabled -> Bool,
        strikes_limit -> Int4,
        /// Dense 1-based position among the section's tasks.
        #[sql_name = "order"]
        position -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per recorded challenge day; unique on `(challenge_id, day_number)`.
    day_records (id) {
        id -> Uuid,
        challenge_id -> Uuid,
        day_number -> Int4,
        date -> Timestamptz,
        completed -> Bool,
        notes -> Text,
        progress_photo_url -> Nullable<Text>,
        energy_level -> Nullable<Int2>,
        mood_level -> Nullable<Int2>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-task outcome within a day record; unique on `(day_record_id, task_id)`.
    task_records (id) {
        id -> Uuid,
        day_record_id -> Uuid,
        task_id -> Uuid,
        completed -> Bool,
        /// Untagged JSON boolean, number or string matching the task type.
        value -> Nullable<Jsonb>,
        notes -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Body measurements logged against a challenge day.
    measurements (id) {
        id -> Uuid,
        challenge_id -> Uuid,
        day_number -> Int4,
        date -> Timestamptz,
        weight -> Float8,
        chest -> Float8,
        waist -> Float8,
        hips -> Float8,
        arms -> Float8,
        thighs -> Float8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(sections -> challenges (challenge_id));
diesel::joinable!(tasks -> sections (section_id));
diesel::joinable!(day_records -> challenges (challenge_id));
diesel::joinable!(task_records -> day_records (day_record_id));
diesel::joinable!(task_records -> tasks (task_id));
diesel::joinable!(measurements -> challenges (challenge_id));

diesel::allow_tables_to_appear_in_same_query!(
    challenges,
    sections,
    tasks,
    day_records,
    task_records,
    measurements,
);
