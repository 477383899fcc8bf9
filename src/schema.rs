diesel::table! {
    board (id) {
        id -> Int4,
        name -> Text,
        description -> Text,
    }
}

diesel::table! {
    topic (id) {
        id -> Int4,
        board -> Int4,
        subject -> Text,
        starter -> Int4,
        last_updated -> Timestamptz,
        views -> Int4,
    }
}

diesel::table! {
    post (id) {
        id -> Int4,
        topic -> Int4,
        message -> Text,
        created_by -> Int4,
        created_at -> Timestamptz,
        updated_at -> Nullable<Timestamptz>,
        updated_by -> Nullable<Int4>,
    }
}

diesel::table! {
    topic_view (topic, viewer) {
        topic -> Int4,
        viewer -> Text,
    }
}

diesel::joinable!(topic -> board (board));
diesel::joinable!(post -> topic (topic));

diesel::allow_tables_to_appear_in_same_query!(board, topic, post, topic_view);
