// Table definitions for the word index.
// Note: extracted_texts and search_result carry a synthetic rowid primary key;
// the remaining columns are the compatibility surface.

diesel::table! {
    sessions (session_id) {
        session_id -> Integer,
        start_time -> Text,
        end_time -> Nullable<Text>,
    }
}

diesel::table! {
    documents (document_id) {
        document_id -> Integer,
        document_path -> Text,
        session_id -> Integer,
        page_count -> Integer,
    }
}

diesel::table! {
    extracted_texts (id) {
        id -> Integer,
        document_id -> Integer,
        word -> Text,
        x_min -> Integer,
        y_min -> Integer,
        x_max -> Integer,
        y_max -> Integer,
        page_number -> Integer,
        session_id -> Integer,
    }
}

diesel::table! {
    search_result (id) {
        id -> Integer,
        search_term -> Text,
        session_id -> Integer,
        document_id -> Integer,
        word -> Text,
        x_min -> Integer,
        y_min -> Integer,
        x_max -> Integer,
        y_max -> Integer,
        page_number -> Integer,
        match_time -> Text,
    }
}

diesel::joinable!(documents -> sessions (session_id));
diesel::joinable!(extracted_texts -> documents (document_id));
diesel::joinable!(search_result -> documents (document_id));

diesel::allow_tables_to_appear_in_same_query!(
    documents,
    extracted_texts,
    search_result,
    sessions,
);
