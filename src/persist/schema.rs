diesel::table! {
    entry (id) {
        id -> Text,
        date -> Text,
        mood -> Text,
        image_url -> Text,
        summary -> Text,
    }
}
