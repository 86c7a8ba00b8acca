//! Fixed genre id → display name table used by the catalog service.

pub const GENRES: [(i64, &str); 9] = [
    (1, "Personal Growth"),
    (2, "Investigative Journalism"),
    (3, "History"),
    (4, "Comedy"),
    (5, "Entertainment"),
    (6, "Business"),
    (7, "Fiction"),
    (8, "News"),
    (9, "Kids and Family"),
];

pub fn genre_name(id: i64) -> Option<&'static str> {
    GENRES
        .iter()
        .find(|(genre_id, _)| *genre_id == id)
        .map(|(_, name)| *name)
}

/// Display label; unknown ids render as "Unknown".
pub fn genre_label(id: i64) -> &'static str {
    genre_name(id).unwrap_or("Unknown")
}
