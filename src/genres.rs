use std::collections::HashMap;

use crate::{error::TransformError, models::Genre};

pub const GENRE_COUNT: usize = 19;

/// Genre names in the order of the one-hot columns of `u.item`.
pub const GENRES: [&str; GENRE_COUNT] = [
    "unknown",
    "Action",
    "Adventure",
    "Animation",
    "Children",
    "Comedy",
    "Crime",
    "Documentary",
    "Drama",
    "Fantasy",
    "Film-Noir",
    "Horror",
    "Musical",
    "Mystery",
    "Romance",
    "Sci-Fi",
    "Thriller",
    "War",
    "Western",
];

/// Lookup from genre name to its position-derived id.
///
/// Ids are the zero-based index of the name in the vocabulary, so two catalogs
/// built from the same vocabulary always agree regardless of the dataset.
#[derive(Clone, Debug)]
pub struct GenreCatalog {
    genres: Vec<Genre>,
    ids: HashMap<&'static str, i32>,
}

impl GenreCatalog {
    pub fn new(vocabulary: &[&'static str; GENRE_COUNT]) -> Result<Self, TransformError> {
        let mut genres = Vec::with_capacity(GENRE_COUNT);
        let mut ids = HashMap::with_capacity(GENRE_COUNT);

        for (genre_id, &name) in (0..).zip(vocabulary.iter()) {
            if ids.insert(name, genre_id).is_some() {
                return Err(TransformError::DuplicateGenre(name.to_string()));
            }
            genres.push(Genre { genre_id, genre_name: name.to_string() });
        }

        Ok(Self { genres, ids })
    }

    pub fn id_of(&self, name: &str) -> Option<i32> {
        self.ids.get(name).copied()
    }

    pub fn into_genres(self) -> Vec<Genre> {
        self.genres
    }
}
