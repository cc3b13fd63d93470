use crate::genres::GENRE_COUNT;

/// A `u.item` row as read from disk, genre membership still one-hot encoded.
#[derive(Clone, Debug, PartialEq)]
pub struct RawMovie {
    pub movie_id: i32,
    pub title: String,
    pub imdb_url: Option<String>,
    pub genre_flags: Vec<u8>,
    /// 1-based record number in the source file.
    pub line: u64,
}

/// A movie after its flags have been collapsed into genre names.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedMovie {
    pub movie_id: i32,
    pub title: String,
    pub imdb_url: Option<String>,
    /// Names of the active genres, in vocabulary order.
    pub genre_names: Vec<&'static str>,
    pub num_genres: i32,
}

impl NormalizedMovie {
    pub fn into_movie(self) -> Movie {
        Movie {
            movie_id: self.movie_id,
            title: self.title,
            imdb_url: self.imdb_url,
            num_genres: self.num_genres,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Movie {
    pub movie_id: i32,
    pub title: String,
    pub imdb_url: Option<String>,
    pub num_genres: i32,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Genre {
    pub genre_id: i32,
    pub genre_name: String,
}

/// A movie/genre pair before it has been given its surrogate key.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GenrePair {
    pub movie_id: i32,
    pub genre_id: i32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MovieGenre {
    pub movie_genre_id: i32,
    pub movie_id: i32,
    pub genre_id: i32,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct User {
    pub user_id: i32,
    pub age: i32,
    pub gender: String,
    pub occupation: String,
    pub zip_code: String,
}

/// A `u.data` row before it has been given its surrogate key.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RawRating {
    pub user_id: i32,
    pub movie_id: i32,
    pub rating: i32,
    pub timestamp: i64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Rating {
    pub rating_id: i32,
    pub user_id: i32,
    pub movie_id: i32,
    pub rating: i32,
    pub timestamp: i64,
}

/// The three tables produced by the reader.
#[derive(Clone, Debug, Default)]
pub struct RawTables {
    pub movies: Vec<RawMovie>,
    pub users: Vec<User>,
    pub ratings: Vec<RawRating>,
}

/// The five finished tables handed to the loader.
#[derive(Clone, Debug, Default)]
pub struct Tables {
    pub genres: Vec<Genre>,
    pub movies: Vec<Movie>,
    pub movie_genres: Vec<MovieGenre>,
    pub users: Vec<User>,
    pub ratings: Vec<Rating>,
}

pub const MOVIE_FIXED_COLUMNS: usize = 5;
pub const MOVIE_COLUMNS: usize = MOVIE_FIXED_COLUMNS + GENRE_COUNT;
