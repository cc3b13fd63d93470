use tracing::debug;

use crate::{
    error::TransformError,
    genres::{GENRE_COUNT, GenreCatalog},
    models::{GenrePair, MovieGenre, NormalizedMovie, RawMovie, RawRating, Rating},
};

/// Collapses each movie's one-hot flags into the names of its active genres.
///
/// Names keep the vocabulary's column order. A movie with no active flag gets
/// an empty list and `num_genres == 0`.
pub fn normalize_genres(
    movies: Vec<RawMovie>,
    vocabulary: &[&'static str; GENRE_COUNT],
) -> Result<Vec<NormalizedMovie>, TransformError> {
    let mut out = Vec::with_capacity(movies.len());
    let mut without_genre = 0usize;

    for movie in movies {
        if movie.genre_flags.len() != GENRE_COUNT {
            return Err(TransformError::MissingField {
                line: movie.line,
                movie_id: movie.movie_id,
                found: movie.genre_flags.len(),
                expected: GENRE_COUNT,
            });
        }

        let genre_names: Vec<&'static str> = vocabulary
            .iter()
            .zip(&movie.genre_flags)
            .filter(|&(_, &flag)| flag == 1)
            .map(|(&name, _)| name)
            .collect();

        if genre_names.is_empty() {
            without_genre += 1;
        }

        out.push(NormalizedMovie {
            movie_id: movie.movie_id,
            title: movie.title,
            imdb_url: movie.imdb_url,
            num_genres: genre_names.len() as i32,
            genre_names,
        });
    }

    debug!(movies = out.len(), without_genre = without_genre, "normalized genre flags");

    Ok(out)
}

/// Expands every movie's genre names into one (movie, genre) pair per name.
pub fn build_genre_pairs(
    movies: &[NormalizedMovie],
    catalog: &GenreCatalog,
) -> Result<Vec<GenrePair>, TransformError> {
    let mut pairs = Vec::with_capacity(movies.iter().map(|m| m.genre_names.len()).sum());

    for movie in movies {
        for &name in &movie.genre_names {
            let genre_id = catalog.id_of(name).ok_or_else(|| TransformError::UnknownGenre {
                movie_id: movie.movie_id,
                name: name.to_string(),
            })?;
            pairs.push(GenrePair { movie_id: movie.movie_id, genre_id });
        }
    }

    debug!(pairs = pairs.len(), "built movie/genre pairs");

    Ok(pairs)
}

/// Gives each row of a finished table its zero-based position as key.
pub fn assign_keys<T, K>(
    table: &'static str,
    rows: Vec<T>,
    keyed: impl Fn(i32, T) -> K,
) -> Result<Vec<K>, TransformError> {
    if i32::try_from(rows.len()).is_err() {
        return Err(TransformError::KeyOverflow { table });
    }

    Ok((0..).zip(rows).map(|(id, row)| keyed(id, row)).collect())
}

pub fn key_movie_genres(pairs: Vec<GenrePair>) -> Result<Vec<MovieGenre>, TransformError> {
    assign_keys("movie_genres", pairs, |movie_genre_id, pair| MovieGenre {
        movie_genre_id,
        movie_id: pair.movie_id,
        genre_id: pair.genre_id,
    })
}

pub fn key_ratings(ratings: Vec<RawRating>) -> Result<Vec<Rating>, TransformError> {
    assign_keys("ratings", ratings, |rating_id, r| Rating {
        rating_id,
        user_id: r.user_id,
        movie_id: r.movie_id,
        rating: r.rating,
        timestamp: r.timestamp,
    })
}
