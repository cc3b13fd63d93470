use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use csv::StringRecord;
use encoding_rs::WINDOWS_1252;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    error::TransformError,
    genres::GENRES,
    models::{MOVIE_COLUMNS, MOVIE_FIXED_COLUMNS, RawMovie, RawRating, RawTables, User},
};

const USER_COLUMNS: [&str; 5] = ["user_id", "age", "gender", "occupation", "zip_code"];
const RATING_COLUMNS: [&str; 4] = ["user_id", "movie_id", "rating", "timestamp"];

/// Locations of the three ml-100k source files.
#[derive(Clone, Debug)]
pub struct SourceFiles {
    pub movies: PathBuf,
    pub users: PathBuf,
    pub ratings: PathBuf,
}

impl SourceFiles {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            movies: dir.join("u.item"),
            users: dir.join("u.user"),
            ratings: dir.join("u.data"),
        }
    }
}

pub fn read_tables(files: &SourceFiles) -> Result<RawTables, TransformError> {
    let movies = read_movies(&files.movies)?;
    let users = read_users(&files.users)?;
    let ratings = read_ratings(&files.ratings)?;

    debug!(
        movies = movies.len(),
        users = users.len(),
        ratings = ratings.len(),
        "read raw tables"
    );

    Ok(RawTables { movies, users, ratings })
}

/// Reads `u.item`: five fixed columns followed by one 0/1 flag per genre.
///
/// Rows with fewer flags than the vocabulary are passed through so the genre
/// normalizer can reject them; rows with more columns than expected are
/// rejected here.
pub fn read_movies(path: &Path) -> Result<Vec<RawMovie>, TransformError> {
    let text = read_latin1(path)?;
    let mut out = Vec::new();

    for (index, record) in records(path, &text, b'|').enumerate() {
        let record = record?;
        let line = line_of(&record, index);

        if record.len() > MOVIE_COLUMNS {
            return Err(TransformError::InvalidData {
                file: path.to_path_buf(),
                line,
                column: "record",
                value: format!("{} columns", record.len()),
            });
        }

        let movie_id: i32 = parse_field(path, line, "movie_id", record.get(0).unwrap_or(""))?;

        if record.len() < MOVIE_FIXED_COLUMNS {
            return Err(TransformError::MissingField {
                line,
                movie_id,
                found: 0,
                expected: GENRES.len(),
            });
        }

        let title = record.get(1).unwrap_or_default().to_string();
        let imdb_url = record.get(4).filter(|s| !s.trim().is_empty()).map(str::to_string);

        let genre_flags = record
            .iter()
            .skip(MOVIE_FIXED_COLUMNS)
            .zip(GENRES)
            .map(|(value, column)| parse_flag(path, line, column, value))
            .collect::<Result<Vec<_>, _>>()?;

        out.push(RawMovie { movie_id, title, imdb_url, genre_flags, line });
    }

    Ok(out)
}

#[derive(Debug, Deserialize)]
struct UserRow {
    user_id: i32,
    age: i32,
    gender: String,
    occupation: String,
    zip_code: String,
}

pub fn read_users(path: &Path) -> Result<Vec<User>, TransformError> {
    let text = read_latin1(path)?;
    let mut out = Vec::new();

    for (index, record) in records(path, &text, b'|').enumerate() {
        let record = record?;
        let row: UserRow = deserialize_row(path, &record, index, &USER_COLUMNS)?;
        out.push(User {
            user_id: row.user_id,
            age: row.age,
            gender: row.gender,
            occupation: row.occupation,
            zip_code: row.zip_code,
        });
    }

    Ok(out)
}

#[derive(Debug, Deserialize)]
struct RatingRow {
    user_id: i32,
    movie_id: i32,
    rating: i32,
    timestamp: i64,
}

/// Reads `u.data` in file order; the row order later becomes `rating_id`.
pub fn read_ratings(path: &Path) -> Result<Vec<RawRating>, TransformError> {
    let text = read_latin1(path)?;
    let mut out = Vec::new();

    for (index, record) in records(path, &text, b'\t').enumerate() {
        let record = record?;
        let row: RatingRow = deserialize_row(path, &record, index, &RATING_COLUMNS)?;
        out.push(RawRating {
            user_id: row.user_id,
            movie_id: row.movie_id,
            rating: row.rating,
            timestamp: row.timestamp,
        });
    }

    Ok(out)
}

fn read_latin1(path: &Path) -> Result<String, TransformError> {
    let bytes = std::fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            TransformError::MissingFile { path: path.to_path_buf() }
        } else {
            TransformError::Io { path: path.to_path_buf(), source }
        }
    })?;

    let (text, _, _) = WINDOWS_1252.decode(&bytes);
    Ok(text.into_owned())
}

fn records<'a>(
    path: &'a Path,
    text: &'a str,
    delimiter: u8,
) -> impl Iterator<Item = Result<StringRecord, TransformError>> + 'a {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .quoting(false)
        .flexible(true)
        .from_reader(text.as_bytes())
        .into_records()
        .map(move |r| r.map_err(|source| TransformError::Csv { path: path.to_path_buf(), source }))
}

fn line_of(record: &StringRecord, index: usize) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(index as u64 + 1)
}

/// Deserializes a fixed-width row; any other column count is invalid.
fn deserialize_row<T: DeserializeOwned>(
    path: &Path,
    record: &StringRecord,
    index: usize,
    columns: &[&'static str],
) -> Result<T, TransformError> {
    if record.len() != columns.len() {
        return Err(TransformError::InvalidData {
            file: path.to_path_buf(),
            line: line_of(record, index),
            column: "record",
            value: format!("{} columns", record.len()),
        });
    }

    let mut trimmed = record.clone();
    trimmed.trim();

    trimmed.deserialize(None).map_err(|err| {
        let field = match err.kind() {
            csv::ErrorKind::Deserialize { err, .. } => err.field().map(|f| f as usize),
            _ => None,
        };
        let (column, value) = match field {
            Some(i) if i < columns.len() => (columns[i], trimmed.get(i).unwrap_or("").to_string()),
            _ => ("record", format!("{} columns", trimmed.len())),
        };
        TransformError::InvalidData {
            file: path.to_path_buf(),
            line: line_of(record, index),
            column,
            value,
        }
    })
}

fn parse_field<T: FromStr>(
    path: &Path,
    line: u64,
    column: &'static str,
    value: &str,
) -> Result<T, TransformError> {
    value.trim().parse().map_err(|_| TransformError::InvalidData {
        file: path.to_path_buf(),
        line,
        column,
        value: value.to_string(),
    })
}

fn parse_flag(path: &Path, line: u64, column: &'static str, value: &str) -> Result<u8, TransformError> {
    match parse_field::<u8>(path, line, column, value)? {
        flag @ (0 | 1) => Ok(flag),
        _ => Err(TransformError::InvalidData {
            file: path.to_path_buf(),
            line,
            column,
            value: value.to_string(),
        }),
    }
}
