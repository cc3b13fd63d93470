use std::fmt::Debug;

use tracing::{debug, info};

use crate::{
    error::{AppResult, PipelineError, Stage},
    genres::{GENRES, GenreCatalog},
    models::Tables,
    reader::{self, SourceFiles},
    transform,
};

const PREVIEW_ROWS: usize = 5;

/// Reads the three source files and reshapes them into the five finished tables.
///
/// Nothing is returned unless every step succeeds.
pub fn run(files: &SourceFiles) -> Result<Tables, PipelineError> {
    let raw = reader::read_tables(files).map_err(PipelineError::at(Stage::Read))?;

    let movies = transform::normalize_genres(raw.movies, &GENRES)
        .map_err(PipelineError::at(Stage::NormalizeGenres))?;

    let catalog = GenreCatalog::new(&GENRES).map_err(PipelineError::at(Stage::BuildCatalog))?;

    let pairs = transform::build_genre_pairs(&movies, &catalog)
        .map_err(PipelineError::at(Stage::BuildJunction))?;

    let movie_genres =
        transform::key_movie_genres(pairs).map_err(PipelineError::at(Stage::AssignKeys))?;
    let ratings =
        transform::key_ratings(raw.ratings).map_err(PipelineError::at(Stage::AssignKeys))?;

    let tables = Tables {
        genres: catalog.into_genres(),
        movies: movies.into_iter().map(|m| m.into_movie()).collect(),
        movie_genres,
        users: raw.users,
        ratings,
    };

    info!(
        genres = tables.genres.len(),
        movies = tables.movies.len(),
        movie_genres = tables.movie_genres.len(),
        users = tables.users.len(),
        ratings = tables.ratings.len(),
        "tables ready"
    );

    preview("movies", &tables.movies);
    preview("movie_genres", &tables.movie_genres);
    preview("genre", &tables.genres);
    preview("users", &tables.users);
    preview("ratings", &tables.ratings);

    Ok(tables)
}

/// Runs the pipeline on the blocking pool so file reads and parsing stay off
/// the async workers.
pub async fn run_blocking(files: SourceFiles) -> AppResult<Tables> {
    let tables = tokio::task::spawn_blocking(move || run(&files))
        .await
        .map_err(anyhow::Error::new)??;
    Ok(tables)
}

fn preview<T: Debug>(table: &str, rows: &[T]) {
    for row in rows.iter().take(PREVIEW_ROWS) {
        debug!(table = table, row = ?row, "preview");
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, path::Path};

    use super::*;
    use crate::error::TransformError;

    fn flags(active: &[usize]) -> String {
        (0..GENRES.len())
            .map(|i| if active.contains(&i) { "1" } else { "0" })
            .collect::<Vec<_>>()
            .join("|")
    }

    fn write_dataset(dir: &Path, movies: &str) -> SourceFiles {
        std::fs::write(dir.join("u.item"), movies).unwrap();
        std::fs::write(dir.join("u.user"), "1|24|M|technician|85711\n2|53|F|other|94043\n")
            .unwrap();
        std::fs::write(dir.join("u.data"), "1\t1\t5\t100\n2\t3\t3\t200\n1\t2\t4\t300\n").unwrap();
        SourceFiles::in_dir(dir)
    }

    fn sample_movies() -> String {
        format!(
            "1|Toy Story (1995)|01-Jan-1995||url1|{}\n\
             2|GoldenEye (1995)|01-Jan-1995||url2|{}\n\
             3|Four Rooms (1995)|01-Jan-1995||url3|{}\n",
            flags(&[3, 4, 5]),
            flags(&[1, 2, 16]),
            flags(&[]),
        )
    }

    #[test]
    fn produces_consistent_tables() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_dataset(dir.path(), &sample_movies());

        let tables = run(&files).unwrap();

        assert_eq!(tables.genres.len(), GENRES.len());
        assert_eq!(tables.movies.len(), 3);
        assert_eq!(tables.users.len(), 2);

        let ids: Vec<i32> = tables.movie_genres.iter().map(|l| l.movie_genre_id).collect();
        assert_eq!(ids, (0..6).collect::<Vec<_>>());

        let mut per_movie: HashMap<i32, i32> = HashMap::new();
        for link in &tables.movie_genres {
            *per_movie.entry(link.movie_id).or_default() += 1;
        }
        for movie in &tables.movies {
            assert_eq!(per_movie.get(&movie.movie_id).copied().unwrap_or(0), movie.num_genres);
        }
        assert_eq!(tables.movies[2].num_genres, 0);

        let rating_ids: Vec<(i32, i64)> =
            tables.ratings.iter().map(|r| (r.rating_id, r.timestamp)).collect();
        assert_eq!(rating_ids, vec![(0, 100), (1, 200), (2, 300)]);
    }

    #[test]
    fn genre_ids_are_stable_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_dataset(dir.path(), &sample_movies());

        let first = run(&files).unwrap();
        let second = run(&files).unwrap();
        assert_eq!(first.genres, second.genres);
        assert_eq!(first.movie_genres, second.movie_genres);
    }

    #[test]
    fn short_movie_row_aborts_whole_run() {
        let dir = tempfile::tempdir().unwrap();
        let short = flags(&[]);
        let movies = format!("{}5|Short (1995)|||url5|{}\n", sample_movies(), &short[2..]);
        let files = write_dataset(dir.path(), &movies);

        let err = run(&files).unwrap_err();
        assert_eq!(err.stage, Stage::NormalizeGenres);
        assert!(matches!(
            err.source,
            TransformError::MissingField { line: 4, movie_id: 5, found: 18, .. }
        ));
    }

    #[tokio::test]
    async fn blocking_run_matches_direct_run() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_dataset(dir.path(), &sample_movies());

        let direct = run(&files).unwrap();
        let offloaded = run_blocking(files).await.unwrap();

        assert_eq!(offloaded.movie_genres, direct.movie_genres);
        assert_eq!(offloaded.ratings, direct.ratings);
        assert_eq!(offloaded.movies, direct.movies);
    }

    #[tokio::test]
    async fn blocking_run_surfaces_pipeline_errors() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_dataset(dir.path(), &sample_movies());
        std::fs::remove_file(&files.ratings).unwrap();

        let err = run_blocking(files).await.unwrap_err();
        assert!(err.to_string().contains("read raw tables"));
    }

    #[test]
    fn missing_source_fails_in_read_stage() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_dataset(dir.path(), &sample_movies());
        std::fs::remove_file(&files.users).unwrap();

        let err = run(&files).unwrap_err();
        assert_eq!(err.stage, Stage::Read);
        assert!(matches!(err.source, TransformError::MissingFile { .. }));
        assert!(err.to_string().contains("read raw tables"));
    }
}
