use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, IntoActiveModel, Set,
    TransactionTrait,
};
use tracing::{debug, info};

use crate::{
    entities::{genre, movie, movie_genre, rating, user},
    error::AppResult,
    models::Tables,
};

/// Rows inserted per table in one load.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LoadSummary {
    pub genres: u64,
    pub movies: u64,
    pub movie_genres: u64,
    pub users: u64,
    pub ratings: u64,
}

/// Inserts all five tables inside a single transaction.
///
/// Parents go in before the tables that reference them. If any insert fails
/// the transaction is dropped without committing and nothing is kept.
pub async fn load(
    db: &DatabaseConnection,
    tables: &Tables,
    batch_size: usize,
) -> AppResult<LoadSummary> {
    let batch_size = batch_size.max(1);
    let txn = db.begin().await?;

    let genres = insert_batched::<genre::Entity, _>(
        &txn,
        "genre",
        tables.genres.iter().map(|g| genre::ActiveModel {
            genre_id: Set(g.genre_id),
            genre_name: Set(g.genre_name.clone()),
        }),
        batch_size,
    )
    .await?;

    let movies = insert_batched::<movie::Entity, _>(
        &txn,
        "movies",
        tables.movies.iter().map(|m| movie::ActiveModel {
            movie_id: Set(m.movie_id),
            title: Set(m.title.clone()),
            imdb_url: Set(m.imdb_url.clone()),
            num_genres: Set(m.num_genres),
        }),
        batch_size,
    )
    .await?;

    let movie_genres = insert_batched::<movie_genre::Entity, _>(
        &txn,
        "movie_genres",
        tables.movie_genres.iter().map(|l| movie_genre::ActiveModel {
            movie_genre_id: Set(l.movie_genre_id),
            movie_id: Set(l.movie_id),
            genre_id: Set(l.genre_id),
        }),
        batch_size,
    )
    .await?;

    let users = insert_batched::<user::Entity, _>(
        &txn,
        "users",
        tables.users.iter().map(|u| user::ActiveModel {
            user_id: Set(u.user_id),
            age: Set(u.age),
            gender: Set(u.gender.clone()),
            occupation: Set(u.occupation.clone()),
            zip_code: Set(u.zip_code.clone()),
        }),
        batch_size,
    )
    .await?;

    let ratings = insert_batched::<rating::Entity, _>(
        &txn,
        "ratings",
        tables.ratings.iter().map(|r| rating::ActiveModel {
            rating_id: Set(r.rating_id),
            user_id: Set(r.user_id),
            movie_id: Set(r.movie_id),
            rating: Set(r.rating),
            timestamp: Set(r.timestamp),
        }),
        batch_size,
    )
    .await?;

    txn.commit().await?;

    let summary = LoadSummary { genres, movies, movie_genres, users, ratings };
    info!(?summary, "load committed");
    Ok(summary)
}

async fn insert_batched<E, A>(
    txn: &DatabaseTransaction,
    table: &str,
    rows: impl Iterator<Item = A>,
    batch_size: usize,
) -> AppResult<u64>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<A>,
    A: ActiveModelTrait<Entity = E>,
{
    let mut inserted = 0u64;
    let mut batch = Vec::with_capacity(batch_size);

    for row in rows {
        batch.push(row);
        if batch.len() == batch_size {
            inserted += flush::<E, A>(txn, &mut batch).await?;
        }
    }
    if !batch.is_empty() {
        inserted += flush::<E, A>(txn, &mut batch).await?;
    }

    debug!(table = table, rows = inserted, "inserted table");
    Ok(inserted)
}

async fn flush<E, A>(txn: &DatabaseTransaction, batch: &mut Vec<A>) -> AppResult<u64>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<A>,
    A: ActiveModelTrait<Entity = E>,
{
    let rows = E::insert_many(batch.drain(..)).exec_without_returning(txn).await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use sea_orm::{PaginatorTrait, QueryOrder};

    use super::*;
    use crate::{
        db,
        genres::{GENRES, GenreCatalog},
        models::{Movie, MovieGenre, Rating, User},
    };

    fn sample_tables() -> Tables {
        Tables {
            genres: GenreCatalog::new(&GENRES).unwrap().into_genres(),
            movies: vec![
                Movie {
                    movie_id: 1,
                    title: "Toy Story (1995)".to_string(),
                    imdb_url: Some("http://us.imdb.com/M/title-exact?Toy%20Story%20(1995)".into()),
                    num_genres: 2,
                },
                Movie { movie_id: 267, title: "unknown".to_string(), imdb_url: None, num_genres: 0 },
            ],
            movie_genres: vec![
                MovieGenre { movie_genre_id: 0, movie_id: 1, genre_id: 3 },
                MovieGenre { movie_genre_id: 1, movie_id: 1, genre_id: 5 },
            ],
            users: vec![User {
                user_id: 1,
                age: 24,
                gender: "M".to_string(),
                occupation: "technician".to_string(),
                zip_code: "85711".to_string(),
            }],
            ratings: vec![
                Rating { rating_id: 0, user_id: 1, movie_id: 1, rating: 5, timestamp: 100 },
                Rating { rating_id: 1, user_id: 1, movie_id: 267, rating: 3, timestamp: 200 },
            ],
        }
    }

    async fn temp_db(dir: &tempfile::TempDir) -> DatabaseConnection {
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        db::connect_and_reset(&url).await.unwrap()
    }

    #[tokio::test]
    async fn loads_all_tables() {
        let dir = tempfile::tempdir().unwrap();
        let db = temp_db(&dir).await;

        let summary = load(&db, &sample_tables(), 2).await.unwrap();
        assert_eq!(
            summary,
            LoadSummary { genres: 19, movies: 2, movie_genres: 2, users: 1, ratings: 2 }
        );

        let genres =
            genre::Entity::find().order_by_asc(genre::Column::GenreId).all(&db).await.unwrap();
        assert_eq!(genres[18].genre_name, "Western");

        let unknown = movie::Entity::find_by_id(267).one(&db).await.unwrap().unwrap();
        assert_eq!(unknown.imdb_url, None);
        assert_eq!(unknown.num_genres, 0);

        assert_eq!(rating::Entity::find().count(&db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn failed_load_leaves_tables_empty() {
        let dir = tempfile::tempdir().unwrap();
        let db = temp_db(&dir).await;

        let mut tables = sample_tables();
        tables.ratings.push(Rating {
            rating_id: 1,
            user_id: 1,
            movie_id: 1,
            rating: 4,
            timestamp: 300,
        });

        assert!(load(&db, &tables, 500).await.is_err());
        assert_eq!(genre::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(movie::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reset_clears_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let db = temp_db(&dir).await;
        load(&db, &sample_tables(), 500).await.unwrap();
        drop(db);

        let db = temp_db(&dir).await;
        assert_eq!(movie_genre::Entity::find().count(&db).await.unwrap(), 0);
        load(&db, &sample_tables(), 500).await.unwrap();
    }
}
