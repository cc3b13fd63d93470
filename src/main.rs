mod config;
mod db;
mod entities;
mod error;
mod fetch;
mod genres;
mod loader;
mod models;
mod pipeline;
mod reader;
mod transform;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,movielens_loader=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let http = wreq::Client::builder().timeout(config.http_timeout).build()?;

    let files = fetch::ensure_dataset(&http, &config.dataset_url, &config.data_dir).await?;

    let tables = pipeline::run_blocking(files).await?;

    let db = db::connect_and_reset(&config.database_url).await?;
    let summary = loader::load(&db, &tables, config.load_batch_size).await?;
    db.close().await?;

    tracing::info!(
        genres = summary.genres,
        movies = summary.movies,
        movie_genres = summary.movie_genres,
        users = summary.users,
        ratings = summary.ratings,
        "movielens load complete"
    );

    Ok(())
}
