use std::{path::PathBuf, time::Duration};

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub dataset_url: String,
    pub data_dir: PathBuf,
    pub database_url: String,
    pub load_batch_size: usize,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let dataset_url = std::env::var("DATASET_URL").unwrap_or_else(|_| {
            "http://files.grouplens.org/datasets/movielens/ml-100k.zip".to_string()
        });

        let data_dir: PathBuf =
            std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()).into();

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://movielens.db?mode=rwc".to_string());

        let load_batch_size: usize = std::env::var("LOAD_BATCH_SIZE")
            .unwrap_or_else(|_| "500".to_string())
            .parse()
            .context("LOAD_BATCH_SIZE")?;

        let http_timeout_secs: u64 =
            std::env::var("HTTP_TIMEOUT_SECS").ok().and_then(|s| s.parse().ok()).unwrap_or(120);

        Ok(Self {
            dataset_url,
            data_dir,
            database_url,
            load_batch_size: load_batch_size.max(1),
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }
}
