use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::error::AppResult;

const PRAGMAS: [&str; 3] =
    ["PRAGMA foreign_keys=ON", "PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL"];

/// Opens the target database and recreates the schema from scratch.
///
/// Existing tables are dropped first, so every run loads into empty tables.
pub async fn connect_and_reset(database_url: &str) -> AppResult<DatabaseConnection> {
    let db = Database::connect(database_url).await?;

    for pragma in PRAGMAS {
        db.execute(Statement::from_string(db.get_database_backend(), pragma.to_string()))
            .await?;
    }

    migration::Migrator::fresh(&db).await?;
    info!("schema recreated");

    Ok(db)
}
