use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Genre::Table)
                    .if_not_exists()
                    .col(integer(Genre::GenreId).primary_key())
                    .col(string(Genre::GenreName).unique_key())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Movies::Table)
                    .if_not_exists()
                    .col(integer(Movies::MovieId).primary_key())
                    .col(string(Movies::Title))
                    .col(string_null(Movies::ImdbUrl))
                    .col(integer(Movies::NumGenres))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieGenres::Table)
                    .if_not_exists()
                    .col(integer(MovieGenres::MovieGenreId).primary_key())
                    .col(integer(MovieGenres::MovieId))
                    .col(integer(MovieGenres::GenreId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_genres_movie")
                            .from(MovieGenres::Table, MovieGenres::MovieId)
                            .to(Movies::Table, Movies::MovieId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_genres_genre")
                            .from(MovieGenres::Table, MovieGenres::GenreId)
                            .to(Genre::Table, Genre::GenreId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_genres_movie_genre")
                    .table(MovieGenres::Table)
                    .col(MovieGenres::MovieId)
                    .col(MovieGenres::GenreId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(integer(Users::UserId).primary_key())
                    .col(integer(Users::Age))
                    .col(string(Users::Gender))
                    .col(string(Users::Occupation))
                    .col(string(Users::ZipCode))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Ratings::Table)
                    .if_not_exists()
                    .col(integer(Ratings::RatingId).primary_key())
                    .col(integer(Ratings::UserId))
                    .col(integer(Ratings::MovieId))
                    .col(integer(Ratings::Rating))
                    .col(big_integer(Ratings::Timestamp))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ratings_user")
                            .from(Ratings::Table, Ratings::UserId)
                            .to(Users::Table, Users::UserId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ratings_movie")
                            .from(Ratings::Table, Ratings::MovieId)
                            .to(Movies::Table, Movies::MovieId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ratings_user")
                    .table(Ratings::Table)
                    .col(Ratings::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ratings_movie")
                    .table(Ratings::Table)
                    .col(Ratings::MovieId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Ratings::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieGenres::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Movies::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Genre::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Genre {
    Table,
    GenreId,
    GenreName,
}

#[derive(DeriveIden)]
enum Movies {
    Table,
    MovieId,
    Title,
    ImdbUrl,
    NumGenres,
}

#[derive(DeriveIden)]
enum MovieGenres {
    Table,
    MovieGenreId,
    MovieId,
    GenreId,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    UserId,
    Age,
    Gender,
    Occupation,
    ZipCode,
}

#[derive(DeriveIden)]
enum Ratings {
    Table,
    RatingId,
    UserId,
    MovieId,
    Rating,
    Timestamp,
}
