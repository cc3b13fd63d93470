use std::{fmt, path::PathBuf};

/// Failures raised while turning the raw MovieLens files into finished tables.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("source file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("{}:{line}: invalid value {value:?} in column `{column}`", file.display())]
    InvalidData { file: PathBuf, line: u64, column: &'static str, value: String },

    #[error("movie record {line}: movie {movie_id} has {found} genre flags, expected {expected}")]
    MissingField { line: u64, movie_id: i32, found: usize, expected: usize },

    #[error("movie {movie_id}: genre `{name}` is not in the vocabulary")]
    UnknownGenre { movie_id: i32, name: String },

    #[error("genre vocabulary lists `{0}` more than once")]
    DuplicateGenre(String),

    #[error("table `{table}` has more rows than fit in an i32 key")]
    KeyOverflow { table: &'static str },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: malformed record: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// The component of the pipeline a failure came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stage {
    Read,
    NormalizeGenres,
    BuildCatalog,
    BuildJunction,
    AssignKeys,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Read => "read raw tables",
            Stage::NormalizeGenres => "normalize genres",
            Stage::BuildCatalog => "build genre catalog",
            Stage::BuildJunction => "build movie_genres",
            Stage::AssignKeys => "assign surrogate keys",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("pipeline aborted at `{stage}`: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: TransformError,
}

impl PipelineError {
    pub fn at(stage: Stage) -> impl FnOnce(TransformError) -> Self {
        move |source| Self { stage, source }
    }
}

#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self(anyhow::Error::new(err))
    }
}

impl From<wreq::Error> for AppError {
    fn from(err: wreq::Error) -> Self {
        Self(anyhow::Error::new(err))
    }
}

impl From<zip::result::ZipError> for AppError {
    fn from(err: zip::result::ZipError) -> Self {
        Self(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self(anyhow::Error::new(err))
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        Self(anyhow::Error::new(err))
    }
}

pub type AppResult<T> = Result<T, AppError>;
