#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("missing data directory")]
    MissingDataDir,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("sqlite error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("sqlite-vec initialization error: {0}")]
    SqliteVec(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("source fetch error: {0}")]
    SourceFetch(String),
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    EmbeddingDimMismatch { expected: usize, actual: usize },
    #[error("embedding error: {0}")]
    Embedding(String),
    #[error("extraction error: {0}")]
    Extraction(String),
    #[error("llm error: {0}")]
    Llm(String),
    #[error("prop '{prop}' references unknown component '{component}'")]
    UnknownComponent { component: String, prop: String },
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type KnowledgeResult<T> = Result<T, KnowledgeError>;
