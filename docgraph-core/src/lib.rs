pub mod config;

pub use config::{
    Config,
    ConfigError,
    CrawlSettings,
    EmbeddingSettings,
    KnowledgeSettings,
    LlmSettings,
    LoggingSettings,
    RetrievalDefaults,
    RetrievalSettings,
    Secrets,
    SecretsError,
    Settings,
    SettingsError,
    StorageSettings,
    load_dotenv,
};
