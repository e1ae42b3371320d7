use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod products;

pub use app_config::{AppConfig, DatabaseConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{
    load_product_catalog, CatalogFile, Product, ProductInput, ProductPatch, RatingBucket, Review,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read product catalog at {path}")]
    CatalogFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse product catalog")]
    CatalogFileParse(#[from] serde_yaml::Error),
    #[error("invalid product catalog: {0}")]
    Validation(String),
}
