use thiserror::Error;

/// One variant per store operation, so call sites decide per failure class
/// what is fatal, what is logged and skipped, and what is echoed back to
/// the user.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to connect to MongoDB: {0}")]
    ConnectionFailed(String),

    #[error("failed to set up collection: {0}")]
    BootstrapFailed(String),

    #[error("count query failed: {0}")]
    CountFailed(String),

    #[error("search query failed: {0}")]
    QueryFailed(String),

    #[error("bulk insert failed: {0}")]
    InsertFailed(String),
}
