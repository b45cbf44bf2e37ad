/// Data source abstractions
///
/// The dashboard reads from three outside collaborators: the relational
/// catalog, the testing results table, and the external answering service.
/// Each is a trait so handlers and services can run against in-memory
/// implementations in tests.
use crate::{
    error::AppResult,
    models::{ChannelDirectory, CoOccurrence, TestingResult},
};

pub mod answer_service;
pub mod postgres;

pub use answer_service::HttpAnswerService;
pub use postgres::PgCatalog;

/// Read-only listing of channels, solutions and publication types
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// Names of every known channel
    async fn list_channels(&self) -> AppResult<Vec<String>>;

    /// Names of every known solution
    async fn list_solutions(&self) -> AppResult<Vec<String>>;

    /// Distinct PubMed publication types, sorted
    async fn list_publication_types(&self) -> AppResult<Vec<String>>;

    /// Catalog channel ids and their names
    async fn channel_directory(&self) -> AppResult<ChannelDirectory>;

    /// Channels that appeared with `channel_id`, with visit counts
    async fn co_occurrence(&self, channel_id: &str) -> AppResult<Vec<CoOccurrence>>;
}

/// Read-only access to stored testing results
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TestingResultSource: Send + Sync {
    async fn fetch_testing_results(&self) -> AppResult<Vec<TestingResult>>;
}

/// External service answering free-text questions
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AnswerService: Send + Sync {
    /// Sends an already enriched prompt and returns the answer text
    ///
    /// Failures are reported as `AppError::AnswerService` and never retried.
    async fn answer(&self, prompt: &str, max_iterations: Option<u32>) -> AppResult<String>;

    /// Service name for logging
    fn name(&self) -> &'static str;
}
