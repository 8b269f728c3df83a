//! Error types for the provider router

use thiserror::Error;

/// Result type alias for the provider router
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for the provider router
///
/// The first group of variants are routing outcomes a caller is expected to
/// handle (fall back, back off, or surface). None of them is process-fatal.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// No candidate provider survived health, breaker, rate and budget filtering
    #[error("No healthy providers available")]
    NoHealthyProviders,

    /// The fallback chain for a model is exhausted or disabled
    #[error("No fallback available for model {model} at depth {depth}")]
    NoFallbackAvailable { model: String, depth: usize },

    /// Provider exceeded its requests-per-minute or concurrency limit
    #[error("Rate limit exceeded for provider: {0}")]
    RateLimitExceeded(String),

    /// A configured spending budget would be exceeded
    #[error("Budget exceeded: {0}")]
    BudgetExceeded(String),

    /// Provider circuit breaker is open
    #[error("Circuit breaker open for provider: {0}")]
    CircuitOpen(String),

    /// Provider is disabled in configuration
    #[error("Provider disabled: {0}")]
    ProviderDisabled(String),

    /// Provider is in maintenance mode
    #[error("Provider in maintenance mode: {0}")]
    MaintenanceMode(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Health probe reported the provider unreachable
    #[error("Health probe failed: {0}")]
    ProbeFailed(String),

    /// Alert notification errors
    #[error("Notification error: {0}")]
    Notification(String),

    /// Cost calculation errors
    #[error("Cost calculation error: {0}")]
    Cost(String),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
