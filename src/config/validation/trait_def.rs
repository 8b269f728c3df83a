//! Validation trait definition

/// Validation trait for configuration structures
///
/// Errors are plain messages; `Config::validate` wraps them in
/// `GatewayError::Config` with the section name.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}
