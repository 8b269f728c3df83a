//! Helper functions for creating and classifying errors

use super::types::GatewayError;

impl GatewayError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    pub fn notification<S: Into<String>>(message: S) -> Self {
        Self::Notification(message.into())
    }

    pub fn budget_exceeded<S: Into<String>>(message: S) -> Self {
        Self::BudgetExceeded(message.into())
    }

    pub fn no_fallback<S: Into<String>>(model: S, depth: usize) -> Self {
        Self::NoFallbackAvailable {
            model: model.into(),
            depth,
        }
    }

    /// Whether the caller can recover by retrying later, falling back, or
    /// picking another provider
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NoHealthyProviders
                | Self::NoFallbackAvailable { .. }
                | Self::RateLimitExceeded(_)
                | Self::BudgetExceeded(_)
                | Self::CircuitOpen(_)
                | Self::ProviderDisabled(_)
                | Self::MaintenanceMode(_)
                | Self::Timeout(_)
        )
    }

    /// Whether this error is a gating denial (the provider exists but may not
    /// be called right now)
    pub fn is_gating_denial(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded(_)
                | Self::BudgetExceeded(_)
                | Self::CircuitOpen(_)
                | Self::MaintenanceMode(_)
        )
    }
}
