//! Fallback integration tests
//!
//! A gating error on the primary provider is mapped to a trigger and walked
//! down the model's fallback chain.

#[cfg(test)]
mod tests {
    use crate::common::TestRouter;
    use provider_router::{Config, FallbackTrigger, GatewayError, Result};
    use std::time::Duration;
    use tokio_test::assert_ok;

    const CONFIG: &str = r#"
providers:
  - id: openai
    base_url: "https://openai.example.com"
    rate_limit:
      requests_per_minute: 1
      concurrent_requests: null
  - id: anthropic
    base_url: "https://anthropic.example.com"
    rate_limit:
      requests_per_minute: null
      concurrent_requests: null

fallbacks:
  gpt-4:
    fallback_models: [claude-3-5-sonnet, gpt-4o-mini]
    triggers: [rate_limit, error]
    max_depth: 2
    delay_ms: 100
  claude-3-5-sonnet:
    fallback_models: [gpt-4]
    triggers: [cost_limit]
"#;

    fn env() -> TestRouter {
        let config = assert_ok!(Config::from_yaml_str(CONFIG));
        TestRouter::new(&config.gateway)
    }

    fn provider_for(model: &str) -> &'static str {
        if model.starts_with("claude") {
            "anthropic"
        } else {
            "openai"
        }
    }

    /// Admit `model` on its provider, walking the fallback chain on denial
    ///
    /// Returns the model that was admitted and the delays the caller would
    /// have paused for.
    fn admit_with_fallback(env: &TestRouter, model: &str) -> Result<(String, Vec<Duration>)> {
        let fallback = env.router.fallback();
        let mut current = model.to_string();
        let mut delays = Vec::new();
        let mut depth = 0;
        loop {
            let error = match env.router.authorize(provider_for(&current), None) {
                Ok(()) => return Ok((current, delays)),
                Err(error) => error,
            };
            if !fallback.should_fallback(model, FallbackTrigger::from_error(&error)) {
                return Err(error);
            }
            current = fallback.get_fallback_model(model, depth)?;
            delays.push(fallback.fallback_delay(model));
            depth += 1;
        }
    }

    #[tokio::test]
    async fn test_rate_limited_primary_falls_back() {
        let env = env();

        let (model, delays) = assert_ok!(admit_with_fallback(&env, "gpt-4"));
        assert_eq!(model, "gpt-4");
        assert!(delays.is_empty());

        let (model, delays) = assert_ok!(admit_with_fallback(&env, "gpt-4"));
        assert_eq!(model, "claude-3-5-sonnet");
        assert_eq!(delays, vec![Duration::from_millis(100)]);

        // The one-minute window rolls over and the primary is usable again
        env.advance(Duration::from_secs(61));
        let (model, _) = assert_ok!(admit_with_fallback(&env, "gpt-4"));
        assert_eq!(model, "gpt-4");
    }

    #[tokio::test]
    async fn test_chain_exhausted_at_max_depth() {
        let env = env();
        env.router.set_maintenance("anthropic", true);
        assert_ok!(env.router.authorize("openai", None));

        // openai is rate limited, anthropic is in maintenance, and the second
        // hop lands back on openai
        let result = admit_with_fallback(&env, "gpt-4");
        match result {
            Err(GatewayError::NoFallbackAvailable { model, depth }) => {
                assert_eq!(model, "gpt-4");
                assert_eq!(depth, 2);
            }
            other => panic!("expected NoFallbackAvailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_untriggered_error_is_returned() {
        let env = env();
        env.router.set_maintenance("anthropic", true);

        // claude-3-5-sonnet only falls back on cost limits
        let result = admit_with_fallback(&env, "claude-3-5-sonnet");
        assert!(matches!(result, Err(GatewayError::MaintenanceMode(_))));

        // A model without a rule never falls back
        env.router.set_maintenance("anthropic", false);
        assert_ok!(env.router.authorize("openai", None));
        let result = admit_with_fallback(&env, "gpt-4o-mini");
        assert!(matches!(result, Err(GatewayError::RateLimitExceeded(_))));
    }

    #[tokio::test]
    async fn test_rules_from_config() {
        let env = env();
        let fallback = env.router.fallback();

        assert_eq!(fallback.models(), vec!["claude-3-5-sonnet", "gpt-4"]);
        assert!(fallback.should_fallback("gpt-4", FallbackTrigger::RateLimit));
        assert!(!fallback.should_fallback("gpt-4", FallbackTrigger::Timeout));
        assert_eq!(
            fallback.get_fallback_model("gpt-4", 1).unwrap(),
            "gpt-4o-mini"
        );
        assert_eq!(fallback.fallback_delay("claude-3-5-sonnet"), Duration::ZERO);
        assert_eq!(fallback.rule("claude-3-5-sonnet").unwrap().max_depth, 3);
        assert!(matches!(
            fallback.get_fallback_model("claude-3-5-sonnet", 1),
            Err(GatewayError::NoFallbackAvailable { depth: 1, .. })
        ));
    }
}
