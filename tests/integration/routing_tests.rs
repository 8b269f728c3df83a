//! Routing integration tests
//!
//! Selection, outcome reporting, failover and probe-driven health.

#[cfg(test)]
mod tests {
    use crate::common::{TestRouter, provider};
    use async_trait::async_trait;
    use mockall::mock;
    use mockall::predicate::eq;
    use provider_router::config::GatewayConfig;
    use provider_router::{
        CallOutcome, CircuitState, GatewayError, HealthMonitor, HealthProbe, HealthStatus, Result,
        RoutingStrategy,
    };
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_test::assert_ok;

    mock! {
        pub Probe {}

        #[async_trait]
        impl HealthProbe for Probe {
            async fn probe(&self, provider_id: &str, base_url: &str) -> Result<()>;
        }
    }

    const CANDIDATES: [&str; 2] = ["anthropic", "openai"];

    /// One simulated call: select, then report the outcome
    async fn call(env: &TestRouter, strategy: RoutingStrategy, fails: &[&str]) -> Result<String> {
        let provider = env.router.select_provider(&CANDIDATES, strategy)?;
        let outcome = if fails.contains(&provider.as_str()) {
            CallOutcome::failure(&provider, "gpt-4o", Duration::from_millis(900), "upstream 503")
        } else {
            CallOutcome::success(&provider, "gpt-4o", Duration::from_millis(250))
        };
        env.router.report_outcome(outcome).await?;
        Ok(provider)
    }

    /// Failing provider is circuit-broken, then recovers through a half-open trial
    #[tokio::test]
    async fn test_failover_and_recovery() {
        let mut config = GatewayConfig {
            providers: CANDIDATES.iter().map(|id| provider(id)).collect(),
            ..GatewayConfig::default()
        };
        config.router.admit_degraded = true;
        let env = TestRouter::new(&config);

        // Round robin alternates, so openai sees every other call
        let mut served: HashMap<String, usize> = HashMap::new();
        for _ in 0..10 {
            let provider = assert_ok!(call(&env, RoutingStrategy::RoundRobin, &["openai"]).await);
            *served.entry(provider).or_default() += 1;
        }
        assert_eq!(served["openai"], 5);

        let openai = env.router.provider_snapshot("openai").unwrap();
        assert_eq!(openai.circuit.state, CircuitState::Open);
        assert_eq!(openai.health.status, HealthStatus::Degraded);
        assert_eq!(openai.usage.active_requests, 0);

        for _ in 0..4 {
            let provider = assert_ok!(call(&env, RoutingStrategy::RoundRobin, &[]).await);
            assert_eq!(provider, "anthropic");
        }

        env.advance(Duration::from_secs(30));
        assert_eq!(
            env.router.provider_snapshot("openai").unwrap().circuit.state,
            CircuitState::Open
        );
        assert_ok!(env.router.authorize("openai", None));
        assert!(matches!(
            env.router.authorize("openai", None),
            Err(GatewayError::CircuitOpen(_))
        ));
        env.router
            .report_outcome(CallOutcome::success("openai", "gpt-4o", Duration::from_millis(200)))
            .await
            .unwrap();

        assert_eq!(
            env.router.provider_snapshot("openai").unwrap().circuit.state,
            CircuitState::Closed
        );
    }

    #[tokio::test]
    async fn test_all_providers_exhausted() {
        let env = TestRouter::with_providers(&CANDIDATES);
        for id in CANDIDATES {
            for _ in 0..5 {
                env.router
                    .update_provider_metrics(id, Duration::from_millis(10), false, None);
            }
        }

        let result = env
            .router
            .select_provider(&CANDIDATES, RoutingStrategy::LeastLatency);
        assert!(matches!(result, Err(GatewayError::NoHealthyProviders)));
    }

    #[tokio::test]
    async fn test_every_strategy_selects_from_candidates() {
        let env = TestRouter::with_providers(&CANDIDATES);
        for strategy in RoutingStrategy::ALL {
            let provider = assert_ok!(call(&env, strategy, &[]).await);
            assert!(CANDIDATES.contains(&provider.as_str()));
        }
    }

    #[tokio::test]
    async fn test_concurrent_selection_respects_concurrency_limit() {
        let mut limited = provider("solo");
        limited.rate_limit.concurrent_requests = Some(4);
        let config = GatewayConfig {
            providers: vec![limited],
            ..GatewayConfig::default()
        };
        let env = TestRouter::new(&config);

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let router = env.router.clone();
                tokio::spawn(async move {
                    router
                        .select_provider(&["solo"], RoutingStrategy::RoundRobin)
                        .is_ok()
                })
            })
            .collect();

        let mut admitted = 0;
        for task in tasks {
            if task.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 4);
        assert_eq!(env.router.rate_limiter().active_requests("solo"), 4);
    }

    #[tokio::test]
    async fn test_probe_failures_route_around_provider() {
        let env = TestRouter::with_providers(&CANDIDATES);

        let mut probe = MockProbe::new();
        probe
            .expect_probe()
            .with(eq("openai"), eq("https://openai.example.com"))
            .returning(|id, _| Err(GatewayError::ProbeFailed(id.to_string())));
        probe
            .expect_probe()
            .with(eq("anthropic"), eq("https://anthropic.example.com"))
            .returning(|_, _| Ok(()));

        let monitor = HealthMonitor::with_probe(env.router.clone(), Arc::new(probe));
        let threshold = env.router.health_config().probe_failure_threshold;
        for _ in 0..=threshold {
            monitor.probe_once().await;
        }

        assert_eq!(
            env.router.provider_snapshot("openai").unwrap().health.status,
            HealthStatus::Unhealthy
        );
        assert_eq!(env.router.system_health().unhealthy, 1);
        for _ in 0..3 {
            let provider = env
                .router
                .select_provider(&CANDIDATES, RoutingStrategy::RoundRobin)
                .unwrap();
            assert_eq!(provider, "anthropic");
        }
    }

    /// Under default thresholds one failed call takes a provider out until a
    /// health check passes
    #[tokio::test]
    async fn test_failed_provider_returns_after_passing_check() {
        let env = TestRouter::with_providers(&CANDIDATES);
        env.router
            .report_outcome(CallOutcome::failure(
                "openai",
                "gpt-4o",
                Duration::from_millis(900),
                "upstream 503",
            ))
            .await
            .unwrap();

        for _ in 0..3 {
            let provider = assert_ok!(call(&env, RoutingStrategy::RoundRobin, &[]).await);
            assert_eq!(provider, "anthropic");
        }

        let mut probe = MockProbe::new();
        probe.expect_probe().times(2).returning(|_, _| Ok(()));
        let monitor = HealthMonitor::with_probe(env.router.clone(), Arc::new(probe));
        env.advance(Duration::from_secs(1));
        monitor.probe_once().await;

        let mut seen: Vec<String> = Vec::new();
        for _ in 0..2 {
            seen.push(assert_ok!(call(&env, RoutingStrategy::RoundRobin, &[]).await));
        }
        seen.sort();
        assert_eq!(seen, vec!["anthropic", "openai"]);
    }

    #[tokio::test]
    async fn test_maintenance_window() {
        let env = TestRouter::with_providers(&CANDIDATES);
        env.router.set_maintenance("anthropic", true);

        for _ in 0..3 {
            let provider = assert_ok!(call(&env, RoutingStrategy::RoundRobin, &[]).await);
            assert_eq!(provider, "openai");
        }

        env.router.set_maintenance("anthropic", false);
        let mut seen: Vec<String> = Vec::new();
        for _ in 0..2 {
            seen.push(assert_ok!(call(&env, RoutingStrategy::RoundRobin, &[]).await));
        }
        seen.sort();
        assert_eq!(seen, vec!["anthropic", "openai"]);
    }
}
