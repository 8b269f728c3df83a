//! Budget integration tests
//!
//! Spending recorded through the router drives alerts, summaries and
//! cost-aware selection.

#[cfg(test)]
mod tests {
    use crate::common::{TestRouter, start_time};
    use provider_router::{
        AlertAction, BudgetPeriod, CallOutcome, Config, CostBreakdown, GatewayError,
        RoutingStrategy, TokenUsage,
    };
    use std::time::Duration;
    use tokio_test::assert_ok;

    const CONFIG: &str = r#"
providers:
  - id: openai
    base_url: "https://openai.example.com"
    rate_limit:
      requests_per_minute: null
      concurrent_requests: null
  - id: anthropic
    base_url: "https://anthropic.example.com"
    cost:
      cost_multiplier: 0.5
    rate_limit:
      requests_per_minute: null
      concurrent_requests: null

budget:
  budgets:
    hourly: 10.0
    daily: 100.0
  alerts:
    - id: hourly-8
      name: Hourly spend
      period: hourly
      threshold: 8.0
      actions:
        - notify
        - webhook: "https://hooks.example.com/budget"
    - id: daily-half
      period: daily
      threshold_percent: 50
      actions: [notify]
"#;

    fn env() -> TestRouter {
        let config = assert_ok!(Config::from_yaml_str(CONFIG));
        TestRouter::new(&config.gateway)
    }

    /// A $2.50 call: 1000 input tokens at $1.00 and 500 output tokens at $1.50
    fn priced_call(provider: &str, model: &str) -> CallOutcome {
        CallOutcome::success(provider, model, Duration::from_millis(400))
            .with_usage(TokenUsage::new(1000, 500), CostBreakdown::new(1.0, 1.5))
    }

    #[tokio::test]
    async fn test_alert_fires_once_per_period() {
        let env = env();

        for _ in 0..3 {
            let fired = assert_ok!(env.router.report_outcome(priced_call("openai", "gpt-4o")).await);
            assert!(fired.is_empty());
        }

        let fired = assert_ok!(env.router.report_outcome(priced_call("openai", "gpt-4o")).await);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].alert_id, "hourly-8");
        assert_eq!(fired[0].alert_name, "Hourly spend");
        assert_eq!(fired[0].threshold, 8.0);
        assert_eq!(fired[0].current_spending, 10.0);
        assert_eq!(fired[0].budget, Some(10.0));

        // Both actions were handed to the notifier
        {
            let calls = env.notifier.calls.lock();
            assert_eq!(calls.len(), 2);
            assert_eq!(calls[0].1, AlertAction::Notify);
            assert_eq!(
                calls[1].1,
                AlertAction::Webhook("https://hooks.example.com/budget".to_string())
            );
        }

        let fired = assert_ok!(env.router.report_outcome(priced_call("openai", "gpt-4o")).await);
        assert!(fired.is_empty());
        assert_eq!(env.notifier.alert_ids(), vec!["hourly-8", "hourly-8"]);

        // Next hour: the hourly alert is armed again
        env.advance(Duration::from_secs(60 * 60));
        for _ in 0..3 {
            assert_ok!(env.router.report_outcome(priced_call("openai", "gpt-4o")).await);
        }
        let fired = assert_ok!(env.router.report_outcome(priced_call("openai", "gpt-4o")).await);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].alert_id, "hourly-8");
        assert_eq!(env.notifier.alert_ids().len(), 4);
    }

    #[tokio::test]
    async fn test_percent_alert_on_daily_budget() {
        let env = env();
        let budget = env.router.budget();

        // $10 an hour for three hours, then $20 more reaches half the daily budget
        for hour in 0..3 {
            for _ in 0..4 {
                env.router
                    .report_outcome(priced_call("anthropic", "claude-3-5-sonnet"))
                    .await
                    .unwrap();
            }
            assert_eq!(budget.current_spending(BudgetPeriod::Hourly), 10.0);
            assert_eq!(budget.current_spending(BudgetPeriod::Daily), 10.0 * (hour + 1) as f64);
            env.advance(Duration::from_secs(60 * 60));
        }
        assert!(!env.notifier.alert_ids().contains(&"daily-half".to_string()));

        for _ in 0..8 {
            env.router
                .report_outcome(priced_call("anthropic", "claude-3-5-sonnet"))
                .await
                .unwrap();
        }
        assert_eq!(budget.current_spending(BudgetPeriod::Daily), 50.0);
        let daily: Vec<_> = env
            .notifier
            .calls
            .lock()
            .iter()
            .filter(|(id, _, _)| id == "daily-half")
            .map(|(_, action, spent)| (action.clone(), *spent))
            .collect();
        assert_eq!(daily, vec![(AlertAction::Notify, 50.0)]);
    }

    #[tokio::test]
    async fn test_budget_blocks_cost_aware_selection_until_next_period() {
        let env = env();
        let candidates = ["openai", "anthropic"];

        let chosen = assert_ok!(env.router.select_provider_with_cost(
            &candidates,
            RoutingStrategy::LowestCost,
            1.0
        ));
        assert_eq!(chosen, "anthropic");
        env.router
            .report_outcome(priced_call(&chosen, "claude-3-5-sonnet"))
            .await
            .unwrap();

        for _ in 0..3 {
            env.router
                .report_outcome(priced_call("openai", "gpt-4o"))
                .await
                .unwrap();
        }
        assert_eq!(env.router.budget().current_spending(BudgetPeriod::Hourly), 10.0);

        // Estimates are scaled by each provider's multiplier before the budget check
        let result =
            env.router
                .select_provider_with_cost(&candidates, RoutingStrategy::LowestCost, 0.02);
        assert!(matches!(result, Err(GatewayError::NoHealthyProviders)));
        assert!(matches!(
            env.router.authorize("openai", Some(0.02)),
            Err(GatewayError::BudgetExceeded(_))
        ));

        // Selection without an estimate ignores budgets
        assert_ok!(env.router.select_provider(&candidates, RoutingStrategy::RoundRobin));

        // 09:15 + 45 minutes lands on the next hour
        env.advance(Duration::from_secs(45 * 60));
        assert_eq!(env.router.budget().current_spending(BudgetPeriod::Hourly), 0.0);
        assert_eq!(env.router.budget().current_spending(BudgetPeriod::Daily), 10.0);
        assert_ok!(env.router.select_provider_with_cost(
            &candidates,
            RoutingStrategy::LowestCost,
            0.02
        ));
    }

    #[tokio::test]
    async fn test_cost_summaries() {
        let env = env();
        env.router
            .report_outcome(priced_call("openai", "gpt-4o"))
            .await
            .unwrap();
        env.router
            .report_outcome(priced_call("anthropic", "claude-3-5-sonnet"))
            .await
            .unwrap();
        env.router
            .report_outcome(
                CallOutcome::failure("openai", "gpt-4o", Duration::from_millis(1000), "timeout")
                    .with_usage(TokenUsage::new(200, 0), CostBreakdown::new(0.5, 0.0)),
            )
            .await
            .unwrap();
        // A failed call without usage is not a ledger entry
        env.router
            .report_outcome(CallOutcome::failure(
                "openai",
                "gpt-4o",
                Duration::from_millis(50),
                "connection reset",
            ))
            .await
            .unwrap();

        let budget = env.router.budget();
        assert_eq!(budget.ledger_len(), 3);

        let summary = budget.current_period_summary(BudgetPeriod::Daily);
        assert_eq!(summary.total_requests, 3);
        assert_eq!(summary.successful_requests, 2);
        assert_eq!(summary.total_cost, 5.5);
        assert_eq!(summary.tokens.input_tokens, 2200);
        assert_eq!(summary.tokens.output_tokens, 1000);
        assert_eq!(summary.average_latency_ms, 600.0);
        assert_eq!(summary.provider_breakdown["openai"].requests, 2);
        assert_eq!(summary.provider_breakdown["openai"].total_cost, 3.0);
        assert_eq!(summary.model_breakdown["claude-3-5-sonnet"].total_cost, 2.5);

        // Range bounds are exclusive
        let until_start = budget.get_cost_summary(
            BudgetPeriod::Daily,
            start_time() - chrono::Duration::hours(1),
            start_time(),
        );
        assert_eq!(until_start.total_requests, 0);
        let around_start = budget.get_cost_summary(
            BudgetPeriod::Daily,
            start_time() - chrono::Duration::seconds(1),
            start_time() + chrono::Duration::seconds(1),
        );
        assert_eq!(around_start.total_requests, 3);
    }
}
