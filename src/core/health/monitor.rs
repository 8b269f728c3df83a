//! Periodic health probing
//!
//! The monitor owns no health state of its own. Every round it asks the
//! router for the providers worth probing, probes each one concurrently,
//! and folds the results back into the router.

use super::checker::{HealthProbe, HttpProbe};
use super::types::HealthCheckResult;
use crate::core::router::ProviderRouter;
use crate::utils::error::Result;
use crate::utils::time::Clock;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

struct Running {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Background health monitor
pub struct HealthMonitor {
    router: Arc<ProviderRouter>,
    default_probe: Arc<dyn HealthProbe>,
    /// Per-provider probe overrides
    probes: RwLock<HashMap<String, Arc<dyn HealthProbe>>>,
    running: Mutex<Option<Running>>,
}

impl std::fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("probe_overrides", &self.probes.read().len())
            .field("running", &self.is_running())
            .finish()
    }
}

impl HealthMonitor {
    /// Create a monitor that probes over HTTP
    pub fn new(router: Arc<ProviderRouter>) -> Result<Self> {
        let probe = HttpProbe::new(router.health_config().check_timeout)?;
        Ok(Self::with_probe(router, Arc::new(probe)))
    }

    /// Create a monitor with a custom default probe
    pub fn with_probe(router: Arc<ProviderRouter>, probe: Arc<dyn HealthProbe>) -> Self {
        Self {
            router,
            default_probe: probe,
            probes: RwLock::new(HashMap::new()),
            running: Mutex::new(None),
        }
    }

    /// Use `probe` for one provider instead of the default
    pub fn set_probe(&self, provider_id: impl Into<String>, probe: Arc<dyn HealthProbe>) {
        self.probes.write().insert(provider_id.into(), probe);
    }

    fn probe_for(&self, provider_id: &str) -> Arc<dyn HealthProbe> {
        self.probes
            .read()
            .get(provider_id)
            .cloned()
            .unwrap_or_else(|| self.default_probe.clone())
    }

    /// Run one probe round and apply the results
    ///
    /// Each provider is probed in its own task, bounded by the configured
    /// check timeout, and its result is applied as soon as that probe ends.
    /// A timeout counts as a failed probe.
    pub async fn probe_once(&self) -> Vec<(String, HealthCheckResult)> {
        let targets = self.router.probe_targets();
        let timeout = self.router.health_config().check_timeout;

        let tasks: Vec<(String, JoinHandle<HealthCheckResult>)> = targets
            .into_iter()
            .map(|(provider_id, base_url)| {
                let probe = self.probe_for(&provider_id);
                let router = self.router.clone();
                let id = provider_id.clone();
                let task = tokio::spawn(async move {
                    let result = run_probe(probe.as_ref(), &router, &id, &base_url, timeout).await;
                    router.apply_probe_result(&id, &result);
                    result
                });
                (provider_id, task)
            })
            .collect();

        let mut results = Vec::with_capacity(tasks.len());
        for (provider_id, task) in tasks {
            match task.await {
                Ok(result) => results.push((provider_id, result)),
                Err(e) => error!("Health probe task for {} failed: {}", provider_id, e),
            }
        }
        results
    }

    /// Start probing every `check_interval` in the background
    ///
    /// Does nothing if probing is disabled or already running. The loop ends
    /// on [`stop`](Self::stop) or once the monitor is dropped.
    pub fn start(self: &Arc<Self>) {
        let config = self.router.health_config();
        if !config.enabled {
            info!("Health monitoring disabled");
            return;
        }

        let mut running = self.running.lock();
        if running.is_some() {
            warn!("Health monitor already running");
            return;
        }

        let (stop, mut stopped) = watch::channel(false);
        let monitor = Arc::downgrade(self);
        let check_interval = config.check_interval;
        info!("Starting health monitor, interval {:?}", check_interval);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(check_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let Some(monitor) = monitor.upgrade() else {
                            break;
                        };
                        let results = monitor.probe_once().await;
                        debug!("Health probe round finished: {} providers", results.len());
                    }
                    // Fires on stop() and when the monitor is dropped
                    _ = stopped.changed() => break,
                }
            }
            debug!("Health monitor loop exited");
        });

        *running = Some(Running { stop, task });
    }

    /// Whether the background loop is running
    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Stop the background loop and wait for it to exit
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().take() else {
            return;
        };
        info!("Stopping health monitor");

        let _ = running.stop.send(true);
        if let Err(e) = running.task.await {
            error!("Health monitor task ended abnormally: {}", e);
        }
    }
}

async fn run_probe(
    probe: &dyn HealthProbe,
    router: &ProviderRouter,
    provider_id: &str,
    base_url: &str,
    timeout: Duration,
) -> HealthCheckResult {
    let started = Instant::now();
    let outcome = tokio::time::timeout(timeout, probe.probe(provider_id, base_url)).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    let now = router.clock().now();

    match outcome {
        Ok(Ok(())) => HealthCheckResult::healthy(elapsed_ms, now),
        Ok(Err(e)) => {
            debug!("Probe for {} failed: {}", provider_id, e);
            HealthCheckResult::failed(e.to_string(), elapsed_ms, now)
        }
        Err(_) => {
            debug!("Probe for {} timed out after {:?}", provider_id, timeout);
            HealthCheckResult::failed("Health check timeout", elapsed_ms, now)
        }
    }
}
