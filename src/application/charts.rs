use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::{IdentityRef, QuotaChart, QuotaKind, RenderedChart, Usage, UsageError};

use super::UsageService;

/// Direction of a usage preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Add,
    Sub,
}

/// Result of a preview: the gate for the pending action plus the chart
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub under_quota: bool,
    pub chart: RenderedChart,
}

/// Outcome of a refresh
#[derive(Debug, Clone, PartialEq)]
pub enum Refresh {
    Applied(RenderedChart),
    /// A newer refresh started while this one was in flight; its result was dropped
    Superseded,
}

/// Owns the chart of one (identity, kind) and serialises access to it.
///
/// Refreshes follow latest-request-wins: each refresh takes a ticket when it
/// starts and its result is only applied if no newer refresh has started
/// since.
pub struct ChartController {
    identity: IdentityRef,
    kind: QuotaKind,
    chart: Mutex<QuotaChart>,
    generation: AtomicU64,
}

impl ChartController {
    pub fn new(identity: IdentityRef, kind: QuotaKind) -> Self {
        Self {
            identity,
            kind,
            chart: Mutex::new(QuotaChart::new(kind)),
            generation: AtomicU64::new(0),
        }
    }

    pub fn kind(&self) -> QuotaKind {
        self.kind
    }

    /// Refresh from the cloud API
    pub async fn refresh(&self, usage: &UsageService) -> Refresh {
        self.refresh_with(usage.fetch(&self.identity, self.kind)).await
    }

    /// Refresh from any usage future
    pub async fn refresh_with<F>(&self, fetch: F) -> Refresh
    where
        F: Future<Output = Result<Usage, UsageError>>,
    {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let result = fetch.await;

        let mut chart = self.chart.lock().await;
        if self.generation.load(Ordering::SeqCst) != ticket {
            debug!("Dropping stale {} chart result for {}", self.kind, self.identity);
            return Refresh::Superseded;
        }

        Refresh::Applied(match result {
            Ok(usage) => chart.render(usage.used, usage.total),
            Err(e) => {
                warn!("{} chart for {} unavailable: {}", self.kind, self.identity, e);
                chart.render_unavailable(e.to_string())
            }
        })
    }

    /// Refresh, falling back to whatever is on screen when superseded
    pub async fn refresh_or_current(&self, usage: &UsageService) -> RenderedChart {
        match self.refresh(usage).await {
            Refresh::Applied(chart) => chart,
            Refresh::Superseded => self.current().await,
        }
    }

    pub async fn current(&self) -> RenderedChart {
        self.chart.lock().await.current().clone()
    }

    pub async fn has_state(&self) -> bool {
        self.chart.lock().await.state().is_some()
    }

    /// Preview a pending change without committing it
    pub async fn preview(&self, delta: f64, direction: Direction) -> Preview {
        let mut chart = self.chart.lock().await;
        let under_quota = match direction {
            Direction::Add => chart.add_usage(delta),
            Direction::Sub => chart.sub_usage(delta),
        };

        Preview {
            under_quota,
            chart: chart.current().clone(),
        }
    }
}

/// Chart controllers keyed by identity and kind
#[derive(Default)]
pub struct ChartRegistry {
    controllers: RwLock<HashMap<(IdentityRef, QuotaKind), Arc<ChartController>>>,
}

impl ChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the controller, creating it on first use
    pub fn controller(&self, identity: &IdentityRef, kind: QuotaKind) -> Arc<ChartController> {
        let key = (identity.clone(), kind);
        if let Some(existing) = self.controllers.read().unwrap_or_else(|e| e.into_inner()).get(&key) {
            return existing.clone();
        }

        self.controllers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(key)
            .or_insert_with(|| Arc::new(ChartController::new(identity.clone(), kind)))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.controllers.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}
