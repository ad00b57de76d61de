use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{Instance, InstanceRow, InstanceSize, Profile, QuotaChart, QuotaKind, RenderedChart, Volume};
use crate::ports::{CollectionStore, StoreEvent, SubscriptionId};

use super::usage::local_usage;

/// Stores backing the selected identity, injected into screen components
#[derive(Clone)]
pub struct Collections {
    pub profile: Arc<dyn CollectionStore<Profile>>,
    pub instances: Arc<dyn CollectionStore<Instance>>,
    pub volumes: Arc<dyn CollectionStore<Volume>>,
    pub sizes: Arc<dyn CollectionStore<InstanceSize>>,
}

impl Collections {
    fn render_local(&self, chart: &mut QuotaChart) {
        let profile = self.profile.snapshot();
        let result = local_usage(
            chart.kind(),
            profile.first(),
            &self.instances.snapshot(),
            &self.volumes.snapshot(),
            &self.sizes.snapshot(),
        );

        match result {
            Ok(usage) => {
                chart.render(usage.used, usage.total);
            }
            Err(e) => {
                debug!("{} chart unavailable: {}", chart.kind(), e);
                chart.render_unavailable(e.to_string());
            }
        }
    }
}

/// Instance list screen of the selected identity
#[derive(Debug, Clone, Serialize)]
pub struct InstanceScreenView {
    /// No instances: the placeholder screen is shown
    pub empty: bool,
    pub instances: Vec<InstanceRow>,
    pub charts: Vec<RenderedChart>,
}

struct ScreenState {
    cpu: QuotaChart,
    mem: QuotaChart,
    instances: Vec<InstanceRow>,
    load_error: Option<String>,
}

/// Composes the instance list and its cpu/mem charts, re-rendering on
/// store events
pub struct InstanceScreen {
    collections: Collections,
    state: Mutex<ScreenState>,
    subscriptions: Mutex<Vec<Subscription>>,
}

enum Subscription {
    Profile(SubscriptionId),
    Instances(SubscriptionId),
    Sizes(SubscriptionId),
}

impl InstanceScreen {
    pub fn new(collections: Collections) -> Self {
        Self {
            collections,
            state: Mutex::new(ScreenState {
                cpu: QuotaChart::new(QuotaKind::Cpu),
                mem: QuotaChart::new(QuotaKind::Mem),
                instances: Vec::new(),
                load_error: None,
            }),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Render once and follow the stores until `detach`
    pub fn attach(self: &Arc<Self>) {
        self.render();

        let mut subscriptions = self.lock_subscriptions();

        let screen = Arc::downgrade(self);
        subscriptions.push(Subscription::Instances(self.collections.instances.subscribe(Arc::new(
            move |event: &StoreEvent<Instance>| {
                if let Some(screen) = screen.upgrade() {
                    screen.on_instances(event);
                }
            },
        ))));

        let screen = Arc::downgrade(self);
        subscriptions.push(Subscription::Sizes(self.collections.sizes.subscribe(Arc::new(
            move |event: &StoreEvent<InstanceSize>| {
                if matches!(event, StoreEvent::Fail(_)) {
                    return;
                }
                if let Some(screen) = screen.upgrade() {
                    screen.render_charts();
                }
            },
        ))));

        let screen = Arc::downgrade(self);
        subscriptions.push(Subscription::Profile(self.collections.profile.subscribe(Arc::new(
            move |_event: &StoreEvent<Profile>| {
                if let Some(screen) = screen.upgrade() {
                    screen.render_charts();
                }
            },
        ))));
    }

    pub fn detach(&self) {
        for subscription in self.lock_subscriptions().drain(..) {
            match subscription {
                Subscription::Profile(id) => self.collections.profile.unsubscribe(id),
                Subscription::Instances(id) => self.collections.instances.unsubscribe(id),
                Subscription::Sizes(id) => self.collections.sizes.unsubscribe(id),
            };
        }
    }

    fn on_instances(&self, event: &StoreEvent<Instance>) {
        match event {
            StoreEvent::Fail(reason) => {
                warn!("Instance list failed to load: {}", reason);
                self.lock_state().load_error = Some(reason.clone());
            }
            StoreEvent::Add(_) | StoreEvent::Remove(_) | StoreEvent::Change(_) | StoreEvent::Reset(_) => {
                self.render();
            }
        }
    }

    /// Rebuild the instance list and both charts
    pub fn render(&self) {
        let rows = self
            .collections
            .instances
            .snapshot()
            .iter()
            .map(InstanceRow::from)
            .collect();

        let mut state = self.lock_state();
        state.instances = rows;
        state.load_error = None;
        self.collections.render_local(&mut state.cpu);
        self.collections.render_local(&mut state.mem);
    }

    fn render_charts(&self) {
        let mut state = self.lock_state();
        self.collections.render_local(&mut state.cpu);
        self.collections.render_local(&mut state.mem);
    }

    /// Preview launching (or resizing to) an instance of `size`.
    ///
    /// Returns whether both cpu and mem stay within quota; the launch
    /// should be blocked otherwise.
    pub fn preview_launch(&self, size: &InstanceSize) -> bool {
        let mut state = self.lock_state();
        let cpu_ok = state.cpu.add_usage(size.cpu);
        let mem_ok = state.mem.add_usage(size.mem);
        cpu_ok && mem_ok
    }

    pub fn view(&self) -> InstanceScreenView {
        let state = self.lock_state();
        InstanceScreenView {
            empty: state.instances.is_empty(),
            instances: state.instances.clone(),
            charts: vec![state.cpu.current().clone(), state.mem.current().clone()],
        }
    }

    pub fn load_error(&self) -> Option<String> {
        self.lock_state().load_error.clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, ScreenState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_subscriptions(&self) -> MutexGuard<'_, Vec<Subscription>> {
        self.subscriptions.lock().unwrap_or_else(|e| e.into_inner())
    }
}
