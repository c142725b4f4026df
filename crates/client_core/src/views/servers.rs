//! Server browser: a polling snapshot of every game server plus derived
//! capacity figures and the user's filters.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use shared::protocol::ServerState;
use tokio::{sync::watch, task::JoinHandle};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

use crate::{notify::Flash, views::ViewContext};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Slot count assumed per server for the global capacity figure.
pub const DEFAULT_SLOTS: u32 = 24;
const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Default)]
pub struct ServerSnapshot {
    pub servers: Vec<ServerState>,
    pub last_error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Usage {
    pub label: String,
    pub used: u32,
    pub capacity: u32,
}

impl Usage {
    pub fn percent(&self) -> u32 {
        if self.capacity == 0 {
            return 0;
        }
        (f64::from(self.used) / f64::from(self.capacity) * 100.0).round() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerStats {
    pub global: Usage,
    /// Sorted by region name.
    pub regions: Vec<Usage>,
}

impl ServerStats {
    pub fn compute(servers: &[ServerState]) -> Self {
        let global = Usage {
            label: "Global".to_string(),
            used: servers.iter().map(player_count).sum(),
            capacity: DEFAULT_SLOTS * servers.len() as u32,
        };

        let mut regions: BTreeMap<&str, Usage> = BTreeMap::new();
        for server in servers {
            let entry = regions.entry(server.region.as_str()).or_insert_with(|| Usage {
                label: server.region.clone(),
                used: 0,
                capacity: 0,
            });
            entry.used += player_count(server);
            entry.capacity += slot_count(server);
        }

        Self {
            global,
            regions: regions.into_values().collect(),
        }
    }
}

fn player_count(server: &ServerState) -> u32 {
    server.players.len() as u32
}

fn slot_count(server: &ServerState) -> u32 {
    if server.max_players == 0 {
        DEFAULT_SLOTS
    } else {
        server.max_players
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proximity {
    pub latitude: f64,
    pub longitude: f64,
    pub range_km: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerFilters {
    /// `None` shows every region.
    pub region: Option<String>,
    pub open_only: bool,
    pub proximity: Option<Proximity>,
}

pub fn distance_km(lat_a: f64, lng_a: f64, lat_b: f64, lng_b: f64) -> f64 {
    let (phi_a, phi_b) = (lat_a.to_radians(), lat_b.to_radians());
    let d_phi = (lat_b - lat_a).to_radians();
    let d_lambda = (lng_b - lng_a).to_radians();
    let h = (d_phi / 2.0).sin().powi(2) + phi_a.cos() * phi_b.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerRow {
    pub name: String,
    pub region: String,
    pub address: String,
    pub map: String,
    pub players: u32,
    pub slots: u32,
    pub distance_km: Option<f64>,
}

/// Applies the filters; with a proximity filter rows are ordered nearest first.
pub fn filter_servers(servers: &[ServerState], filters: &ServerFilters) -> Vec<ServerRow> {
    let mut rows: Vec<ServerRow> = servers
        .iter()
        .filter(|s| filters.region.as_ref().map_or(true, |region| &s.region == region))
        .filter(|s| !filters.open_only || player_count(s) < slot_count(s))
        .filter_map(|s| {
            let distance = filters
                .proximity
                .map(|p| distance_km(p.latitude, p.longitude, s.latitude, s.longitude));
            if let (Some(d), Some(p)) = (distance, filters.proximity) {
                if d > p.range_km {
                    return None;
                }
            }
            Some(ServerRow {
                name: s.name.clone(),
                region: s.region.clone(),
                address: format!("{}:{}", s.host, s.port),
                map: s.map.clone(),
                players: player_count(s),
                slots: slot_count(s),
                distance_km: distance,
            })
        })
        .collect();
    if filters.proximity.is_some() {
        rows.sort_by(|a, b| a.distance_km.partial_cmp(&b.distance_km).unwrap_or(std::cmp::Ordering::Equal));
    }
    rows
}

#[derive(Default)]
struct PollCounters {
    cycles: AtomicU64,
    rearms: AtomicU64,
}

/// Handle of a running poll task. Dropping it stops the task.
pub struct PollerHandle {
    task: Option<JoinHandle<()>>,
    snapshots: watch::Receiver<ServerSnapshot>,
    counters: Arc<PollCounters>,
}

impl PollerHandle {
    /// Fetches immediately, then waits `interval` after every completed
    /// cycle, successful or not, before fetching again.
    pub fn spawn(ctx: ViewContext, interval: Duration) -> Self {
        let (tx, snapshots) = watch::channel(ServerSnapshot::default());
        let counters = Arc::new(PollCounters::default());
        let task_counters = Arc::clone(&counters);
        info!("servers: poller started interval_ms={}", interval.as_millis());
        let task = tokio::spawn(async move {
            loop {
                run_cycle(&ctx, &tx).await;
                task_counters.cycles.fetch_add(1, Ordering::SeqCst);
                let delay = tokio::time::sleep(interval);
                task_counters.rearms.fetch_add(1, Ordering::SeqCst);
                debug!("servers: poll re-armed delay_ms={}", interval.as_millis());
                delay.await;
            }
        });
        Self {
            task: Some(task),
            snapshots,
            counters,
        }
    }

    pub fn latest(&self) -> ServerSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ServerSnapshot> {
        self.snapshots.clone()
    }

    pub fn stream(&self) -> WatchStream<ServerSnapshot> {
        WatchStream::new(self.snapshots.clone())
    }

    pub fn cycles(&self) -> u64 {
        self.counters.cycles.load(Ordering::SeqCst)
    }

    pub fn rearms(&self) -> u64 {
        self.counters.rearms.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub async fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
            info!("servers: poller stopped cycles={}", self.cycles());
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run_cycle(ctx: &ViewContext, tx: &watch::Sender<ServerSnapshot>) {
    match ctx.api.list_servers().await {
        Ok(servers) => {
            debug!("servers: poll ok count={}", servers.len());
            tx.send_modify(|snapshot| {
                snapshot.servers = servers;
                snapshot.last_error = None;
                snapshot.updated_at = Some(Utc::now());
            });
        }
        Err(err) => {
            warn!("servers: poll failed err={err}");
            ctx.flash(Flash::error(format!("Failed to load server: {err}")));
            tx.send_modify(|snapshot| snapshot.last_error = Some(err.to_string()));
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerScreen {
    pub stats: ServerStats,
    pub regions: Vec<String>,
    pub rows: Vec<ServerRow>,
    pub last_error: Option<String>,
}

pub fn render_servers(snapshot: &ServerSnapshot, filters: &ServerFilters) -> ServerScreen {
    let stats = ServerStats::compute(&snapshot.servers);
    ServerScreen {
        regions: stats.regions.iter().map(|r| r.label.clone()).collect(),
        rows: filter_servers(&snapshot.servers, filters),
        stats,
        last_error: snapshot.last_error.clone(),
    }
}

/// The server page: owns the poller for as long as it is mounted.
pub struct ServerBrowser {
    poller: PollerHandle,
    filters: Mutex<ServerFilters>,
}

impl ServerBrowser {
    pub fn mount(ctx: ViewContext, interval: Duration) -> Self {
        Self {
            poller: PollerHandle::spawn(ctx, interval),
            filters: Mutex::new(ServerFilters::default()),
        }
    }

    pub fn poller(&self) -> &PollerHandle {
        &self.poller
    }

    pub fn filters(&self) -> ServerFilters {
        self.filters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_filters(&self, filters: ServerFilters) {
        *self.filters.lock().unwrap_or_else(PoisonError::into_inner) = filters;
    }

    pub fn render(&self) -> ServerScreen {
        render_servers(&self.poller.latest(), &self.filters())
    }

    pub async fn unmount(self) {
        self.poller.stop().await;
    }
}

#[cfg(test)]
#[path = "../tests/servers_tests.rs"]
mod tests;
