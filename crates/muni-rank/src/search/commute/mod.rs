//! Tiered commute resolution.
//!
//! For an (origin, workplace, mode) triple the estimator tries, in order: the
//! same-candidate shortcut, the shared cache, the routing service (only when the caller
//! hands over a [`CallBudget`]), the geometric heuristic, and finally a fixed default.
//! Everything except the same-candidate shortcut is cached for the lifetime of the
//! estimator.

pub mod heuristic;
pub mod routing;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::{round_to, Candidate, CandidateCode, Coordinates};
use super::geo::haversine_km;
use super::model::ScoringModel;

pub use routing::{DistanceMatrixClient, RouteLeg, RouteRequest, RoutingError, RoutingService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    Driving,
    Transit,
}

impl TravelMode {
    pub const fn from_has_car(has_car: bool) -> Self {
        if has_car {
            Self::Driving
        } else {
            Self::Transit
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Driving => "driving",
            Self::Transit => "transit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommuteSource {
    SameCity,
    RoutingService,
    Heuristic,
    DefaultEstimate,
}

/// Resolved one-way commute from a candidate to the workplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommuteDetail {
    pub straight_line_km: Option<f64>,
    pub road_km: f64,
    pub one_way_minutes: f64,
    pub daily_minutes: f64,
    pub source: CommuteSource,
    pub same_city: bool,
    pub mode: TravelMode,
    pub workplace_name: String,
}

impl CommuteDetail {
    fn new(
        straight_line_km: Option<f64>,
        road_km: f64,
        one_way_minutes: f64,
        source: CommuteSource,
        mode: TravelMode,
        workplace: &Candidate,
    ) -> Self {
        let one_way_minutes = round_to(one_way_minutes, 1);
        Self {
            straight_line_km: straight_line_km.map(|km| round_to(km, 2)),
            road_km: round_to(road_km, 2),
            one_way_minutes,
            daily_minutes: round_to(one_way_minutes * 2.0, 1),
            source,
            same_city: source == CommuteSource::SameCity,
            mode,
            workplace_name: workplace.name.clone(),
        }
    }

    pub fn is_default_estimate(&self) -> bool {
        self.source == CommuteSource::DefaultEstimate
    }
}

/// Per-search allowance of routing calls plus the throttle clock between them.
#[derive(Debug)]
pub struct CallBudget {
    remaining: u32,
    used: u32,
    delay: Duration,
    last_call: Option<Instant>,
}

impl CallBudget {
    pub fn new(limit: u32, delay: Duration) -> Self {
        Self {
            remaining: limit,
            used: 0,
            delay,
            last_call: None,
        }
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Claims one call, sleeping first if the previous call was too recent.
    fn acquire(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        if let Some(last) = self.last_call {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                thread::sleep(self.delay - elapsed);
            }
        }
        self.remaining -= 1;
        self.used += 1;
        self.last_call = Some(Instant::now());
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CommuteKey {
    origin: CandidateCode,
    destination: CandidateCode,
    mode: TravelMode,
}

type CommuteCache = Arc<RwLock<HashMap<CommuteKey, CommuteDetail>>>;

/// Shared between searches; only the cache carries state across calls.
#[derive(Clone)]
pub struct CommuteEstimator {
    model: Arc<ScoringModel>,
    routing: Option<Arc<dyn RoutingService>>,
    cache: CommuteCache,
}

impl CommuteEstimator {
    pub fn new(model: Arc<ScoringModel>, routing: Option<Arc<dyn RoutingService>>) -> Self {
        Self {
            model,
            routing,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn routing_enabled(&self) -> bool {
        self.routing.is_some()
    }

    pub fn cached_entries(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Resolves the commute from `origin` to `workplace`.
    ///
    /// Passing `None` for `external` forbids routing calls for this invocation.
    pub fn resolve(
        &self,
        origin: &Candidate,
        workplace: &Candidate,
        mode: TravelMode,
        external: Option<&mut CallBudget>,
    ) -> CommuteDetail {
        let policy = &self.model.commute;
        if origin.code == workplace.code {
            return CommuteDetail::new(
                Some(0.0),
                0.0,
                policy.same_city_minutes,
                CommuteSource::SameCity,
                mode,
                workplace,
            );
        }

        let key = CommuteKey {
            origin: origin.code.clone(),
            destination: workplace.code.clone(),
            mode,
        };
        let cached = self.cached(&key);

        match (&cached, external) {
            (Some(hit), None) => return hit.clone(),
            (Some(hit), Some(_)) if hit.source == CommuteSource::RoutingService => {
                return hit.clone()
            }
            (_, Some(budget)) => {
                if let Some(routed) = self.route(origin, workplace, mode, budget) {
                    self.store(key, routed.clone());
                    return routed;
                }
            }
            (None, None) => {}
        }

        if let Some(hit) = cached {
            return hit;
        }

        let estimate = self.estimate(origin, workplace, mode);
        self.store(key, estimate.clone());
        estimate
    }

    fn cached(&self, key: &CommuteKey) -> Option<CommuteDetail> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn store(&self, key: CommuteKey, detail: CommuteDetail) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, detail);
    }

    fn route(
        &self,
        origin: &Candidate,
        workplace: &Candidate,
        mode: TravelMode,
        budget: &mut CallBudget,
    ) -> Option<CommuteDetail> {
        let service = self.routing.as_ref()?;
        if origin.name.trim().is_empty() || workplace.name.trim().is_empty() {
            return None;
        }
        if !budget.acquire() {
            debug!(origin = %origin.code, "routing budget exhausted, falling back");
            return None;
        }

        let request = RouteRequest {
            origin: origin.name.clone(),
            destination: workplace.name.clone(),
            mode,
        };
        match service.route(&request) {
            Ok(leg) => {
                let policy = &self.model.commute;
                let factor = match mode {
                    TravelMode::Driving => policy.routed_rush_hour_car,
                    TravelMode::Transit => policy.routed_rush_hour_transit,
                };
                debug!(
                    origin = %origin.code,
                    workplace = %workplace.code,
                    call = budget.used(),
                    "routed commute resolved"
                );
                let straight_line = self
                    .coordinates(origin)
                    .zip(self.coordinates(workplace))
                    .map(|(from, to)| haversine_km(from, to));
                Some(CommuteDetail::new(
                    straight_line,
                    leg.distance_m / 1000.0,
                    leg.duration_s * factor / 60.0,
                    CommuteSource::RoutingService,
                    mode,
                    workplace,
                ))
            }
            Err(error) => {
                warn!(
                    origin = %origin.code,
                    workplace = %workplace.code,
                    %error,
                    "routing lookup failed, falling back"
                );
                None
            }
        }
    }

    fn estimate(
        &self,
        origin: &Candidate,
        workplace: &Candidate,
        mode: TravelMode,
    ) -> CommuteDetail {
        let policy = &self.model.commute;
        match self.coordinates(origin).zip(self.coordinates(workplace)) {
            Some((from, to)) => {
                let straight_line = haversine_km(from, to);
                let road = heuristic::road_distance_km(straight_line);
                let minutes = heuristic::travel_minutes(road, mode) * policy.heuristic_rush_hour;
                CommuteDetail::new(
                    Some(straight_line),
                    road,
                    minutes,
                    CommuteSource::Heuristic,
                    mode,
                    workplace,
                )
            }
            None => {
                warn!(
                    origin = %origin.code,
                    workplace = %workplace.code,
                    "missing coordinates, using default commute estimate"
                );
                let minutes = match mode {
                    TravelMode::Driving => policy.default_minutes_car,
                    TravelMode::Transit => policy.default_minutes_transit,
                };
                CommuteDetail::new(
                    None,
                    policy.default_distance_km,
                    minutes,
                    CommuteSource::DefaultEstimate,
                    mode,
                    workplace,
                )
            }
        }
    }

    fn coordinates(&self, candidate: &Candidate) -> Option<Coordinates> {
        candidate
            .coordinates
            .or_else(|| self.model.major_city(&candidate.name))
    }
}

/// Per-search side table of resolved commutes keyed by candidate code.
#[derive(Debug, Clone, Default)]
pub struct CommuteAnnotations {
    entries: HashMap<CandidateCode, CommuteDetail>,
}

impl CommuteAnnotations {
    pub fn get(&self, code: &CandidateCode) -> Option<&CommuteDetail> {
        self.entries.get(code)
    }

    pub fn insert(&mut self, code: CandidateCode, detail: CommuteDetail) {
        self.entries.insert(code, detail);
    }

    pub fn contains(&self, code: &CandidateCode) -> bool {
        self.entries.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
