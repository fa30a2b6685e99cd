use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Response;
use serde_json::Value;

use crate::search::commute::{RouteLeg, RouteRequest, RoutingError, RoutingService};
use crate::search::domain::{Candidate, CandidateCode, Coordinates, MarketQuote, PopulationBands};
use crate::search::engine::{RoutingLimits, SearchEngine};
use crate::search::model::ScoringModel;
use crate::search::repository::{CandidateRepository, RepositoryError};
use crate::search::service::MunicipalitySearchService;

pub(super) struct Fixture {
    pub code: &'static str,
    pub name: &'static str,
    pub region: &'static str,
    pub coordinates: Option<(f64, f64)>,
    pub population: (u32, u32, u32),
    pub rent: f64,
    pub apartment: f64,
    pub house: f64,
    pub deals: (u32, u32, u32),
    pub ioz: Option<f64>,
}

impl Fixture {
    pub(super) fn build(&self) -> Candidate {
        let mut candidate = Candidate::new(self.code, self.name);
        candidate.region = Some(self.region.to_string());
        candidate.coordinates = self
            .coordinates
            .and_then(|(latitude, longitude)| Coordinates::new(latitude, longitude));
        let (young, working, old) = self.population;
        candidate.population = PopulationBands {
            young: Some(young),
            working: Some(working),
            old: Some(old),
        };
        let (rent_deals, apartment_deals, house_deals) = self.deals;
        candidate.rent = quote(self.rent, rent_deals);
        candidate.apartment_sale = quote(self.apartment, apartment_deals);
        candidate.house_sale = quote(self.house, house_deals);
        candidate.healthcare_ratio = self.ioz;
        candidate
    }
}

fn quote(price: f64, deals: u32) -> MarketQuote {
    MarketQuote {
        price_per_m2: (price > 0.0).then_some(price),
        deals: Some(deals),
    }
}

pub(super) const LJUBLJANA: &str = "061";
pub(super) const MARIBOR: &str = "070";
pub(super) const KRANJ: &str = "052";
pub(super) const KOPER: &str = "050";
pub(super) const CELJE: &str = "011";
pub(super) const DOMZALE: &str = "023";

pub(super) fn municipalities() -> Vec<Candidate> {
    [
        Fixture {
            code: LJUBLJANA,
            name: "Ljubljana",
            region: "Osrednjeslovenska",
            coordinates: Some((46.0569, 14.5058)),
            population: (45_000, 190_000, 60_000),
            rent: 14.0,
            apartment: 3900.0,
            house: 3300.0,
            deals: (1800, 2100, 310),
            ioz: Some(0.87),
        },
        Fixture {
            code: MARIBOR,
            name: "Maribor",
            region: "Podravska",
            coordinates: Some((46.5547, 15.6459)),
            population: (16_000, 70_000, 26_000),
            rent: 9.0,
            apartment: 2100.0,
            house: 1600.0,
            deals: (600, 900, 150),
            ioz: Some(0.80),
        },
        Fixture {
            code: KRANJ,
            name: "Kranj",
            region: "Gorenjska",
            coordinates: Some((46.2428, 14.3555)),
            population: (9_000, 36_000, 11_000),
            rent: 11.0,
            apartment: 2800.0,
            house: 2400.0,
            deals: (250, 300, 80),
            ioz: Some(0.75),
        },
        Fixture {
            code: KOPER,
            name: "Koper",
            region: "Obalno-kraška",
            coordinates: Some((45.5480, 13.7302)),
            population: (8_000, 32_000, 13_000),
            rent: 12.5,
            apartment: 3300.0,
            house: 2900.0,
            deals: (200, 350, 60),
            ioz: Some(0.70),
        },
        Fixture {
            code: CELJE,
            name: "Celje",
            region: "Savinjska",
            coordinates: Some((46.2397, 15.2677)),
            population: (7_000, 30_000, 12_000),
            rent: 8.5,
            apartment: 1900.0,
            house: 1500.0,
            deals: (150, 250, 90),
            ioz: Some(0.72),
        },
        Fixture {
            code: DOMZALE,
            name: "Domžale",
            region: "Osrednjeslovenska",
            coordinates: Some((46.1382, 14.5940)),
            population: (6_500, 24_000, 7_000),
            rent: 10.5,
            apartment: 2600.0,
            house: 2300.0,
            deals: (120, 160, 70),
            ioz: None,
        },
    ]
    .iter()
    .map(Fixture::build)
    .collect()
}

/// A record the estimator cannot place: no coordinates and an unknown name.
pub(super) fn remote_village() -> Candidate {
    let mut candidate = Candidate::new("71", "Osilnica");
    candidate.region = Some("Jugovzhodna".to_string());
    candidate.apartment_sale = MarketQuote {
        price_per_m2: Some(900.0),
        deals: Some(2),
    };
    candidate
}

pub(super) fn find<'a>(candidates: &'a [Candidate], code: &str) -> &'a Candidate {
    let code = CandidateCode::new(code);
    candidates
        .iter()
        .find(|candidate| candidate.code == code)
        .expect("fixture present")
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    pub candidates: Vec<Candidate>,
}

impl MemoryRepository {
    pub(super) fn seeded() -> Self {
        Self {
            candidates: municipalities(),
        }
    }
}

impl CandidateRepository for MemoryRepository {
    fn all(&self) -> Result<Vec<Candidate>, RepositoryError> {
        Ok(self.candidates.clone())
    }

    fn fetch(&self, code: &CandidateCode) -> Result<Option<Candidate>, RepositoryError> {
        Ok(self
            .candidates
            .iter()
            .find(|candidate| &candidate.code == code)
            .cloned())
    }
}

pub(super) struct UnavailableRepository;

impl CandidateRepository for UnavailableRepository {
    fn all(&self) -> Result<Vec<Candidate>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".into()))
    }

    fn fetch(&self, _code: &CandidateCode) -> Result<Option<Candidate>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".into()))
    }
}

/// Routing double answering every lookup with the same leg and counting calls.
pub(super) struct StubRouting {
    leg: Option<RouteLeg>,
    calls: AtomicU32,
}

impl StubRouting {
    pub(super) fn answering(distance_m: f64, duration_s: f64) -> Arc<Self> {
        Arc::new(Self {
            leg: Some(RouteLeg {
                distance_m,
                duration_s,
            }),
            calls: AtomicU32::new(0),
        })
    }

    pub(super) fn failing() -> Arc<Self> {
        Arc::new(Self {
            leg: None,
            calls: AtomicU32::new(0),
        })
    }

    pub(super) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RoutingService for StubRouting {
    fn route(&self, _request: &RouteRequest) -> Result<RouteLeg, RoutingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.leg
            .ok_or_else(|| RoutingError::Status("ZERO_RESULTS".to_string()))
    }
}

pub(super) fn routed_engine(routing: Arc<StubRouting>, calls_per_search: u32) -> SearchEngine {
    SearchEngine::with_routing(
        ScoringModel::default(),
        routing,
        RoutingLimits {
            calls_per_search,
            call_delay: std::time::Duration::ZERO,
        },
    )
}

pub(super) fn build_service() -> Arc<MunicipalitySearchService<MemoryRepository>> {
    Arc::new(MunicipalitySearchService::new(
        Arc::new(MemoryRepository::seeded()),
        SearchEngine::new(ScoringModel::default()),
    ))
}

pub(super) async fn json_body(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let value = serde_json::from_slice(&bytes).expect("json body");
    (status, value)
}
