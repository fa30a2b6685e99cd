use crate::infra::{load_candidates, sample_candidates};
use clap::Args;
use muni_rank::config::AppConfig;
use muni_rank::error::AppError;
use muni_rank::search::{
    Category, ScoredResult, ScoringModel, SearchCriteria, SearchEngine, SearchOutcome,
    SearchRequest,
};
use muni_rank::telemetry;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct SearchArgs {
    /// Search type: rent or purchase
    #[arg(long, default_value = "rent")]
    pub(crate) mode: String,
    /// Desired floor area in m²
    #[arg(long)]
    pub(crate) area: Option<f64>,
    /// Monthly rent or total purchase budget, depending on the mode
    #[arg(long)]
    pub(crate) budget: Option<f64>,
    /// Property type for purchases: apartment or house
    #[arg(long)]
    pub(crate) property_type: Option<String>,
    /// Municipality code of the workplace
    #[arg(long)]
    pub(crate) workplace: Option<String>,
    /// Maximum one-way commute in minutes
    #[arg(long)]
    pub(crate) max_commute: Option<f64>,
    /// Commute by car instead of public transport
    #[arg(long)]
    pub(crate) car: bool,
    /// Minimum total population
    #[arg(long)]
    pub(crate) min_population: Option<f64>,
    /// Allowed region (repeatable)
    #[arg(long = "region")]
    pub(crate) regions: Vec<String>,
    /// Life stage: student, young_professional, young_family, established_family, retiree
    #[arg(long)]
    pub(crate) life_stage: Option<String>,
    /// Category weight as CATEGORY=WEIGHT (repeatable)
    #[arg(long = "weight", value_parser = parse_pair)]
    pub(crate) weights: Vec<(String, f64)>,
    /// Minimum category score as CATEGORY=SCORE (repeatable)
    #[arg(long = "min-score", value_parser = parse_pair)]
    pub(crate) min_scores: Vec<(String, f64)>,
    /// Number of results to print
    #[arg(long)]
    pub(crate) limit: Option<usize>,
    /// Municipality CSV to search instead of the configured or bundled table
    #[arg(long)]
    pub(crate) candidates_csv: Option<PathBuf>,
    /// Print the full outcome as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Show per-category scores for every result
    #[arg(long)]
    pub(crate) detailed: bool,
}

pub(crate) fn run_search(args: SearchArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(path) = args.candidates_csv.clone() {
        config.dataset.candidates_csv = Some(path);
    }
    telemetry::init(&config.telemetry)?;

    let candidates = load_candidates(&config.dataset)?;
    let engine = SearchEngine::from_config(ScoringModel::default(), &config.routing);
    let criteria = SearchCriteria::from_request(&search_request(&args));

    // The routing client blocks; keep it off the async workers.
    let outcome =
        tokio::task::block_in_place(|| engine.search_and_rank(&candidates, &criteria));

    if args.json {
        match serde_json::to_string_pretty(&outcome) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => eprintln!("failed to render outcome as JSON: {err}"),
        }
    } else {
        render_outcome(&outcome, true);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let candidates = sample_candidates()?;
    let engine = SearchEngine::new(ScoringModel::default());

    println!("Municipality search demo ({} municipalities)", candidates.len());
    for (title, request) in demo_scenarios() {
        println!("\n== {title}");
        let criteria = SearchCriteria::from_request(&request);
        let outcome = engine.search_and_rank(&candidates, &criteria);
        render_outcome(&outcome, args.detailed);
    }
    Ok(())
}

fn demo_scenarios() -> Vec<(&'static str, SearchRequest)> {
    let scenarios = [
        (
            "Young professional renting 50 m² near a Ljubljana office",
            json!({
                "search_type": "rent",
                "desired_m2": 50,
                "max_monthly_rent": 750,
                "workplace_city_code": "061",
                "max_commute_minutes": 45,
                "life_stage": "young_professional",
                "limit": 5
            }),
        ),
        (
            "Family buying a house in Gorenjska or Osrednjeslovenska",
            json!({
                "search_type": "purchase",
                "property_type": "house",
                "desired_m2": 120,
                "max_purchase_price": 320000,
                "regions": ["gorenjska", "osrednjeslovenska"],
                "life_stage": "young_family",
                "has_car": true,
                "limit": 5
            }),
        ),
        (
            "Retiree with strict healthcare expectations",
            json!({
                "life_stage": "retiree",
                "min_scores": {"healthcare": 80, "market_activity": 60},
                "limit": 5
            }),
        ),
        (
            "Over-constrained search",
            json!({
                "search_type": "purchase",
                "property_type": "house",
                "desired_m2": 90,
                "max_purchase_price": 60000,
                "workplace_city_code": "070",
                "max_commute_minutes": 10
            }),
        ),
    ];

    scenarios
        .into_iter()
        .filter_map(|(title, value)| {
            serde_json::from_value::<SearchRequest>(value)
                .ok()
                .map(|request| (title, request))
        })
        .collect()
}

pub(crate) fn search_request(args: &SearchArgs) -> SearchRequest {
    let pairs = |entries: &[(String, f64)]| -> BTreeMap<String, Value> {
        entries
            .iter()
            .map(|(name, value)| (name.clone(), json!(value)))
            .collect()
    };
    let budget = args.budget.map(|budget| json!(budget));
    let purchase = args.mode.trim().eq_ignore_ascii_case("purchase");

    SearchRequest {
        search_type: Some(args.mode.clone()),
        desired_m2: args.area.map(|area| json!(area)),
        max_monthly_rent: if purchase { None } else { budget.clone() },
        max_purchase_price: if purchase { budget } else { None },
        property_type: args.property_type.clone(),
        workplace_city_code: args.workplace.clone().map(Value::String),
        max_commute_minutes: args.max_commute.map(|minutes| json!(minutes)),
        has_car: Some(args.car),
        min_population: args.min_population.map(|floor| json!(floor)),
        regions: (!args.regions.is_empty()).then(|| args.regions.clone()),
        life_stage: args.life_stage.clone(),
        weights: pairs(&args.weights),
        min_scores: pairs(&args.min_scores),
        limit: args.limit.map(|limit| json!(limit)),
    }
}

pub(crate) fn parse_pair(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected CATEGORY=VALUE, got '{raw}'"))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("invalid number in '{raw}' ({err})"))?;
    Ok((name.trim().to_string(), value))
}

fn render_outcome(outcome: &SearchOutcome, detailed: bool) {
    let diagnostics = &outcome.diagnostics;
    println!(
        "{} candidates | {} passed filters | {} ranked | {} shown | generated {}",
        diagnostics.input_count,
        diagnostics.filtered_count,
        diagnostics.ranked_count,
        diagnostics.returned_count,
        diagnostics
            .generated_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(workplace) = &diagnostics.workplace {
        println!(
            "Workplace: {} ({}) | {} routed lookups",
            workplace.name, workplace.code, diagnostics.external_calls
        );
    }

    if outcome.results.is_empty() {
        println!("No municipalities matched.");
        for suggestion in &outcome.suggestions {
            println!("  - {suggestion}");
        }
        return;
    }

    for result in &outcome.results {
        render_result(result, detailed);
    }
}

fn render_result(result: &ScoredResult, detailed: bool) {
    let commute = result
        .commute
        .as_ref()
        .map(|detail| format!(" | {:.0} min commute", detail.one_way_minutes))
        .unwrap_or_default();
    println!(
        "{:>3}. {:<16} {:>6.2}  {:<9}{}",
        result.ranking.rank,
        result.candidate.name,
        result.final_score,
        result.ranking.tier.as_str(),
        commute
    );

    if detailed {
        let breakdown: Vec<String> = Category::ordered()
            .into_iter()
            .map(|category| match result.scores.get(category) {
                Some(score) => format!("{} {:.0}", category.label(), score),
                None => format!("{} n/a", category.label()),
            })
            .collect();
        println!("     {}", breakdown.join(" | "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pair_accepts_category_assignments() {
        assert_eq!(
            parse_pair("affordability=40").expect("valid pair"),
            ("affordability".to_string(), 40.0)
        );
        assert!(parse_pair("affordability").is_err());
        assert!(parse_pair("commute=fast").is_err());
    }

    #[test]
    fn search_args_route_budget_by_mode() {
        let args = SearchArgs {
            mode: "purchase".to_string(),
            budget: Some(250_000.0),
            weights: vec![("commute".to_string(), 35.0)],
            ..SearchArgs::default()
        };
        let criteria = SearchCriteria::from_request(&search_request(&args));
        assert_eq!(criteria.budget, Some(250_000.0));
        assert_eq!(criteria.weight_overrides.get(&Category::Commute), Some(&35.0));

        let request = search_request(&args);
        assert!(request.max_monthly_rent.is_none());
    }

    #[test]
    fn demo_scenarios_all_parse() {
        assert_eq!(demo_scenarios().len(), 4);
    }

    #[test]
    fn over_constrained_demo_produces_suggestions() {
        let candidates = sample_candidates().expect("sample table parses");
        let engine = SearchEngine::new(ScoringModel::default());
        let (_, request) = demo_scenarios().pop().expect("scenario");

        let outcome = engine.search_and_rank(&candidates, &SearchCriteria::from_request(&request));
        assert!(outcome.results.is_empty());
        assert!(!outcome.suggestions.is_empty());
    }
}
