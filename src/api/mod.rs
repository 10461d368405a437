use std::collections::HashSet;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Args, Parser, ValueEnum, error::ErrorKind};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::info;

use crate::core::{
    DEFAULT_SAFETY_HORIZON_MONTHS, Debt, LabeledPlan, MonthEntry, PlanComparison, PlanConfig,
    PlanResult, Strategy, compare_plans, compute, monthly_rate_from_apr,
};

const MAX_CONSOLIDATION_TERM: u32 = 360;
const MAX_SAFETY_HORIZON: u32 = 1_200;
const MIN_COMPARED_PLANS: usize = 2;
const MAX_COMPARED_PLANS: usize = 4;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliStrategy {
    Snowball,
    Avalanche,
    Consolidation,
}

impl From<CliStrategy> for Strategy {
    fn from(value: CliStrategy) -> Self {
        match value {
            CliStrategy::Snowball => Strategy::Snowball,
            CliStrategy::Avalanche => Strategy::Avalanche,
            CliStrategy::Consolidation => Strategy::Consolidation,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiStrategy {
    #[serde(alias = "Snowball", alias = "debt-snowball")]
    Snowball,
    #[serde(alias = "Avalanche", alias = "debt-avalanche")]
    Avalanche,
    #[serde(alias = "Consolidation", alias = "debt-consolidation")]
    Consolidation,
}

impl From<ApiStrategy> for CliStrategy {
    fn from(value: ApiStrategy) -> Self {
        match value {
            ApiStrategy::Snowball => CliStrategy::Snowball,
            ApiStrategy::Avalanche => CliStrategy::Avalanche,
            ApiStrategy::Consolidation => CliStrategy::Consolidation,
        }
    }
}

/// A debt as submitted by a caller, with the rate as APR percent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebtInput {
    id: Option<String>,
    name: Option<String>,
    balance: f64,
    #[serde(alias = "interestRate", alias = "interest_rate")]
    apr: f64,
    #[serde(alias = "minimum_payment", alias = "minPayment")]
    minimum_payment: f64,
}

#[derive(Debug, Clone, Args)]
struct PlanArgs {
    #[arg(long, value_enum, default_value_t = CliStrategy::Snowball)]
    strategy: CliStrategy,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Extra amount paid every month on top of the summed minimums"
    )]
    extra_payment: f64,
    #[arg(
        long,
        help = "Consolidated loan APR in percent, e.g. 7.5 (consolidation only)"
    )]
    consolidation_rate: Option<f64>,
    #[arg(long, help = "Consolidated loan term in months (consolidation only)")]
    consolidation_term: Option<u32>,
    #[arg(
        long,
        default_value_t = DEFAULT_SAFETY_HORIZON_MONTHS,
        help = "Maximum number of simulated months"
    )]
    safety_horizon: u32,
}

#[derive(Parser, Debug)]
#[command(
    name = "debtplan",
    about = "Debt payoff planner (snowball, avalanche and consolidation schedules)"
)]
struct Cli {
    #[arg(long, help = "JSON file with an array of debts")]
    debts: PathBuf,
    #[arg(long, help = "Only print the first N months of the schedule")]
    preview: Option<usize>,
    #[command(flatten)]
    plan: PlanArgs,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlanOptionsPayload {
    label: Option<String>,
    #[serde(alias = "method")]
    strategy: Option<ApiStrategy>,
    #[serde(alias = "extra_payment")]
    extra_payment: Option<f64>,
    #[serde(alias = "consolidation_rate")]
    consolidation_rate: Option<f64>,
    #[serde(alias = "consolidation_term")]
    consolidation_term: Option<u32>,
    #[serde(alias = "safety_horizon")]
    safety_horizon: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlanPayload {
    debts: Vec<DebtInput>,
    preview: Option<usize>,
    #[serde(flatten)]
    options: PlanOptionsPayload,
}

/// Query-string form of [`PlanPayload`]; `debts` carries the JSON-encoded debt array.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlanQuery {
    debts: Option<String>,
    preview: Option<usize>,
    label: Option<String>,
    #[serde(alias = "method")]
    strategy: Option<ApiStrategy>,
    #[serde(alias = "extra_payment")]
    extra_payment: Option<f64>,
    #[serde(alias = "consolidation_rate")]
    consolidation_rate: Option<f64>,
    #[serde(alias = "consolidation_term")]
    consolidation_term: Option<u32>,
    #[serde(alias = "safety_horizon")]
    safety_horizon: Option<u32>,
}

impl TryFrom<PlanQuery> for PlanPayload {
    type Error = String;

    fn try_from(query: PlanQuery) -> Result<Self, Self::Error> {
        let debts = match query.debts.as_deref() {
            Some(raw) => serde_json::from_str::<Vec<DebtInput>>(raw)
                .map_err(|e| format!("debts must be a JSON array: {e}"))?,
            None => Vec::new(),
        };
        Ok(PlanPayload {
            debts,
            preview: query.preview,
            options: PlanOptionsPayload {
                label: query.label,
                strategy: query.strategy,
                extra_payment: query.extra_payment,
                consolidation_rate: query.consolidation_rate,
                consolidation_term: query.consolidation_term,
                safety_horizon: query.safety_horizon,
            },
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ComparePayload {
    debts: Vec<DebtInput>,
    plans: Vec<PlanOptionsPayload>,
}

#[derive(Debug)]
struct PlanRequest {
    debts: Vec<Debt>,
    config: PlanConfig,
    preview: Option<usize>,
}

#[derive(Debug)]
struct CompareRequest {
    debts: Vec<Debt>,
    plans: Vec<(String, PlanConfig)>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanResponse {
    feasible: bool,
    warning: Option<String>,
    plan: PlanResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareResponse {
    comparison: PlanComparison,
    plans: Vec<PlanResult>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn default_plan_args() -> PlanArgs {
    PlanArgs {
        strategy: CliStrategy::Snowball,
        extra_payment: 0.0,
        consolidation_rate: None,
        consolidation_term: None,
        safety_horizon: DEFAULT_SAFETY_HORIZON_MONTHS,
    }
}

fn build_config(args: &PlanArgs) -> Result<PlanConfig, String> {
    if !args.extra_payment.is_finite() || args.extra_payment < 0.0 {
        return Err("--extra-payment must be >= 0".to_string());
    }

    if args.safety_horizon == 0 || args.safety_horizon > MAX_SAFETY_HORIZON {
        return Err(format!(
            "--safety-horizon must be between 1 and {MAX_SAFETY_HORIZON}"
        ));
    }

    let strategy: Strategy = args.strategy.into();
    let config = match strategy {
        Strategy::Snowball => PlanConfig::snowball(args.extra_payment),
        Strategy::Avalanche => PlanConfig::avalanche(args.extra_payment),
        Strategy::Consolidation => {
            let Some(rate) = args.consolidation_rate else {
                return Err(
                    "--consolidation-rate is required when --strategy is consolidation"
                        .to_string(),
                );
            };
            if !rate.is_finite() || !(0.0..=100.0).contains(&rate) {
                return Err("--consolidation-rate must be between 0 and 100".to_string());
            }

            let Some(term) = args.consolidation_term else {
                return Err(
                    "--consolidation-term is required when --strategy is consolidation"
                        .to_string(),
                );
            };
            if !(1..=MAX_CONSOLIDATION_TERM).contains(&term) {
                return Err(format!(
                    "--consolidation-term must be between 1 and {MAX_CONSOLIDATION_TERM}"
                ));
            }

            PlanConfig::consolidation(args.extra_payment, monthly_rate_from_apr(rate), term)
        }
    };

    Ok(config.with_safety_horizon(args.safety_horizon))
}

fn build_debts(inputs: Vec<DebtInput>) -> Result<Vec<Debt>, String> {
    let mut seen = HashSet::new();
    let mut debts = Vec::with_capacity(inputs.len());

    for (idx, input) in inputs.into_iter().enumerate() {
        let id = input.id.unwrap_or_else(|| format!("debt-{}", idx + 1));
        if !seen.insert(id.clone()) {
            return Err(format!("debt id {id:?} appears more than once"));
        }
        if !input.balance.is_finite() || input.balance < 0.01 {
            return Err(format!("debt {id:?}: balance must be >= 0.01"));
        }
        if !input.apr.is_finite() || !(0.0..=100.0).contains(&input.apr) {
            return Err(format!("debt {id:?}: apr must be between 0 and 100"));
        }
        if !input.minimum_payment.is_finite() || input.minimum_payment < 0.01 {
            return Err(format!("debt {id:?}: minimumPayment must be >= 0.01"));
        }

        let name = input.name.unwrap_or_else(|| id.clone());
        debts.push(Debt::from_apr(
            id,
            name,
            input.balance,
            input.apr,
            input.minimum_payment,
        ));
    }

    Ok(debts)
}

fn apply_options(args: &mut PlanArgs, options: &PlanOptionsPayload) {
    if let Some(v) = options.strategy {
        args.strategy = v.into();
    }
    if let Some(v) = options.extra_payment {
        args.extra_payment = v;
    }
    if let Some(v) = options.consolidation_rate {
        args.consolidation_rate = Some(v);
    }
    if let Some(v) = options.consolidation_term {
        args.consolidation_term = Some(v);
    }
    if let Some(v) = options.safety_horizon {
        args.safety_horizon = v;
    }
}

fn plan_request_from_payload(payload: PlanPayload) -> Result<PlanRequest, String> {
    let mut args = default_plan_args();
    apply_options(&mut args, &payload.options);
    let config = build_config(&args)?;
    let debts = build_debts(payload.debts)?;
    Ok(PlanRequest {
        debts,
        config,
        preview: payload.preview,
    })
}

fn compare_request_from_payload(payload: ComparePayload) -> Result<CompareRequest, String> {
    let count = payload.plans.len();
    if !(MIN_COMPARED_PLANS..=MAX_COMPARED_PLANS).contains(&count) {
        return Err(format!(
            "plans must list between {MIN_COMPARED_PLANS} and {MAX_COMPARED_PLANS} configurations, got {count}"
        ));
    }

    let mut plans = Vec::with_capacity(count);
    for (idx, options) in payload.plans.iter().enumerate() {
        let mut args = default_plan_args();
        apply_options(&mut args, options);
        let config = build_config(&args).map_err(|e| format!("plans[{idx}]: {e}"))?;
        let label = options
            .label
            .clone()
            .unwrap_or_else(|| format!("{}-{}", config.strategy.as_str(), idx + 1));
        plans.push((label, config));
    }

    let debts = build_debts(payload.debts)?;
    Ok(CompareRequest { debts, plans })
}

#[cfg(test)]
fn plan_request_from_json(json: &str) -> Result<PlanRequest, String> {
    let payload = serde_json::from_str::<PlanPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    plan_request_from_payload(payload)
}

fn run_plan(request: &PlanRequest) -> Result<PlanResponse, String> {
    info!(
        strategy = request.config.strategy.as_str(),
        debts = request.debts.len(),
        extra_payment = request.config.extra_payment,
        "computing plan"
    );
    let mut plan = compute(&request.debts, &request.config).map_err(|e| e.to_string())?;
    if let Some(months) = request.preview {
        plan.schedule = preview_schedule(&plan, months);
    }

    let warning = (!plan.converged).then(|| {
        format!(
            "debts are not paid off within {} months; the payoff date is not reachable",
            request.config.safety_horizon_months
        )
    });

    Ok(PlanResponse {
        feasible: plan.converged,
        warning,
        plan,
    })
}

fn preview_schedule(plan: &PlanResult, months: usize) -> Vec<MonthEntry> {
    plan.preview(months).to_vec()
}

fn run_compare(request: &CompareRequest) -> Result<CompareResponse, String> {
    info!(
        debts = request.debts.len(),
        plans = request.plans.len(),
        "comparing plans"
    );
    let plans = request
        .plans
        .iter()
        .map(|(_, config)| compute(&request.debts, config).map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?;

    let labeled = request
        .plans
        .iter()
        .zip(&plans)
        .map(|((label, _), plan)| LabeledPlan {
            label: label.as_str(),
            plan,
        })
        .collect::<Vec<_>>();
    let comparison =
        compare_plans(&labeled).ok_or_else(|| "nothing to compare".to_string())?;

    Ok(CompareResponse { comparison, plans })
}

/// Runs the `plan` command line and returns the pretty-printed JSON response, or the
/// rendered help text for `--help`.
pub fn run_cli<I, T>(args: I) -> Result<String, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            return Ok(e.to_string());
        }
        Err(e) => return Err(e.to_string()),
    };

    let raw = fs::read_to_string(&cli.debts)
        .map_err(|e| format!("failed to read {}: {e}", cli.debts.display()))?;
    let inputs = serde_json::from_str::<Vec<DebtInput>>(&raw)
        .map_err(|e| format!("invalid debts file {}: {e}", cli.debts.display()))?;

    let request = PlanRequest {
        debts: build_debts(inputs)?,
        config: build_config(&cli.plan)?,
        preview: cli.preview,
    };
    let response = run_plan(&request)?;
    serde_json::to_string_pretty(&response).map_err(|e| e.to_string())
}

fn router() -> Router {
    Router::new()
        .route("/api/plan", get(plan_get_handler).post(plan_post_handler))
        .route("/api/compare", post(compare_handler))
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("debt plan HTTP API listening on http://{addr}");

    axum::serve(listener, router()).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn plan_get_handler(Query(query): Query<PlanQuery>) -> Response {
    match PlanPayload::try_from(query) {
        Ok(payload) => plan_handler_impl(payload).await,
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn plan_post_handler(Json(payload): Json<PlanPayload>) -> Response {
    plan_handler_impl(payload).await
}

async fn plan_handler_impl(payload: PlanPayload) -> Response {
    let request = match plan_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match run_plan(&request) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn compare_handler(Json(payload): Json<ComparePayload>) -> Response {
    let request = match compare_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match run_compare(&request) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_debts_json() -> &'static str {
        r#"[
          {"id": "car", "name": "Car loan", "balance": 1000, "apr": 6, "minimumPayment": 50},
          {"id": "card", "name": "Credit card", "balance": 6000, "apr": 24, "minimumPayment": 180},
          {"id": "personal", "balance": 3000, "interestRate": 12, "minimum_payment": 90}
        ]"#
    }

    async fn post_json(uri: &str, body: String) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .expect("valid request");
        send(request).await
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .expect("valid request");
        send(request).await
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router().oneshot(request).await.expect("router responds");
        let status = response.status();
        assert_eq!(
            response
                .headers()
                .get(header::CACHE_CONTROL)
                .map(|v| v.to_str().unwrap_or_default()),
            Some("no-store")
        );
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let value = serde_json::from_slice(&bytes).expect("json body");
        (status, value)
    }

    #[test]
    fn plan_request_parses_web_keys_and_aliases() {
        let json = format!(
            r#"{{
              "method": "avalanche",
              "extraPayment": 150,
              "safetyHorizon": 360,
              "debts": {}
            }}"#,
            sample_debts_json()
        );
        let request = plan_request_from_json(&json).expect("json should parse");

        assert_eq!(request.config.strategy, Strategy::Avalanche);
        assert_approx(request.config.extra_payment, 150.0);
        assert_eq!(request.config.safety_horizon_months, 360);
        assert_eq!(request.debts.len(), 3);
        assert_eq!(request.debts[2].name, "personal");
        assert_approx(request.debts[1].monthly_rate, 0.02);
        assert_approx(request.debts[2].minimum_payment, 90.0);
    }

    #[test]
    fn plan_request_converts_consolidation_apr_to_monthly_rate() {
        let json = r#"{
          "strategy": "consolidation",
          "consolidationRate": 12,
          "consolidationTerm": 48,
          "debts": [{"balance": 500, "apr": 20, "minimumPayment": 25}]
        }"#;
        let request = plan_request_from_json(json).expect("json should parse");

        assert_eq!(request.config.strategy, Strategy::Consolidation);
        assert_approx(request.config.consolidation_rate.unwrap_or_default(), 0.01);
        assert_eq!(request.config.consolidation_term, Some(48));
        assert_eq!(request.debts[0].id, "debt-1");
    }

    #[test]
    fn build_config_requires_consolidation_rate_and_term() {
        let mut args = default_plan_args();
        args.strategy = CliStrategy::Consolidation;
        let err = build_config(&args).expect_err("must require rate");
        assert!(err.contains("--consolidation-rate"));

        args.consolidation_rate = Some(8.0);
        let err = build_config(&args).expect_err("must require term");
        assert!(err.contains("--consolidation-term"));

        args.consolidation_term = Some(361);
        let err = build_config(&args).expect_err("must cap term");
        assert!(err.contains("between 1 and 360"));

        args.consolidation_term = Some(0);
        assert!(build_config(&args).is_err());

        args.consolidation_term = Some(60);
        args.consolidation_rate = Some(120.0);
        let err = build_config(&args).expect_err("must cap rate");
        assert!(err.contains("--consolidation-rate must be between 0 and 100"));
    }

    #[test]
    fn build_config_rejects_negative_extra_payment_and_bad_horizon() {
        let mut args = default_plan_args();
        args.extra_payment = -5.0;
        let err = build_config(&args).expect_err("must reject negative extra");
        assert!(err.contains("--extra-payment"));

        let mut args = default_plan_args();
        args.safety_horizon = 0;
        let err = build_config(&args).expect_err("must reject zero horizon");
        assert!(err.contains("--safety-horizon"));
    }

    #[test]
    fn build_debts_rejects_invalid_records() {
        let json = r#"{"debts": [{"id": "a", "balance": 0, "apr": 5, "minimumPayment": 10}]}"#;
        let err = plan_request_from_json(json).expect_err("must reject zero balance");
        assert!(err.contains("balance"));

        let json = r#"{"debts": [{"id": "a", "balance": 100, "apr": 150, "minimumPayment": 10}]}"#;
        let err = plan_request_from_json(json).expect_err("must reject apr above 100");
        assert!(err.contains("apr"));

        let json = r#"{"debts": [{"id": "a", "balance": 100, "apr": 5, "minimumPayment": 0}]}"#;
        let err = plan_request_from_json(json).expect_err("must reject zero minimum");
        assert!(err.contains("minimumPayment"));

        let json = r#"{"debts": [
          {"id": "a", "balance": 100, "apr": 5, "minimumPayment": 10},
          {"id": "a", "balance": 200, "apr": 5, "minimumPayment": 10}
        ]}"#;
        let err = plan_request_from_json(json).expect_err("must reject duplicate ids");
        assert!(err.contains("more than once"));
    }

    #[test]
    fn run_plan_flags_unreachable_payoff() {
        let json = r#"{
          "safetyHorizon": 120,
          "debts": [{"id": "a", "balance": 10000, "apr": 24, "minimumPayment": 150}]
        }"#;
        let request = plan_request_from_json(json).expect("json should parse");
        let response = run_plan(&request).expect("plan runs");

        assert!(!response.feasible);
        assert!(response.warning.is_some());
        assert_eq!(response.plan.payoff_months, 120);
    }

    #[test]
    fn run_plan_truncates_schedule_to_preview() {
        let json = format!(
            r#"{{"preview": 3, "extraPayment": 100, "debts": {}}}"#,
            sample_debts_json()
        );
        let request = plan_request_from_json(&json).expect("json should parse");
        let response = run_plan(&request).expect("plan runs");

        assert!(response.feasible);
        assert!(response.warning.is_none());
        assert_eq!(response.plan.schedule.len(), 3);
        assert!(response.plan.payoff_months > 3);
    }

    #[test]
    fn compare_request_enforces_plan_count() {
        let json = format!(
            r#"{{"plans": [{{"strategy": "snowball"}}], "debts": {}}}"#,
            sample_debts_json()
        );
        let payload = serde_json::from_str::<ComparePayload>(&json).expect("json parses");
        let err = compare_request_from_payload(payload).expect_err("one plan is not enough");
        assert!(err.contains("between 2 and 4"));
    }

    #[test]
    fn compare_request_prefixes_plan_errors_with_index() {
        let json = format!(
            r#"{{"plans": [{{"strategy": "snowball"}}, {{"strategy": "consolidation"}}], "debts": {}}}"#,
            sample_debts_json()
        );
        let payload = serde_json::from_str::<ComparePayload>(&json).expect("json parses");
        let err = compare_request_from_payload(payload).expect_err("missing consolidation rate");
        assert!(err.starts_with("plans[1]:"));
    }

    #[test]
    fn cli_reads_debt_file_and_prints_plan() {
        let path = std::env::temp_dir().join(format!("debtplan-cli-{}.json", std::process::id()));
        fs::write(&path, sample_debts_json()).expect("write debts file");

        let output = run_cli([
            "debtplan",
            "--debts",
            path.to_str().expect("utf-8 path"),
            "--strategy",
            "avalanche",
            "--extra-payment",
            "150",
        ])
        .expect("cli runs");
        let _ = fs::remove_file(&path);

        let value: serde_json::Value = serde_json::from_str(&output).expect("json output");
        assert_eq!(value["plan"]["strategy"], "avalanche");
        assert_eq!(value["plan"]["payoffMonths"], 27);
        assert_eq!(value["feasible"], true);
    }

    #[test]
    fn cli_help_is_returned_instead_of_exiting() {
        let output = run_cli(["debtplan", "--help"]).expect("help renders");
        assert!(output.contains("--debts"));
        assert!(output.contains("--consolidation-term"));
    }

    #[test]
    fn cli_reports_missing_debt_file() {
        let err = run_cli(["debtplan", "--debts", "/nonexistent/debts.json"])
            .expect_err("missing file");
        assert!(err.contains("failed to read"));
    }

    #[tokio::test]
    async fn plan_endpoint_returns_schedule() {
        let body = format!(
            r#"{{"strategy": "snowball", "extraPayment": 150, "debts": {}}}"#,
            sample_debts_json()
        );
        let (status, value) = post_json("/api/plan", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["plan"]["payoffMonths"], 30);
        assert_eq!(value["plan"]["monthlyPayment"], 470.0);
        assert_eq!(value["plan"]["summary"]["kind"], "payoff");
        assert_eq!(value["plan"]["schedule"][0]["debts"][0]["debtId"], "car");
    }

    #[tokio::test]
    async fn plan_endpoint_accepts_query_string() {
        // debts=[{"id":"a","balance":1000,"apr":0,"minimumPayment":200}]
        let uri = "/api/plan?strategy=avalanche&extraPayment=0&preview=2&debts=\
            %5B%7B%22id%22%3A%22a%22%2C%22balance%22%3A1000%2C%22apr%22%3A0%2C\
            %22minimumPayment%22%3A200%7D%5D";
        let (status, value) = get_json(uri).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["plan"]["strategy"], "avalanche");
        assert_eq!(value["plan"]["payoffMonths"], 5);
        assert_eq!(value["plan"]["schedule"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["feasible"], true);
    }

    #[tokio::test]
    async fn plan_query_with_malformed_debts_is_bad_request() {
        let (status, value) = get_json("/api/plan?debts=not-json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error = value["error"].as_str().unwrap_or_default();
        assert!(error.contains("debts must be a JSON array"));
    }

    #[tokio::test]
    async fn plan_endpoint_rejects_invalid_configuration() {
        let body = format!(
            r#"{{"strategy": "consolidation", "debts": {}}}"#,
            sample_debts_json()
        );
        let (status, value) = post_json("/api/plan", body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error = value["error"].as_str().unwrap_or_default();
        assert!(error.contains("--consolidation-rate"));
    }

    #[tokio::test]
    async fn compare_endpoint_ranks_plans() {
        let body = format!(
            r#"{{
              "plans": [
                {{"label": "small-first", "strategy": "snowball", "extraPayment": 150}},
                {{"label": "rate-first", "strategy": "avalanche", "extraPayment": 150}},
                {{"label": "merged", "strategy": "consolidation", "consolidationRate": 7, "consolidationTerm": 60}}
              ],
              "debts": {}
            }}"#,
            sample_debts_json()
        );
        let (status, value) = post_json("/api/compare", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["comparison"]["fastestPayoff"], "rate-first");
        assert_eq!(value["comparison"]["lowestPayment"], "merged");
        assert_eq!(value["plans"].as_array().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let (status, value) = post_json("/api/missing", "{}".to_string()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(value["error"], "Not found");
    }
}
