use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::EstateSimError;
use crate::profile::{
    AcquisitionCosts, FinancingKind, FinancingParameters, InvestmentProfile, OperatingParameters,
    DEFAULT_LOAN_TERM_YEARS,
};
use crate::simulation::{
    run_batch, summarize_jobs, SimulationJob, Snapshot, StrategyComparison, StrategySummary,
    TimelineEvent,
};
use crate::strategy::{
    CapitalInjectionRule, FirstPropertyType, StrategyConfig, StrategyKind, TrackingFrequency,
};
use crate::strategy::config::RATIO_TOLERANCE;
use crate::types::{with_metadata, ComputationOutput, Money, Period, Rate};
use crate::EstateSimResult;

const DEFAULT_SIMULATION_MONTHS: Period = 120;
const DEFAULT_APPRECIATION_RATE: Rate = dec!(0.06);

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyRequest {
    pub purchase_price: Money,
    pub transfer_duty: Money,
    pub conveyancing_fees: Money,
    pub bond_registration: Money,
    #[serde(default)]
    pub furnishing_cost: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatingRequest {
    pub monthly_rental_income: Money,
    pub vacancy_rate: Rate,
    pub monthly_levies: Money,
    pub property_management_fee_rate: Rate,
    pub monthly_insurance: Money,
    pub monthly_maintenance_reserve: Money,
    #[serde(default)]
    pub monthly_furnishing_repair_costs: Money,
}

/// Named refinance cadences accepted at the boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefinanceFrequency {
    #[default]
    Never,
    Annually,
    /// Twice a year
    BiAnnually,
    Quarterly,
}

impl RefinanceFrequency {
    /// Cadence in years; `None` for `Never`.
    pub fn years(&self) -> Option<Decimal> {
        match self {
            RefinanceFrequency::Never => None,
            RefinanceFrequency::Annually => Some(Decimal::ONE),
            RefinanceFrequency::BiAnnually => Some(dec!(0.5)),
            RefinanceFrequency::Quarterly => Some(dec!(0.25)),
        }
    }
}

/// One strategy as submitted by a caller. `strategy_type` stays a string
/// until [`strategy_kind_from_str`] resolves it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRequest {
    pub name: String,
    pub strategy_type: String,
    #[serde(default = "default_simulation_months")]
    pub simulation_months: Period,
    #[serde(default)]
    pub tracking_frequency: TrackingFrequency,
    #[serde(default = "default_true")]
    pub reinvest_cashflow: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ltv_ratio: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<Rate>,
    #[serde(default = "default_loan_term")]
    pub loan_term_years: Option<u32>,
    #[serde(default = "default_appreciation")]
    pub appreciation_rate: Option<Rate>,

    #[serde(default)]
    pub enable_refinancing: bool,
    #[serde(default)]
    pub refinance_frequency: RefinanceFrequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_refinance_ltv: Option<Rate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leveraged_property_ratio: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cash_property_ratio: Option<Rate>,
    #[serde(default = "default_first_property")]
    pub first_property_type: FirstPropertyType,
}

fn default_simulation_months() -> Period {
    DEFAULT_SIMULATION_MONTHS
}

fn default_true() -> bool {
    true
}

fn default_loan_term() -> Option<u32> {
    Some(DEFAULT_LOAN_TERM_YEARS)
}

fn default_appreciation() -> Option<Rate> {
    Some(DEFAULT_APPRECIATION_RATE)
}

fn default_first_property() -> FirstPropertyType {
    FirstPropertyType::Cash
}

impl StrategyRequest {
    /// A request carrying the same defaults as a deserialized one.
    pub fn new(name: impl Into<String>, strategy_type: impl Into<String>) -> Self {
        StrategyRequest {
            name: name.into(),
            strategy_type: strategy_type.into(),
            simulation_months: DEFAULT_SIMULATION_MONTHS,
            tracking_frequency: TrackingFrequency::Monthly,
            reinvest_cashflow: true,
            ltv_ratio: None,
            interest_rate: None,
            loan_term_years: default_loan_term(),
            appreciation_rate: default_appreciation(),
            enable_refinancing: false,
            refinance_frequency: RefinanceFrequency::Never,
            target_refinance_ltv: None,
            leveraged_property_ratio: None,
            cash_property_ratio: None,
            first_property_type: FirstPropertyType::Cash,
        }
    }
}

/// A batch of strategies to run against one property and capital base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub property: PropertyRequest,
    pub operating: OperatingRequest,
    pub available_capital: Money,
    #[serde(default)]
    pub capital_injections: Vec<CapitalInjectionRule>,
    pub strategies: Vec<StrategyRequest>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyResult {
    pub strategy_name: String,
    pub summary: StrategySummary,
    pub snapshots: Vec<Snapshot>,
    /// Every purchase, refinance and injection in chronological order
    pub events: Vec<TimelineEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResponse {
    pub results: Vec<StrategyResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
}

pub fn health() -> HealthStatus {
    HealthStatus {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
    }
}

// ---------------------------------------------------------------------------
// Translation
// ---------------------------------------------------------------------------

pub fn strategy_kind_from_str(raw: &str) -> EstateSimResult<StrategyKind> {
    match raw {
        "cash_only" => Ok(StrategyKind::CashOnly),
        "leveraged" => Ok(StrategyKind::Leveraged),
        "mixed" => Ok(StrategyKind::Mixed),
        other => Err(EstateSimError::InvalidRequest(format!(
            "Unknown strategy type: {other}"
        ))),
    }
}

/// Sanity-check a request without simulating anything.
pub fn validate_request(request: &SimulationRequest) -> ValidationReport {
    let mut errors: Vec<String> = Vec::new();

    if request.available_capital <= Decimal::ZERO {
        errors.push("Available capital must be greater than 0".into());
    }
    if request.property.purchase_price <= Decimal::ZERO {
        errors.push("Purchase price must be greater than 0".into());
    }
    if request.operating.monthly_rental_income <= Decimal::ZERO {
        errors.push("Monthly rental income must be greater than 0".into());
    }
    if request.strategies.is_empty() {
        errors.push("At least one strategy is required".into());
    }
    for (i, rule) in request.capital_injections.iter().enumerate() {
        if let Err(e) = rule.validate(i) {
            errors.push(e.to_string());
        }
    }

    for strategy in &request.strategies {
        let name = &strategy.name;
        let kind = match strategy_kind_from_str(&strategy.strategy_type) {
            Ok(kind) => kind,
            Err(e) => {
                errors.push(format!("Strategy '{name}': {e}"));
                continue;
            }
        };

        if kind != StrategyKind::CashOnly {
            let ltv_ok = strategy
                .ltv_ratio
                .is_some_and(|ltv| ltv > Decimal::ZERO && ltv < Decimal::ONE);
            if !ltv_ok {
                errors.push(format!(
                    "Strategy '{name}': LTV ratio must be between 0 and 1"
                ));
            }
            if !strategy.interest_rate.is_some_and(|r| r > Decimal::ZERO) {
                errors.push(format!(
                    "Strategy '{name}': Interest rate must be greater than 0"
                ));
            }
        }

        if kind == StrategyKind::Mixed {
            match (strategy.leveraged_property_ratio, strategy.cash_property_ratio) {
                (Some(lev), Some(cash)) => {
                    if (lev + cash - Decimal::ONE).abs() > RATIO_TOLERANCE {
                        errors.push(format!(
                            "Strategy '{name}': Property ratios must sum to 1.0"
                        ));
                    }
                }
                _ => errors.push(format!(
                    "Strategy '{name}': Mixed strategy requires property ratios"
                )),
            }
        }

        if strategy.simulation_months == 0 {
            errors.push(format!(
                "Strategy '{name}': Simulation length must be at least one month"
            ));
        }
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}

fn required(value: Option<Rate>, field: &str, strategy: &str) -> EstateSimResult<Rate> {
    value.ok_or_else(|| {
        EstateSimError::invalid(field, format!("Strategy '{strategy}' requires {field}"))
    })
}

/// Translate one strategy of a request into engine inputs.
pub fn build_inputs(
    request: &SimulationRequest,
    strategy: &StrategyRequest,
) -> EstateSimResult<(InvestmentProfile, StrategyConfig)> {
    let kind = strategy_kind_from_str(&strategy.strategy_type)?;
    let name = strategy.name.as_str();
    let appreciation_rate = strategy
        .appreciation_rate
        .unwrap_or(DEFAULT_APPRECIATION_RATE);

    let financing = match kind {
        StrategyKind::CashOnly => FinancingParameters {
            financing_type: FinancingKind::Cash,
            ltv_ratio: Decimal::ZERO,
            appreciation_rate,
            interest_rate: None,
            loan_term_years: None,
        },
        StrategyKind::Leveraged | StrategyKind::Mixed => FinancingParameters {
            financing_type: FinancingKind::Leveraged,
            ltv_ratio: required(strategy.ltv_ratio, "ltv_ratio", name)?,
            appreciation_rate,
            interest_rate: Some(required(strategy.interest_rate, "interest_rate", name)?),
            loan_term_years: strategy.loan_term_years,
        },
    };

    let p = &request.property;
    let o = &request.operating;
    let profile = InvestmentProfile::new(
        AcquisitionCosts {
            purchase_price: p.purchase_price,
            transfer_duty: p.transfer_duty,
            conveyancing_fees: p.conveyancing_fees,
            bond_registration: p.bond_registration,
            furnishing_cost: p.furnishing_cost,
        },
        financing,
        OperatingParameters {
            monthly_rental_income: o.monthly_rental_income,
            vacancy_rate: o.vacancy_rate,
            monthly_levies: o.monthly_levies,
            property_management_fee_rate: o.property_management_fee_rate,
            monthly_insurance: o.monthly_insurance,
            monthly_maintenance_reserve: o.monthly_maintenance_reserve,
            monthly_furnishing_repair_costs: o.monthly_furnishing_repair_costs,
        },
        request.available_capital,
    )?;

    let horizon = strategy.simulation_months;
    let mut config = match kind {
        StrategyKind::CashOnly => StrategyConfig::cash_only(horizon),
        StrategyKind::Leveraged => {
            StrategyConfig::leveraged(horizon, profile.financing.ltv_ratio)
        }
        StrategyKind::Mixed => StrategyConfig::mixed(
            horizon,
            required(strategy.leveraged_property_ratio, "leveraged_property_ratio", name)?,
            required(strategy.cash_property_ratio, "cash_property_ratio", name)?,
            profile.financing.ltv_ratio,
            strategy.first_property_type,
        )?,
    };

    config = if strategy.enable_refinancing && kind != StrategyKind::CashOnly {
        let years = strategy.refinance_frequency.years().unwrap_or(Decimal::ONE);
        config.with_refinancing(years)
    } else {
        config.without_refinancing()
    };
    if let Some(target) = strategy.target_refinance_ltv {
        config = config.with_refinance_target(target);
    }
    let config = config
        .with_reinvestment(strategy.reinvest_cashflow)
        .with_tracking(strategy.tracking_frequency)
        .with_injections(request.capital_injections.clone());
    config.validate()?;

    Ok((profile, config))
}

/// Validate a request and translate every strategy into a job.
fn prepare_jobs(request: &SimulationRequest) -> EstateSimResult<Vec<SimulationJob>> {
    let report = validate_request(request);
    if !report.valid {
        return Err(EstateSimError::InvalidRequest(format!(
            "Validation failed: {}",
            report.errors.join(", ")
        )));
    }

    let mut jobs = Vec::with_capacity(request.strategies.len());
    for strategy in &request.strategies {
        let (profile, config) = build_inputs(request, strategy)?;
        debug!(strategy = %strategy.name, kind = %config.strategy_type, "prepared strategy");
        jobs.push(SimulationJob {
            name: strategy.name.clone(),
            profile,
            strategy: config,
        });
    }
    Ok(jobs)
}

/// Validate, translate and run every strategy of a request.
pub fn simulate_request(request: &SimulationRequest) -> EstateSimResult<SimulationResponse> {
    let jobs = prepare_jobs(request)?;

    let mut results = Vec::with_capacity(jobs.len());
    for (job, outcome) in jobs.iter().zip(run_batch(&jobs)) {
        let outcome = outcome?;
        results.push(StrategyResult {
            strategy_name: job.name.clone(),
            summary: StrategySummary::from_outcome(&job.name, job.strategy.strategy_type, &outcome),
            snapshots: outcome.snapshots,
            events: outcome.timeline,
        });
    }

    Ok(SimulationResponse { results })
}

/// Summaries only, ranked by final net worth.
pub fn compare_request(
    request: &SimulationRequest,
) -> EstateSimResult<ComputationOutput<StrategyComparison>> {
    let start = Instant::now();
    let jobs = prepare_jobs(request)?;
    let (comparison, warnings) = summarize_jobs(&jobs)?;
    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Side-by-side strategy simulation ranked by final net worth",
        request,
        warnings,
        elapsed,
        comparison,
    ))
}
