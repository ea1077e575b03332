use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

#[cfg(feature = "parallel")]
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use super::engine::{simulate, SimulationOutcome};
use super::snapshot::PortfolioSummary;
use crate::profile::InvestmentProfile;
use crate::strategy::{StrategyConfig, StrategyKind};
use crate::types::{with_metadata, ComputationOutput, Period};
use crate::EstateSimResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A strategy with a display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedStrategy {
    pub name: String,
    pub strategy: StrategyConfig,
}

impl NamedStrategy {
    pub fn new(name: impl Into<String>, strategy: StrategyConfig) -> Self {
        NamedStrategy {
            name: name.into(),
            strategy,
        }
    }
}

/// One independent run. Jobs share nothing and may execute in any order.
#[derive(Debug, Clone)]
pub struct SimulationJob {
    pub name: String,
    pub profile: InvestmentProfile,
    pub strategy: StrategyConfig,
}

/// Final position of one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySummary {
    pub name: String,
    pub strategy_type: StrategyKind,
    #[serde(flatten)]
    pub portfolio: PortfolioSummary,
    pub periods_simulated: Period,
    pub terminated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_reason: Option<String>,
}

impl StrategySummary {
    pub fn from_outcome(name: &str, kind: StrategyKind, outcome: &SimulationOutcome) -> Self {
        StrategySummary {
            name: name.to_string(),
            strategy_type: kind,
            portfolio: outcome.final_summary(),
            periods_simulated: outcome.periods_simulated,
            terminated: outcome.terminated,
            termination_reason: outcome.termination_reason.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyComparison {
    /// One summary per strategy, in input order
    pub summaries: Vec<StrategySummary>,
    /// Strategy with the highest final net worth (first on ties)
    pub best_strategy: Option<String>,
}

// ---------------------------------------------------------------------------
// Fan-out
// ---------------------------------------------------------------------------

/// Run every job. Results come back in job order regardless of scheduling.
pub fn run_batch(jobs: &[SimulationJob]) -> Vec<EstateSimResult<SimulationOutcome>> {
    #[cfg(feature = "parallel")]
    let results = jobs
        .par_iter()
        .map(|job| simulate(&job.profile, &job.strategy))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let results = jobs
        .iter()
        .map(|job| simulate(&job.profile, &job.strategy))
        .collect();

    results
}

fn best_by_net_worth(summaries: &[StrategySummary]) -> Option<String> {
    let mut best: Option<&StrategySummary> = None;
    for summary in summaries {
        match best {
            Some(current) if summary.portfolio.net_worth <= current.portfolio.net_worth => {}
            _ => best = Some(summary),
        }
    }
    best.map(|s| s.name.clone())
}

/// Run every job and summarise the final positions. Returns the comparison
/// and one warning per early termination.
pub fn summarize_jobs(
    jobs: &[SimulationJob],
) -> EstateSimResult<(StrategyComparison, Vec<String>)> {
    let outcomes = run_batch(jobs)
        .into_iter()
        .collect::<EstateSimResult<Vec<_>>>()?;

    let mut warnings: Vec<String> = Vec::new();
    let summaries: Vec<StrategySummary> = jobs
        .iter()
        .zip(outcomes.iter())
        .map(|(job, outcome)| {
            if let Some(reason) = &outcome.termination_reason {
                warnings.push(format!("{} terminated early: {reason}", job.name));
            }
            StrategySummary::from_outcome(&job.name, job.strategy.strategy_type, outcome)
        })
        .collect();
    let best_strategy = best_by_net_worth(&summaries);

    info!(
        strategies = summaries.len(),
        best = best_strategy.as_deref().unwrap_or("none"),
        "strategy comparison finished"
    );

    Ok((
        StrategyComparison {
            summaries,
            best_strategy,
        },
        warnings,
    ))
}

/// Run each strategy against the same profile and rank them by final net
/// worth.
pub fn compare_strategies(
    profile: &InvestmentProfile,
    strategies: &[NamedStrategy],
) -> EstateSimResult<ComputationOutput<StrategyComparison>> {
    let start = Instant::now();

    let jobs: Vec<SimulationJob> = strategies
        .iter()
        .map(|named| SimulationJob {
            name: named.name.clone(),
            profile: profile.clone(),
            strategy: named.strategy.clone(),
        })
        .collect();
    let (comparison, warnings) = summarize_jobs(&jobs)?;

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Side-by-side strategy simulation ranked by final net worth",
        &serde_json::json!({
            "profile": profile,
            "strategies": strategies,
        }),
        warnings,
        elapsed,
        comparison,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{
        AcquisitionCosts, FinancingKind, FinancingParameters, OperatingParameters,
    };
    use crate::EstateSimError;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn summary(name: &str, net_worth: rust_decimal::Decimal) -> StrategySummary {
        StrategySummary {
            name: name.to_string(),
            strategy_type: StrategyKind::CashOnly,
            portfolio: PortfolioSummary {
                net_worth,
                ..PortfolioSummary::default()
            },
            periods_simulated: 12,
            terminated: false,
            termination_reason: None,
        }
    }

    #[test]
    fn test_best_keeps_first_on_tie() {
        let summaries = vec![
            summary("a", dec!(100)),
            summary("b", dec!(300)),
            summary("c", dec!(300)),
        ];
        assert_eq!(best_by_net_worth(&summaries).as_deref(), Some("b"));
    }

    #[test]
    fn test_best_of_nothing() {
        assert_eq!(best_by_net_worth(&[]), None);
    }

    fn cash_job(horizon: Period) -> SimulationJob {
        let profile = InvestmentProfile {
            acquisition: AcquisitionCosts {
                purchase_price: dec!(1000000),
                transfer_duty: dec!(20000),
                conveyancing_fees: dec!(15000),
                bond_registration: Decimal::ZERO,
                furnishing_cost: Decimal::ZERO,
            },
            financing: FinancingParameters {
                financing_type: FinancingKind::Cash,
                ltv_ratio: Decimal::ZERO,
                appreciation_rate: dec!(0.06),
                interest_rate: None,
                loan_term_years: None,
            },
            operating: OperatingParameters {
                monthly_rental_income: dec!(12000),
                vacancy_rate: dec!(0.05),
                monthly_levies: dec!(1000),
                property_management_fee_rate: dec!(0.08),
                monthly_insurance: dec!(300),
                monthly_maintenance_reserve: dec!(500),
                monthly_furnishing_repair_costs: Decimal::ZERO,
            },
            available_capital: dec!(1500000),
        };
        SimulationJob {
            name: format!("{horizon} months"),
            profile,
            strategy: StrategyConfig::cash_only(horizon),
        }
    }

    #[test]
    fn test_batch_results_follow_job_order() {
        let horizons = [36, 6, 0, 24, 1, 12];
        let jobs: Vec<SimulationJob> = horizons.iter().map(|&h| cash_job(h)).collect();

        let results = run_batch(&jobs);

        assert_eq!(results.len(), horizons.len());
        for (&horizon, result) in horizons.iter().zip(&results) {
            match result {
                Ok(outcome) => assert_eq!(outcome.periods_simulated, horizon),
                Err(err) => {
                    assert_eq!(horizon, 0);
                    assert!(matches!(err, EstateSimError::InvalidInput { .. }));
                }
            }
        }
        assert!(results[2].is_err());
    }
}
