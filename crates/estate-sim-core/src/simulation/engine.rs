use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::mem;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::acquisition::{acquire_first, apply_reinvestment, format_rand};
use super::events::{timeline_entries, CapitalInjectionEvent, PeriodEvents, TimelineEvent};
use super::refinance::apply_refinancing;
use super::snapshot::{PortfolioSummary, Snapshot};
use super::state::PortfolioState;
use crate::error::EstateSimError;
use crate::profile::{InvestmentProfile, LoanTerms};
use crate::strategy::{due_injections, StrategyConfig, TrackingFrequency};
use crate::types::{with_metadata, ComputationOutput, Period, MONTHS_PER_YEAR};
use crate::EstateSimResult;

/// Horizons longer than this draw a warning.
const LONG_HORIZON_PERIODS: Period = 50 * MONTHS_PER_YEAR;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Everything one run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationOutcome {
    /// Emitted snapshots in period order; never empty
    pub snapshots: Vec<Snapshot>,
    pub terminated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_reason: Option<String>,
    /// Last period actually stepped
    pub periods_simulated: Period,
    /// Every event tagged with the period it happened in
    pub timeline: Vec<TimelineEvent>,
}

impl SimulationOutcome {
    pub fn final_snapshot(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    pub fn final_summary(&self) -> PortfolioSummary {
        self.final_snapshot()
            .map(Snapshot::summary)
            .unwrap_or_default()
    }
}

/// The period stepper. Holds only borrowed, immutable inputs; all mutable
/// state lives in the [`PortfolioState`] created by [`Simulator::run`].
#[derive(Debug)]
pub struct Simulator<'a> {
    profile: &'a InvestmentProfile,
    strategy: &'a StrategyConfig,
    terms: Option<LoanTerms>,
}

// ---------------------------------------------------------------------------
// Stepper
// ---------------------------------------------------------------------------

impl<'a> Simulator<'a> {
    /// Validate both inputs and check they fit together.
    pub fn new(
        profile: &'a InvestmentProfile,
        strategy: &'a StrategyConfig,
    ) -> EstateSimResult<Self> {
        profile.validate()?;
        strategy.validate()?;

        let terms = profile.loan_terms();
        if strategy.uses_leverage() && terms.is_none() {
            return Err(EstateSimError::invalid(
                "interest_rate",
                format!(
                    "Strategy '{}' originates loans but the profile has no interest rate",
                    strategy.strategy_type
                ),
            ));
        }

        Ok(Simulator {
            profile,
            strategy,
            terms,
        })
    }

    pub fn run(&self) -> EstateSimResult<SimulationOutcome> {
        let horizon = self.strategy.horizon_periods;
        info!(
            strategy = %self.strategy.strategy_type,
            horizon,
            capital = %self.profile.available_capital,
            "starting simulation"
        );

        let mut state = PortfolioState::with_cash(self.profile.available_capital);
        let mut snapshots = Vec::new();
        let mut timeline = Vec::new();
        let mut pending = PeriodEvents::default();

        if let Some(purchase) =
            acquire_first(&mut state, self.profile, self.strategy, self.terms.as_ref())?
        {
            pending.property_purchases.push(purchase);
        }
        timeline.extend(timeline_entries(0, &pending));
        snapshots.push(Snapshot::capture(
            0,
            &state,
            mem::take(&mut pending),
            self.yields_due(0),
        ));

        let mut periods_simulated = 0;
        for period in 1..=horizon {
            if state.is_terminated() {
                break;
            }
            let events = self.step(&mut state, period)?;
            timeline.extend(timeline_entries(period, &events));
            pending.extend(events);
            periods_simulated = period;

            if self.emits(period) || state.is_terminated() {
                snapshots.push(Snapshot::capture(
                    period,
                    &state,
                    mem::take(&mut pending),
                    self.yields_due(period),
                ));
            }
        }

        if let Some(reason) = &state.termination_reason {
            warn!(period = periods_simulated, %reason, "simulation terminated");
        }
        info!(
            periods = periods_simulated,
            properties = state.property_count(),
            snapshots = snapshots.len(),
            "simulation finished"
        );

        Ok(SimulationOutcome {
            snapshots,
            terminated: state.is_terminated(),
            termination_reason: state.termination_reason,
            periods_simulated,
            timeline,
        })
    }

    /// Advance `state` by one month.
    fn step(&self, state: &mut PortfolioState, period: Period) -> EstateSimResult<PeriodEvents> {
        let mut events = PeriodEvents::default();

        self.appreciate(state, period)?;
        self.amortize_and_collect(state);
        self.inject_capital(state, period, &mut events);

        let shortfall = state.operating_shortfall();
        if shortfall > state.cash_available {
            state.terminate(format!(
                "Insufficient cash to cover {} monthly operating deficit with only {} available",
                format_rand(shortfall, false),
                format_rand(state.cash_available, false),
            ));
            return Ok(events);
        }

        if self.strategy.enable_refinancing {
            if let Some(terms) = &self.terms {
                events.refinancing_events = apply_refinancing(
                    state,
                    self.profile,
                    terms,
                    self.strategy.refinance_target(),
                    self.strategy.refinance_interval_periods(),
                    period,
                )?;
            }
        }

        if self.strategy.enable_reinvestment {
            events.property_purchases = apply_reinvestment(
                state,
                self.profile,
                self.strategy,
                self.terms.as_ref(),
                period,
            )?;
        }

        Ok(events)
    }

    /// Grow every property by one month of appreciation. Fails once a value,
    /// or the portfolio total, no longer fits in a Decimal.
    fn appreciate(&self, state: &mut PortfolioState, period: Period) -> EstateSimResult<()> {
        let growth = Decimal::ONE
            + self.profile.financing.appreciation_rate / Decimal::from(MONTHS_PER_YEAR);
        let overflow =
            || EstateSimError::overflow(format!("property appreciation in period {period}"));

        let mut total = Decimal::ZERO;
        for property in state.properties.iter_mut() {
            property.current_value = property
                .current_value
                .checked_mul(growth)
                .ok_or_else(overflow)?;
            property.months_owned += 1;
            total = total
                .checked_add(property.current_value)
                .ok_or_else(overflow)?;
        }
        Ok(())
    }

    /// Pay down every loan by this period's principal, then bank each
    /// property's net cash flow.
    fn amortize_and_collect(&self, state: &mut PortfolioState) {
        let monthly_rate = self
            .terms
            .map(|t| t.monthly_rate())
            .unwrap_or(Decimal::ZERO);

        let mut collected = Decimal::ZERO;
        for property in state.properties.iter_mut() {
            if property.loan_balance > Decimal::ZERO {
                let interest = property.loan_balance * monthly_rate;
                let principal = (property.monthly_payment - interest)
                    .max(Decimal::ZERO)
                    .min(property.loan_balance);
                property.loan_balance -= principal;
            }

            property.refresh_operating(self.profile);
            collected += property.monthly_cashflow;

            if property.loan_balance <= Decimal::ZERO {
                property.loan_balance = Decimal::ZERO;
                property.monthly_payment = Decimal::ZERO;
            }
        }
        state.cash_available += collected;
    }

    fn inject_capital(
        &self,
        state: &mut PortfolioState,
        period: Period,
        events: &mut PeriodEvents,
    ) {
        for rule in due_injections(&self.strategy.capital_injections, period) {
            state.cash_available += rule.amount;
            state.total_additional_capital += rule.amount;
            debug!(period, amount = %rule.amount, source = rule.source_label(), "capital injected");
            events.capital_injections.push(CapitalInjectionEvent {
                amount: rule.amount,
                source: rule.frequency,
                total_additional_capital_to_date: state.total_additional_capital,
            });
        }
    }

    /// Whether a snapshot is kept for `period`.
    fn emits(&self, period: Period) -> bool {
        match self.strategy.tracking_frequency {
            TrackingFrequency::Monthly => true,
            TrackingFrequency::Yearly => {
                period % MONTHS_PER_YEAR == 0 || period == self.strategy.horizon_periods
            }
        }
    }

    /// Whether yields are attached to the snapshot for `period`.
    fn yields_due(&self, period: Period) -> bool {
        match self.strategy.tracking_frequency {
            TrackingFrequency::Monthly => period % MONTHS_PER_YEAR == 0,
            TrackingFrequency::Yearly => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Run one simulation. Pure: the result depends only on the two inputs.
pub fn simulate(
    profile: &InvestmentProfile,
    strategy: &StrategyConfig,
) -> EstateSimResult<SimulationOutcome> {
    Simulator::new(profile, strategy)?.run()
}

#[derive(Serialize)]
struct SimulationAssumptions<'a> {
    profile: &'a InvestmentProfile,
    strategy: &'a StrategyConfig,
}

/// [`simulate`] wrapped in the standard output envelope with advisory
/// warnings.
pub fn run_simulation(
    profile: &InvestmentProfile,
    strategy: &StrategyConfig,
) -> EstateSimResult<ComputationOutput<SimulationOutcome>> {
    let start = Instant::now();
    let outcome = simulate(profile, strategy)?;

    let mut warnings: Vec<String> = Vec::new();
    if strategy.horizon_periods > LONG_HORIZON_PERIODS {
        warnings.push(format!(
            "Horizon of {} months exceeds 50 years; projections compound assumption error",
            strategy.horizon_periods
        ));
    }
    if profile.operating.vacancy_rate > dec!(0.15) {
        warnings.push(format!(
            "Vacancy rate {:.1}% exceeds 15% — above typical market norms",
            profile.operating.vacancy_rate * dec!(100)
        ));
    }
    if strategy.uses_leverage() && strategy.leverage_ratio > dec!(0.8) {
        warnings.push(format!(
            "Leverage ratio {:.1}% exceeds 80% — thin equity cushion",
            strategy.leverage_ratio * dec!(100)
        ));
    }
    if let Some(reason) = &outcome.termination_reason {
        warnings.push(format!(
            "Simulation terminated after {} periods: {reason}",
            outcome.periods_simulated
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Monthly portfolio growth simulation",
        &SimulationAssumptions { profile, strategy },
        warnings,
        elapsed,
        outcome,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{
        AcquisitionCosts, FinancingKind, FinancingParameters, OperatingParameters,
    };
    use crate::strategy::{CapitalInjectionRule, InjectionFrequency};

    fn cash_profile(capital: Decimal) -> InvestmentProfile {
        InvestmentProfile {
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
            available_capital: capital,
        }
    }

    #[test]
    fn test_monthly_tracking_emits_every_period() {
        let profile = cash_profile(dec!(1500000));
        let strategy = StrategyConfig::cash_only(24).with_reinvestment(false);
        let outcome = simulate(&profile, &strategy).unwrap();

        assert_eq!(outcome.snapshots.len(), 25);
        assert_eq!(outcome.periods_simulated, 24);
        assert!(!outcome.terminated);
        assert_eq!(outcome.timeline.len(), 1);
    }

    #[test]
    fn test_yearly_tracking_accumulates_events() {
        let profile = cash_profile(dec!(1500000));
        let strategy = StrategyConfig::cash_only(30)
            .with_reinvestment(false)
            .with_tracking(TrackingFrequency::Yearly)
            .with_injections(vec![CapitalInjectionRule::new(
                dec!(1000),
                InjectionFrequency::Monthly,
            )]);
        let outcome = simulate(&profile, &strategy).unwrap();

        let periods: Vec<Period> = outcome.snapshots.iter().map(|s| s.period).collect();
        assert_eq!(periods, vec![0, 12, 24, 30]);
        assert_eq!(outcome.snapshots[1].events.capital_injections.len(), 12);
        assert_eq!(outcome.snapshots[3].events.capital_injections.len(), 6);
        assert!(outcome.snapshots.iter().all(|s| s.portfolio_yields.is_some()));
    }

    #[test]
    fn test_monthly_yields_only_on_year_boundaries() {
        let profile = cash_profile(dec!(1500000));
        let strategy = StrategyConfig::cash_only(13).with_reinvestment(false);
        let outcome = simulate(&profile, &strategy).unwrap();

        assert!(outcome.snapshots[11].portfolio_yields.is_none());
        assert!(outcome.snapshots[12].portfolio_yields.is_some());
        assert!(outcome.snapshots[13].portfolio_yields.is_none());
    }

    #[test]
    fn test_leveraged_strategy_needs_interest_rate() {
        let profile = cash_profile(dec!(1500000));
        let strategy = StrategyConfig::leveraged(12, dec!(0.7));
        assert!(Simulator::new(&profile, &strategy).is_err());
    }

    #[test]
    fn test_run_simulation_reports_termination() {
        let profile = cash_profile(dec!(1000));
        let strategy = StrategyConfig::cash_only(12);
        let output = run_simulation(&profile, &strategy).unwrap();

        assert!(output.result.terminated);
        assert_eq!(output.result.snapshots.len(), 1);
        assert_eq!(output.result.periods_simulated, 0);
        assert!(output.warnings.iter().any(|w| w.contains("terminated")));
    }
}
