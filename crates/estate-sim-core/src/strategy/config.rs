use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::injection::CapitalInjectionRule;
use crate::error::EstateSimError;
use crate::profile::FinancingKind;
use crate::types::{Period, Rate, MONTHS_PER_YEAR};
use crate::EstateSimResult;

/// Refinance target applied by the strategy builders when none is given.
pub const DEFAULT_REFINANCE_LTV: Rate = dec!(0.6);

/// Longest horizon accepted, in monthly periods (100 years).
pub const MAX_HORIZON_PERIODS: Period = 1200;

/// Allowed drift when checking that mixed-strategy ratios sum to one.
pub const RATIO_TOLERANCE: Decimal = dec!(0.000001);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Acquisition mix of a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    CashOnly,
    Leveraged,
    Mixed,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::CashOnly => write!(f, "cash_only"),
            StrategyKind::Leveraged => write!(f, "leveraged"),
            StrategyKind::Mixed => write!(f, "mixed"),
        }
    }
}

/// Financing of the very first property under a mixed strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirstPropertyType {
    Cash,
    Leveraged,
}

impl From<FirstPropertyType> for FinancingKind {
    fn from(first: FirstPropertyType) -> Self {
        match first {
            FirstPropertyType::Cash => FinancingKind::Cash,
            FirstPropertyType::Leveraged => FinancingKind::Leveraged,
        }
    }
}

/// Granularity at which snapshots are retained. The engine always steps
/// monthly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingFrequency {
    #[default]
    Monthly,
    Yearly,
}

/// How the price of each reinvestment purchase is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionPricing {
    /// Average current value of owned properties (template price when none)
    #[default]
    MarketAverage,
    /// Always the template purchase price
    Template,
}

/// Immutable description of an acquisition/financing strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub strategy_type: StrategyKind,
    /// LTV applied to each leveraged acquisition
    pub leverage_ratio: Rate,
    /// Target share of leveraged properties (mixed only)
    pub leveraged_property_ratio: Rate,
    /// Target share of cash properties (mixed only)
    pub cash_property_ratio: Rate,
    pub first_property_type: FirstPropertyType,
    pub enable_refinancing: bool,
    /// Refinance cadence in years (0.5 = six months)
    pub refinance_frequency_years: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_refinance_ltv: Option<Rate>,
    pub enable_reinvestment: bool,
    #[serde(default)]
    pub tracking_frequency: TrackingFrequency,
    /// Number of monthly periods to simulate
    pub horizon_periods: Period,
    #[serde(default)]
    pub capital_injections: Vec<CapitalInjectionRule>,
    #[serde(default)]
    pub acquisition_pricing: AcquisitionPricing,
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

impl StrategyConfig {
    /// Cash-only acquisitions, no refinancing.
    pub fn cash_only(horizon_periods: Period) -> Self {
        StrategyConfig {
            strategy_type: StrategyKind::CashOnly,
            leverage_ratio: Decimal::ZERO,
            leveraged_property_ratio: Decimal::ZERO,
            cash_property_ratio: Decimal::ONE,
            first_property_type: FirstPropertyType::Cash,
            enable_refinancing: false,
            refinance_frequency_years: Decimal::ONE,
            target_refinance_ltv: None,
            enable_reinvestment: true,
            tracking_frequency: TrackingFrequency::Monthly,
            horizon_periods,
            capital_injections: Vec::new(),
            acquisition_pricing: AcquisitionPricing::default(),
        }
    }

    /// Every acquisition financed at `leverage_ratio`, refinancing yearly.
    pub fn leveraged(horizon_periods: Period, leverage_ratio: Rate) -> Self {
        StrategyConfig {
            strategy_type: StrategyKind::Leveraged,
            leverage_ratio,
            leveraged_property_ratio: Decimal::ONE,
            cash_property_ratio: Decimal::ZERO,
            first_property_type: FirstPropertyType::Leveraged,
            enable_refinancing: true,
            target_refinance_ltv: Some(DEFAULT_REFINANCE_LTV),
            ..StrategyConfig::cash_only(horizon_periods)
        }
    }

    /// Greedy rebalancing between leveraged and cash acquisitions.
    ///
    /// Fails when the two property ratios do not sum to one.
    pub fn mixed(
        horizon_periods: Period,
        leveraged_property_ratio: Rate,
        cash_property_ratio: Rate,
        leverage_ratio: Rate,
        first_property_type: FirstPropertyType,
    ) -> EstateSimResult<Self> {
        check_ratio_sum(leveraged_property_ratio, cash_property_ratio)?;
        Ok(StrategyConfig {
            strategy_type: StrategyKind::Mixed,
            leverage_ratio,
            leveraged_property_ratio,
            cash_property_ratio,
            first_property_type,
            enable_refinancing: true,
            target_refinance_ltv: Some(DEFAULT_REFINANCE_LTV),
            ..StrategyConfig::cash_only(horizon_periods)
        })
    }

    /// Enable refinancing every `years`; keeps the current target or falls
    /// back to the default LTV.
    pub fn with_refinancing(mut self, years: Decimal) -> Self {
        self.enable_refinancing = true;
        self.refinance_frequency_years = years;
        if self.target_refinance_ltv.is_none() {
            self.target_refinance_ltv = Some(DEFAULT_REFINANCE_LTV);
        }
        self
    }

    pub fn with_refinance_target(mut self, ltv: Rate) -> Self {
        self.target_refinance_ltv = Some(ltv);
        self
    }

    pub fn without_refinancing(mut self) -> Self {
        self.enable_refinancing = false;
        self
    }

    pub fn with_reinvestment(mut self, enabled: bool) -> Self {
        self.enable_reinvestment = enabled;
        self
    }

    pub fn with_tracking(mut self, tracking: TrackingFrequency) -> Self {
        self.tracking_frequency = tracking;
        self
    }

    pub fn with_injections(mut self, rules: Vec<CapitalInjectionRule>) -> Self {
        self.capital_injections = rules;
        self
    }

    pub fn with_pricing(mut self, pricing: AcquisitionPricing) -> Self {
        self.acquisition_pricing = pricing;
        self
    }

    // -----------------------------------------------------------------------
    // Derived values
    // -----------------------------------------------------------------------

    /// Refinance cadence converted to whole periods (at least one).
    pub fn refinance_interval_periods(&self) -> Period {
        (self.refinance_frequency_years * Decimal::from(MONTHS_PER_YEAR))
            .round()
            .to_u32()
            .unwrap_or(MONTHS_PER_YEAR)
            .max(1)
    }

    pub fn refinance_target(&self) -> Rate {
        self.target_refinance_ltv.unwrap_or(DEFAULT_REFINANCE_LTV)
    }

    /// Whether this strategy can originate loans at all.
    pub fn uses_leverage(&self) -> bool {
        match self.strategy_type {
            StrategyKind::CashOnly => false,
            StrategyKind::Leveraged => true,
            StrategyKind::Mixed => self.leveraged_property_ratio > Decimal::ZERO
                || self.first_property_type == FirstPropertyType::Leveraged,
        }
    }

    /// Financing of property #0.
    pub fn first_property_financing(&self) -> FinancingKind {
        match self.strategy_type {
            StrategyKind::CashOnly => FinancingKind::Cash,
            StrategyKind::Leveraged => FinancingKind::Leveraged,
            StrategyKind::Mixed => self.first_property_type.into(),
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> EstateSimResult<()> {
        if self.horizon_periods == 0 || self.horizon_periods > MAX_HORIZON_PERIODS {
            return Err(EstateSimError::invalid(
                "horizon_periods",
                format!("Simulation horizon must be between 1 and {MAX_HORIZON_PERIODS} periods"),
            ));
        }

        if self.strategy_type != StrategyKind::CashOnly
            && (self.leverage_ratio <= Decimal::ZERO || self.leverage_ratio >= Decimal::ONE)
        {
            return Err(EstateSimError::invalid(
                "leverage_ratio",
                "Leverage ratio must be between 0 and 1 (exclusive)",
            ));
        }

        if self.strategy_type == StrategyKind::Mixed {
            check_ratio_sum(self.leveraged_property_ratio, self.cash_property_ratio)?;
            for (field, ratio) in [
                ("leveraged_property_ratio", self.leveraged_property_ratio),
                ("cash_property_ratio", self.cash_property_ratio),
            ] {
                if ratio < Decimal::ZERO || ratio > Decimal::ONE {
                    return Err(EstateSimError::invalid(field, "Ratio must be within [0, 1]"));
                }
            }
        }

        if self.enable_refinancing {
            let Some(target) = self.target_refinance_ltv else {
                return Err(EstateSimError::invalid(
                    "target_refinance_ltv",
                    "Target refinance LTV required when refinancing is enabled",
                ));
            };
            if target <= Decimal::ZERO || target >= Decimal::ONE {
                return Err(EstateSimError::invalid(
                    "target_refinance_ltv",
                    "Target refinance LTV must be between 0 and 1 (exclusive)",
                ));
            }
            if self.refinance_frequency_years <= Decimal::ZERO {
                return Err(EstateSimError::invalid(
                    "refinance_frequency_years",
                    "Refinance cadence must be positive",
                ));
            }
        }

        for (i, rule) in self.capital_injections.iter().enumerate() {
            rule.validate(i)?;
        }

        Ok(())
    }
}

fn check_ratio_sum(leveraged: Rate, cash: Rate) -> EstateSimResult<()> {
    let sum = leveraged + cash;
    if (sum - Decimal::ONE).abs() > RATIO_TOLERANCE {
        return Err(EstateSimError::invalid(
            "property_ratios",
            format!("Property ratios must sum to 1.0, got: {sum}"),
        ));
    }
    Ok(())
}
