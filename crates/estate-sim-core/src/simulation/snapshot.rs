use serde::{Deserialize, Serialize};

use super::events::PeriodEvents;
use super::state::{PortfolioState, PropertyRecord};
use super::yields::{portfolio_yields, property_yields, PortfolioYields, PropertyYields};
use crate::types::{Money, Period};

/// Frozen view of the portfolio at the end of one tracked period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub period: Period,
    pub properties: Vec<PropertyRecord>,
    pub property_count: u32,
    pub leveraged_count: u32,
    pub cash_count: u32,
    pub total_property_value: Money,
    pub total_debt: Money,
    pub total_equity: Money,
    pub cash_available: Money,
    pub monthly_cashflow: Money,
    pub annual_cashflow: Money,
    pub total_cash_invested: Money,
    pub total_additional_capital: Money,
    #[serde(flatten)]
    pub events: PeriodEvents,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_yields: Option<Vec<PropertyYields>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio_yields: Option<PortfolioYields>,
    pub terminated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_reason: Option<String>,
}

impl Snapshot {
    /// Capture `state` after `period` has been applied. Yields are attached
    /// only when `with_yields` is set.
    pub fn capture(
        period: Period,
        state: &PortfolioState,
        events: PeriodEvents,
        with_yields: bool,
    ) -> Self {
        let (property_yields, portfolio) = if with_yields {
            (
                Some(state.properties.iter().map(property_yields).collect()),
                Some(portfolio_yields(state, period)),
            )
        } else {
            (None, None)
        };

        Snapshot {
            period,
            properties: state.properties.clone(),
            property_count: state.property_count(),
            leveraged_count: state.leveraged_count,
            cash_count: state.cash_count,
            total_property_value: state.total_value(),
            total_debt: state.total_debt(),
            total_equity: state.total_equity(),
            cash_available: state.cash_available,
            monthly_cashflow: state.monthly_cashflow(),
            annual_cashflow: state.annual_cashflow(),
            total_cash_invested: state.total_cash_invested(),
            total_additional_capital: state.total_additional_capital,
            events,
            property_yields,
            portfolio_yields: portfolio,
            terminated: state.is_terminated(),
            termination_reason: state.termination_reason.clone(),
        }
    }

    /// Equity plus uninvested cash.
    pub fn net_worth(&self) -> Money {
        self.total_equity + self.cash_available
    }

    pub fn summary(&self) -> PortfolioSummary {
        PortfolioSummary {
            period: self.period,
            property_count: self.property_count,
            leveraged_count: self.leveraged_count,
            cash_count: self.cash_count,
            total_property_value: self.total_property_value,
            total_debt: self.total_debt,
            total_equity: self.total_equity,
            cash_available: self.cash_available,
            net_worth: self.net_worth(),
            monthly_cashflow: self.monthly_cashflow,
            total_cash_invested: self.total_cash_invested,
            total_additional_capital: self.total_additional_capital,
        }
    }
}

/// Headline totals of one snapshot, without the ledger or events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub period: Period,
    pub property_count: u32,
    pub leveraged_count: u32,
    pub cash_count: u32,
    pub total_property_value: Money,
    pub total_debt: Money,
    pub total_equity: Money,
    pub cash_available: Money,
    /// Equity plus cash
    pub net_worth: Money,
    pub monthly_cashflow: Money,
    pub total_cash_invested: Money,
    pub total_additional_capital: Money,
}
