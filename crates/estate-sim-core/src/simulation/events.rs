use serde::{Deserialize, Serialize};

use crate::profile::FinancingKind;
use crate::strategy::InjectionFrequency;
use crate::types::{Money, Period, Rate};

/// A property acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyPurchase {
    pub property_id: u32,
    pub purchase_price: Money,
    pub cash_required: Money,
    pub financing_type: FinancingKind,
    pub financing_label: String,
    pub loan_amount: Money,
    pub monthly_payment: Money,
}

/// A cash-out refinance of one property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinancingEvent {
    pub property_id: u32,
    pub property_value: Money,
    pub old_loan_amount: Money,
    pub new_loan_amount: Money,
    pub cash_extracted: Money,
    pub new_ltv: Rate,
    pub new_monthly_payment: Money,
}

/// One firing of a capital injection rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalInjectionEvent {
    pub amount: Money,
    pub source: InjectionFrequency,
    pub total_additional_capital_to_date: Money,
}

/// Events collected between two emitted snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodEvents {
    pub property_purchases: Vec<PropertyPurchase>,
    pub refinancing_events: Vec<RefinancingEvent>,
    pub capital_injections: Vec<CapitalInjectionEvent>,
}

impl PeriodEvents {
    pub fn is_empty(&self) -> bool {
        self.property_purchases.is_empty()
            && self.refinancing_events.is_empty()
            && self.capital_injections.is_empty()
    }

    pub fn extend(&mut self, other: PeriodEvents) {
        self.property_purchases.extend(other.property_purchases);
        self.refinancing_events.extend(other.refinancing_events);
        self.capital_injections.extend(other.capital_injections);
    }
}

/// Discriminated event for a merged, chronological timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PortfolioEvent {
    CapitalInjection(CapitalInjectionEvent),
    Refinance(RefinancingEvent),
    Purchase(PropertyPurchase),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub period: Period,
    #[serde(flatten)]
    pub event: PortfolioEvent,
}

/// Flatten a period's events in stepping order: injections, then
/// refinances, then purchases.
pub fn timeline_entries(period: Period, events: &PeriodEvents) -> Vec<TimelineEvent> {
    let injections = events
        .capital_injections
        .iter()
        .cloned()
        .map(PortfolioEvent::CapitalInjection);
    let refinances = events
        .refinancing_events
        .iter()
        .cloned()
        .map(PortfolioEvent::Refinance);
    let purchases = events
        .property_purchases
        .iter()
        .cloned()
        .map(PortfolioEvent::Purchase);

    injections
        .chain(refinances)
        .chain(purchases)
        .map(|event| TimelineEvent { period, event })
        .collect()
}
