use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::profile::{FinancingKind, InvestmentProfile};
use crate::types::{Money, Period, Rate, MONTHS_PER_YEAR};

/// One owned property. Records are appended in purchase order and the
/// `property_id` doubles as the ledger index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub property_id: u32,
    pub purchase_price: Money,
    pub current_value: Money,
    /// Outstanding loan balance; zero for cash purchases
    pub loan_balance: Money,
    /// Scheduled monthly debt service
    pub monthly_payment: Money,
    pub financing_type: FinancingKind,
    /// LTV at origination (zero for cash)
    pub acquisition_ltv: Rate,
    pub purchase_period: Period,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_refinanced_period: Option<Period>,
    pub months_owned: u32,
    pub annual_rental_income: Money,
    pub annual_expenses: Money,
    /// Net cash flow of the most recent period
    pub monthly_cashflow: Money,
    /// Cash actually paid at acquisition
    pub cost_basis: Money,
}

impl PropertyRecord {
    /// Human-readable financing label, e.g. `cash` or `70%_leverage`.
    pub fn financing_label(&self) -> String {
        financing_label(self.financing_type, self.acquisition_ltv)
    }

    pub fn equity(&self) -> Money {
        self.current_value - self.loan_balance
    }

    pub fn current_ltv(&self) -> Rate {
        crate::types::safe_div(self.loan_balance, self.current_value)
    }

    /// Shortfall this period: how far rent falls short of expenses plus debt
    /// service. Zero when the property pays for itself.
    pub fn operating_shortfall(&self) -> Money {
        if self.monthly_cashflow < Decimal::ZERO {
            -self.monthly_cashflow
        } else {
            Decimal::ZERO
        }
    }

    /// Refresh income, expenses and period cash flow from the profile
    /// template.
    pub(crate) fn refresh_operating(&mut self, profile: &InvestmentProfile) {
        self.annual_rental_income = profile.operating.annual_rental_income();
        self.annual_expenses = profile.operating.annual_expenses();
        self.monthly_cashflow = template_cashflow(profile, self.monthly_payment);
    }
}

pub fn financing_label(kind: FinancingKind, ltv: Rate) -> String {
    match kind {
        FinancingKind::Cash => "cash".to_string(),
        FinancingKind::Leveraged => {
            let pct = (ltv * Decimal::ONE_HUNDRED).trunc().normalize();
            format!("{pct}%_leverage")
        }
    }
}

/// Period cash flow of one template property carrying `monthly_payment`.
pub fn template_cashflow(profile: &InvestmentProfile, monthly_payment: Money) -> Money {
    profile.operating.effective_monthly_rental()
        - profile.operating.total_monthly_expenses()
        - monthly_payment
}

/// Mutable, engine-owned state of one simulation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioState {
    pub cash_available: Money,
    pub properties: Vec<PropertyRecord>,
    /// Running purchase counter; the next property id
    pub properties_purchased: u32,
    pub total_additional_capital: Money,
    pub leveraged_count: u32,
    pub cash_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_reason: Option<String>,
}

impl PortfolioState {
    pub fn with_cash(cash_available: Money) -> Self {
        PortfolioState {
            cash_available,
            ..PortfolioState::default()
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.termination_reason.is_some()
    }

    /// Mark the run as terminated. The first reason wins.
    pub fn terminate(&mut self, reason: String) {
        if self.termination_reason.is_none() {
            self.termination_reason = Some(reason);
        }
    }

    pub fn next_property_id(&self) -> u32 {
        self.properties_purchased
    }

    /// Append a record to the ledger and update the financing counts.
    pub fn push_property(&mut self, record: PropertyRecord) {
        match record.financing_type {
            FinancingKind::Cash => self.cash_count += 1,
            FinancingKind::Leveraged => self.leveraged_count += 1,
        }
        self.properties_purchased += 1;
        self.properties.push(record);
    }

    pub fn property_count(&self) -> u32 {
        self.properties.len() as u32
    }

    pub fn total_value(&self) -> Money {
        self.properties.iter().map(|p| p.current_value).sum()
    }

    pub fn total_debt(&self) -> Money {
        self.properties.iter().map(|p| p.loan_balance).sum()
    }

    pub fn total_equity(&self) -> Money {
        self.total_value() - self.total_debt()
    }

    pub fn monthly_cashflow(&self) -> Money {
        self.properties.iter().map(|p| p.monthly_cashflow).sum()
    }

    pub fn annual_cashflow(&self) -> Money {
        self.monthly_cashflow() * Decimal::from(MONTHS_PER_YEAR)
    }

    pub fn total_cash_invested(&self) -> Money {
        self.properties.iter().map(|p| p.cost_basis).sum()
    }

    pub fn operating_shortfall(&self) -> Money {
        self.properties.iter().map(|p| p.operating_shortfall()).sum()
    }

    /// Mean current value, `None` for an empty ledger.
    pub fn average_value(&self) -> Option<Money> {
        if self.properties.is_empty() {
            None
        } else {
            Some(self.total_value() / Decimal::from(self.property_count()))
        }
    }
}
