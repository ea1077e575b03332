use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::EstateSimError;
use crate::time_value;
use crate::types::{Money, Rate, MONTHS_PER_YEAR};
use crate::EstateSimResult;

/// Loan term used when a leveraged profile does not state one.
pub const DEFAULT_LOAN_TERM_YEARS: u32 = 20;

/// Longest bond the engine will amortise.
pub const MAX_LOAN_TERM_YEARS: u32 = 50;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How a property acquisition is funded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancingKind {
    Cash,
    Leveraged,
}

impl fmt::Display for FinancingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinancingKind::Cash => write!(f, "cash"),
            FinancingKind::Leveraged => write!(f, "leveraged"),
        }
    }
}

/// One-off costs of acquiring the template property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionCosts {
    pub purchase_price: Money,
    pub transfer_duty: Money,
    pub conveyancing_fees: Money,
    /// Bond (mortgage) registration cost; zero for cash purchases
    pub bond_registration: Money,
    #[serde(default)]
    pub furnishing_cost: Money,
}

impl AcquisitionCosts {
    pub fn total_unfurnished_cost(&self) -> Money {
        self.purchase_price + self.transfer_duty + self.conveyancing_fees + self.bond_registration
    }

    pub fn total_furnished_cost(&self) -> Money {
        self.total_unfurnished_cost() + self.furnishing_cost
    }
}

/// Financing terms and market growth assumptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancingParameters {
    pub financing_type: FinancingKind,
    /// Loan-to-value ratio (0.5 = 50%); zero for cash
    pub ltv_ratio: Rate,
    /// Annual property appreciation rate
    pub appreciation_rate: Rate,
    /// Annual bond interest rate, required for leveraged financing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<Rate>,
    #[serde(default = "default_loan_term")]
    pub loan_term_years: Option<u32>,
}

fn default_loan_term() -> Option<u32> {
    Some(DEFAULT_LOAN_TERM_YEARS)
}

/// Monthly operating income and expense assumptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatingParameters {
    pub monthly_rental_income: Money,
    /// Vacancy rate (0.05 = 5%)
    pub vacancy_rate: Rate,
    pub monthly_levies: Money,
    /// Management fee as a fraction of effective rental income
    pub property_management_fee_rate: Rate,
    pub monthly_insurance: Money,
    pub monthly_maintenance_reserve: Money,
    #[serde(default)]
    pub monthly_furnishing_repair_costs: Money,
}

impl OperatingParameters {
    /// Monthly rental income adjusted for vacancy.
    pub fn effective_monthly_rental(&self) -> Money {
        self.monthly_rental_income * (Decimal::ONE - self.vacancy_rate)
    }

    pub fn monthly_management_fee(&self) -> Money {
        self.effective_monthly_rental() * self.property_management_fee_rate
    }

    pub fn total_monthly_expenses(&self) -> Money {
        self.monthly_levies
            + self.monthly_management_fee()
            + self.monthly_insurance
            + self.monthly_maintenance_reserve
            + self.monthly_furnishing_repair_costs
    }

    /// Annual rental income before vacancy.
    pub fn annual_rental_income(&self) -> Money {
        self.monthly_rental_income * Decimal::from(MONTHS_PER_YEAR)
    }

    pub fn annual_expenses(&self) -> Money {
        self.total_monthly_expenses() * Decimal::from(MONTHS_PER_YEAR)
    }
}

/// Interest rate and term applied to every loan the engine originates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub annual_rate: Rate,
    pub term_years: u32,
}

impl LoanTerms {
    pub fn monthly_rate(&self) -> Rate {
        self.annual_rate / Decimal::from(MONTHS_PER_YEAR)
    }

    pub fn payment_for(&self, loan_amount: Money) -> EstateSimResult<Money> {
        time_value::monthly_payment(loan_amount, self.annual_rate, self.term_years)
    }
}

/// The baseline property profile. Immutable once constructed; the engine
/// uses it as the template for every acquisition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentProfile {
    pub acquisition: AcquisitionCosts,
    pub financing: FinancingParameters,
    pub operating: OperatingParameters,
    pub available_capital: Money,
}

// ---------------------------------------------------------------------------
// Derived figures
// ---------------------------------------------------------------------------

impl InvestmentProfile {
    /// Build and validate a profile in one step.
    pub fn new(
        acquisition: AcquisitionCosts,
        financing: FinancingParameters,
        operating: OperatingParameters,
        available_capital: Money,
    ) -> EstateSimResult<Self> {
        let profile = InvestmentProfile {
            acquisition,
            financing,
            operating,
            available_capital,
        };
        profile.validate()?;
        Ok(profile)
    }

    pub fn is_leveraged(&self) -> bool {
        self.financing.financing_type == FinancingKind::Leveraged
    }

    /// Loan terms, present only when an interest rate is configured.
    pub fn loan_terms(&self) -> Option<LoanTerms> {
        self.financing.interest_rate.map(|annual_rate| LoanTerms {
            annual_rate,
            term_years: self
                .financing
                .loan_term_years
                .unwrap_or(DEFAULT_LOAN_TERM_YEARS),
        })
    }

    pub fn loan_amount(&self) -> Money {
        match self.financing.financing_type {
            FinancingKind::Cash => Decimal::ZERO,
            FinancingKind::Leveraged => {
                self.acquisition.purchase_price * self.financing.ltv_ratio
            }
        }
    }

    /// Cash needed to close on the template property.
    pub fn initial_cash_required(&self) -> Money {
        self.acquisition.total_furnished_cost() - self.loan_amount()
    }

    /// Monthly bond payment; `None` for cash financing.
    pub fn monthly_bond_payment(&self) -> Option<Money> {
        if !self.is_leveraged() {
            return None;
        }
        self.loan_terms()
            .and_then(|terms| terms.payment_for(self.loan_amount()).ok())
    }

    /// Net monthly cash flow of the template property after expenses and
    /// debt service.
    pub fn monthly_cashflow(&self) -> Money {
        self.operating.effective_monthly_rental()
            - self.operating.total_monthly_expenses()
            - self.monthly_bond_payment().unwrap_or(Decimal::ZERO)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> EstateSimResult<()> {
        let acq = &self.acquisition;
        if acq.purchase_price <= Decimal::ZERO {
            return Err(EstateSimError::invalid(
                "purchase_price",
                "Purchase price must be positive",
            ));
        }
        for (field, value) in [
            ("transfer_duty", acq.transfer_duty),
            ("conveyancing_fees", acq.conveyancing_fees),
            ("bond_registration", acq.bond_registration),
            ("furnishing_cost", acq.furnishing_cost),
        ] {
            if value < Decimal::ZERO {
                return Err(EstateSimError::invalid(field, "Cost cannot be negative"));
            }
        }

        let fin = &self.financing;
        if fin.ltv_ratio < Decimal::ZERO || fin.ltv_ratio >= Decimal::ONE {
            return Err(EstateSimError::invalid(
                "ltv_ratio",
                "LTV ratio must be between 0 and 1 (exclusive upper)",
            ));
        }
        if fin.appreciation_rate <= -Decimal::ONE || fin.appreciation_rate > Decimal::ONE {
            return Err(EstateSimError::invalid(
                "appreciation_rate",
                "Appreciation rate must be greater than -100% and at most 100%",
            ));
        }
        match fin.financing_type {
            FinancingKind::Leveraged => {
                let Some(rate) = fin.interest_rate else {
                    return Err(EstateSimError::invalid(
                        "interest_rate",
                        "Interest rate required for leveraged financing",
                    ));
                };
                if rate < Decimal::ZERO || rate >= Decimal::ONE {
                    return Err(EstateSimError::invalid(
                        "interest_rate",
                        "Interest rate must be between 0 and 1 (exclusive upper)",
                    ));
                }
                if acq.bond_registration <= Decimal::ZERO {
                    return Err(EstateSimError::invalid(
                        "bond_registration",
                        "Bond registration cost should be > 0 for leveraged financing",
                    ));
                }
                if let Some(term) = fin.loan_term_years {
                    if term == 0 || term > MAX_LOAN_TERM_YEARS {
                        return Err(EstateSimError::invalid(
                            "loan_term_years",
                            format!("Loan term must be between 1 and {MAX_LOAN_TERM_YEARS} years"),
                        ));
                    }
                }
            }
            FinancingKind::Cash => {
                if !fin.ltv_ratio.is_zero() {
                    return Err(EstateSimError::invalid(
                        "ltv_ratio",
                        "Cash financing implies a zero LTV ratio",
                    ));
                }
                if fin.interest_rate.is_some() {
                    return Err(EstateSimError::invalid(
                        "interest_rate",
                        "Cash financing takes no interest rate",
                    ));
                }
            }
        }

        let op = &self.operating;
        if op.monthly_rental_income < Decimal::ZERO {
            return Err(EstateSimError::invalid(
                "monthly_rental_income",
                "Rental income cannot be negative",
            ));
        }
        if op.vacancy_rate < Decimal::ZERO || op.vacancy_rate >= Decimal::ONE {
            return Err(EstateSimError::invalid(
                "vacancy_rate",
                "Vacancy rate must be between 0 and 1 (exclusive upper)",
            ));
        }
        if op.property_management_fee_rate < Decimal::ZERO
            || op.property_management_fee_rate >= Decimal::ONE
        {
            return Err(EstateSimError::invalid(
                "property_management_fee_rate",
                "Management fee rate must be between 0 and 1 (exclusive upper)",
            ));
        }
        if self.available_capital < Decimal::ZERO {
            return Err(EstateSimError::invalid(
                "available_capital",
                "Available capital cannot be negative",
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
