use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::investment::{FinancingKind, InvestmentProfile};
use crate::types::{safe_div, with_metadata, ComputationOutput, Money, Rate, MONTHS_PER_YEAR};
use crate::EstateSimResult;

/// Static projection of a single property profile (no multi-period
/// simulation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileAnalysis {
    pub financing_type: FinancingKind,
    pub total_unfurnished_cost: Money,
    pub total_furnished_cost: Money,
    pub loan_amount: Money,
    pub initial_cash_required: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_bond_payment: Option<Money>,
    pub effective_monthly_rental: Money,
    pub monthly_management_fee: Money,
    pub total_monthly_expenses: Money,
    pub monthly_cashflow: Money,
    pub annual_rental_income: Money,
    pub annual_expenses: Money,
    pub annual_cashflow: Money,
    /// Annual gross rent / purchase price
    pub gross_yield: Rate,
    /// (Annual gross rent - annual expenses) / purchase price
    pub net_yield: Rate,
    /// Annual cash flow / initial cash required
    pub cash_on_cash_return: Rate,
    /// How many template properties the available capital buys outright
    pub affordable_units: u32,
}

/// Produce the static figures for a profile: acquisition totals, financing,
/// monthly and annual operating position, and first-year yields.
pub fn analyze_profile(
    profile: &InvestmentProfile,
) -> EstateSimResult<ComputationOutput<ProfileAnalysis>> {
    let start = Instant::now();
    profile.validate()?;

    let mut warnings: Vec<String> = Vec::new();
    let op = &profile.operating;
    let months = Decimal::from(MONTHS_PER_YEAR);

    let monthly_cashflow = profile.monthly_cashflow();
    let annual_cashflow = monthly_cashflow * months;
    let initial_cash_required = profile.initial_cash_required();
    let purchase_price = profile.acquisition.purchase_price;

    let affordable_units = if initial_cash_required > Decimal::ZERO {
        (profile.available_capital / initial_cash_required)
            .floor()
            .to_u32()
            .unwrap_or(u32::MAX)
    } else {
        0
    };

    if op.vacancy_rate > dec!(0.15) {
        warnings.push(format!(
            "Vacancy rate {:.1}% exceeds 15% — above typical market norms",
            op.vacancy_rate * dec!(100)
        ));
    }
    if profile.financing.ltv_ratio > dec!(0.8) {
        warnings.push(format!(
            "LTV ratio {:.1}% exceeds 80% — thin equity cushion",
            profile.financing.ltv_ratio * dec!(100)
        ));
    }
    if monthly_cashflow < Decimal::ZERO {
        warnings.push(format!(
            "Negative monthly cash flow of {:.2} must be funded from reserves",
            monthly_cashflow.abs()
        ));
    }
    if affordable_units == 0 {
        warnings.push("Available capital does not cover the initial cash required".into());
    }

    let output = ProfileAnalysis {
        financing_type: profile.financing.financing_type,
        total_unfurnished_cost: profile.acquisition.total_unfurnished_cost(),
        total_furnished_cost: profile.acquisition.total_furnished_cost(),
        loan_amount: profile.loan_amount(),
        initial_cash_required,
        monthly_bond_payment: profile.monthly_bond_payment(),
        effective_monthly_rental: op.effective_monthly_rental(),
        monthly_management_fee: op.monthly_management_fee(),
        total_monthly_expenses: op.total_monthly_expenses(),
        monthly_cashflow,
        annual_rental_income: op.annual_rental_income(),
        annual_expenses: op.annual_expenses(),
        annual_cashflow,
        gross_yield: safe_div(op.annual_rental_income(), purchase_price),
        net_yield: safe_div(op.annual_rental_income() - op.annual_expenses(), purchase_price),
        cash_on_cash_return: safe_div(annual_cashflow, initial_cash_required),
        affordable_units,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Single Property Investment Projection",
        profile,
        warnings,
        elapsed,
        output,
    ))
}
