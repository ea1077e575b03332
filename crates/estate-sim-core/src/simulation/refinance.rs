use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use super::events::RefinancingEvent;
use super::state::PortfolioState;
use crate::profile::{InvestmentProfile, LoanTerms};
use crate::types::{Money, Period, Rate};
use crate::EstateSimResult;

/// Cash-out below or at this amount is not worth the refinance.
pub const MIN_CASH_EXTRACTION: Money = dec!(10000);

/// Whether a property last financed at `anchor` is due for a refinance.
pub fn refinance_due(period: Period, anchor: Period, interval: Period) -> bool {
    period.saturating_sub(anchor) >= interval
}

/// Cash-out refinance every leveraged property that is due.
///
/// The new loan is `current_value * target_ltv`. A loan is only ever raised,
/// and only when the extracted cash exceeds [`MIN_CASH_EXTRACTION`]. The new
/// payment re-amortises over the full original term at the original rate,
/// and the property's cash flow is recomputed against it straight away.
pub fn apply_refinancing(
    state: &mut PortfolioState,
    profile: &InvestmentProfile,
    terms: &LoanTerms,
    target_ltv: Rate,
    interval: Period,
    period: Period,
) -> EstateSimResult<Vec<RefinancingEvent>> {
    let mut events = Vec::new();
    let mut extracted_total = Decimal::ZERO;

    for property in state.properties.iter_mut() {
        if property.loan_balance <= Decimal::ZERO || property.current_value <= Decimal::ZERO {
            continue;
        }
        let anchor = property
            .last_refinanced_period
            .unwrap_or(property.purchase_period);
        if !refinance_due(period, anchor, interval) {
            continue;
        }

        let new_loan = property.current_value * target_ltv;
        let cash_extracted = new_loan - property.loan_balance;
        if cash_extracted <= MIN_CASH_EXTRACTION {
            continue;
        }

        let new_payment = terms.payment_for(new_loan)?;
        debug!(
            property_id = property.property_id,
            period,
            %cash_extracted,
            "refinanced property"
        );
        events.push(RefinancingEvent {
            property_id: property.property_id,
            property_value: property.current_value,
            old_loan_amount: property.loan_balance,
            new_loan_amount: new_loan,
            cash_extracted,
            new_ltv: target_ltv,
            new_monthly_payment: new_payment,
        });

        property.loan_balance = new_loan;
        property.monthly_payment = new_payment;
        property.last_refinanced_period = Some(period);
        property.refresh_operating(profile);
        extracted_total += cash_extracted;
    }

    state.cash_available += extracted_total;
    Ok(events)
}
