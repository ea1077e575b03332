use rust_decimal::Decimal;
use tracing::debug;

use super::events::PropertyPurchase;
use super::state::{financing_label, template_cashflow, PortfolioState, PropertyRecord};
use crate::error::EstateSimError;
use crate::profile::{FinancingKind, InvestmentProfile, LoanTerms};
use crate::strategy::{AcquisitionPricing, StrategyConfig, StrategyKind};
use crate::types::{safe_div, Money, Period, Rate};
use crate::EstateSimResult;

/// Months of negative cash flow the remaining cash must cover after a
/// purchase.
pub const DEFICIT_COVER_MONTHS: u32 = 6;

// ---------------------------------------------------------------------------
// Financing decision
// ---------------------------------------------------------------------------

/// Financing kind of the next acquisition.
///
/// Mixed strategies rebalance greedily: leverage is chosen when the
/// leveraged share is at least as far below its target as the cash share.
pub fn choose_financing(strategy: &StrategyConfig, state: &PortfolioState) -> FinancingKind {
    match strategy.strategy_type {
        StrategyKind::CashOnly => FinancingKind::Cash,
        StrategyKind::Leveraged => FinancingKind::Leveraged,
        StrategyKind::Mixed => {
            let owned = state.property_count();
            if owned == 0 {
                return strategy.first_property_type.into();
            }
            let total = Decimal::from(owned);
            let leveraged_share = Decimal::from(state.leveraged_count) / total;
            let cash_share = Decimal::from(state.cash_count) / total;

            let leverage_deficit = strategy.leveraged_property_ratio - leveraged_share;
            let cash_deficit = strategy.cash_property_ratio - cash_share;

            if leverage_deficit >= cash_deficit {
                FinancingKind::Leveraged
            } else {
                FinancingKind::Cash
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

/// Full cost breakdown of one prospective acquisition.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionQuote {
    pub financing_type: FinancingKind,
    pub ltv: Rate,
    pub purchase_price: Money,
    pub down_payment: Money,
    pub transfer_duty: Money,
    pub conveyancing_fees: Money,
    pub bond_registration: Money,
    pub furnishing_cost: Money,
    pub loan_amount: Money,
    pub monthly_payment: Money,
}

impl AcquisitionQuote {
    /// Cash needed at closing.
    pub fn cash_required(&self) -> Money {
        self.down_payment
            + self.transfer_duty
            + self.conveyancing_fees
            + self.bond_registration
            + self.furnishing_cost
    }
}

/// Purchase price of the next acquisition.
pub fn next_purchase_price(
    profile: &InvestmentProfile,
    strategy: &StrategyConfig,
    state: &PortfolioState,
) -> Money {
    let template = profile.acquisition.purchase_price;
    match strategy.acquisition_pricing {
        AcquisitionPricing::Template => template,
        AcquisitionPricing::MarketAverage => state.average_value().unwrap_or(template),
    }
}

/// Price one acquisition. Every cost component scales with
/// `purchase_price / template price`; bond registration applies only to
/// leveraged purchases.
pub fn quote(
    profile: &InvestmentProfile,
    strategy: &StrategyConfig,
    terms: Option<&LoanTerms>,
    financing_type: FinancingKind,
    purchase_price: Money,
) -> EstateSimResult<AcquisitionQuote> {
    let costs = &profile.acquisition;
    let ratio = safe_div(purchase_price, costs.purchase_price);

    let (ltv, bond_registration, monthly_payment) = match financing_type {
        FinancingKind::Cash => (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
        FinancingKind::Leveraged => {
            let terms = terms.ok_or_else(|| {
                EstateSimError::invalid(
                    "interest_rate",
                    "Leveraged acquisitions need an interest rate",
                )
            })?;
            let ltv = strategy.leverage_ratio;
            let payment = terms.payment_for(purchase_price * ltv)?;
            (ltv, costs.bond_registration * ratio, payment)
        }
    };
    let loan_amount = purchase_price * ltv;

    Ok(AcquisitionQuote {
        financing_type,
        ltv,
        purchase_price,
        down_payment: purchase_price - loan_amount,
        transfer_duty: costs.transfer_duty * ratio,
        conveyancing_fees: costs.conveyancing_fees * ratio,
        bond_registration,
        furnishing_cost: costs.furnishing_cost * ratio,
        loan_amount,
        monthly_payment,
    })
}

// ---------------------------------------------------------------------------
// Purchases
// ---------------------------------------------------------------------------

/// Record a quoted purchase: deduct cash, append to the ledger and return the
/// event.
fn settle(
    state: &mut PortfolioState,
    profile: &InvestmentProfile,
    quote: &AcquisitionQuote,
    period: Period,
) -> PropertyPurchase {
    let cash_required = quote.cash_required();
    let record = PropertyRecord {
        property_id: state.next_property_id(),
        purchase_price: quote.purchase_price,
        current_value: quote.purchase_price,
        loan_balance: quote.loan_amount,
        monthly_payment: quote.monthly_payment,
        financing_type: quote.financing_type,
        acquisition_ltv: quote.ltv,
        purchase_period: period,
        last_refinanced_period: None,
        months_owned: 0,
        annual_rental_income: profile.operating.annual_rental_income(),
        annual_expenses: profile.operating.annual_expenses(),
        monthly_cashflow: template_cashflow(profile, quote.monthly_payment),
        cost_basis: cash_required,
    };
    let event = PropertyPurchase {
        property_id: record.property_id,
        purchase_price: quote.purchase_price,
        cash_required,
        financing_type: quote.financing_type,
        financing_label: financing_label(quote.financing_type, quote.ltv),
        loan_amount: quote.loan_amount,
        monthly_payment: quote.monthly_payment,
    };

    debug!(
        property_id = record.property_id,
        period,
        financing = %event.financing_label,
        %cash_required,
        "acquired property"
    );
    state.cash_available -= cash_required;
    state.push_property(record);
    event
}

/// Buy property #0 at the template price.
///
/// Returns `Ok(None)` and terminates the state when available cash does not
/// cover it.
pub fn acquire_first(
    state: &mut PortfolioState,
    profile: &InvestmentProfile,
    strategy: &StrategyConfig,
    terms: Option<&LoanTerms>,
) -> EstateSimResult<Option<PropertyPurchase>> {
    let quote = quote(
        profile,
        strategy,
        terms,
        strategy.first_property_financing(),
        profile.acquisition.purchase_price,
    )?;
    let cash_required = quote.cash_required();
    if state.cash_available < cash_required {
        state.terminate(format!(
            "Insufficient cash to buy first property. Need {}, have {}",
            format_rand(cash_required, true),
            format_rand(state.cash_available, true),
        ));
        return Ok(None);
    }
    Ok(Some(settle(state, profile, &quote, 0)))
}

/// Aggregate monthly cash flow if every owned property ran on the template
/// at its current payment.
fn projected_monthly_cashflow(state: &PortfolioState, profile: &InvestmentProfile) -> Money {
    state
        .properties
        .iter()
        .map(|p| template_cashflow(profile, p.monthly_payment))
        .sum()
}

/// Keep buying while cash covers the next unit.
///
/// Stops early when a purchase would leave the portfolio cash-flow negative
/// without [`DEFICIT_COVER_MONTHS`] of cover in the bank.
pub fn apply_reinvestment(
    state: &mut PortfolioState,
    profile: &InvestmentProfile,
    strategy: &StrategyConfig,
    terms: Option<&LoanTerms>,
    period: Period,
) -> EstateSimResult<Vec<PropertyPurchase>> {
    let mut purchases = Vec::new();

    loop {
        let kind = choose_financing(strategy, state);
        let price = next_purchase_price(profile, strategy, state);
        let quote = quote(profile, strategy, terms, kind, price)?;
        let cash_required = quote.cash_required();

        if cash_required <= Decimal::ZERO || state.cash_available < cash_required {
            break;
        }

        let projected = projected_monthly_cashflow(state, profile)
            + template_cashflow(profile, quote.monthly_payment);
        let remaining = state.cash_available - cash_required;
        if projected < Decimal::ZERO
            && remaining < -projected * Decimal::from(DEFICIT_COVER_MONTHS)
        {
            debug!(period, %projected, %remaining, "purchase skipped by deficit guard");
            break;
        }

        purchases.push(settle(state, profile, &quote, period));
    }

    Ok(purchases)
}

/// Amount rendered as whole rand, optionally with thousands separators.
pub(crate) fn format_rand(amount: Money, grouped: bool) -> String {
    let rounded = amount.round().normalize();
    let digits = rounded.abs().to_string();
    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    if !grouped {
        return format!("{sign}R{digits}");
    }
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    format!("{sign}R{out}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{AcquisitionCosts, FinancingParameters, OperatingParameters};
    use crate::strategy::FirstPropertyType;
    use rust_decimal_macros::dec;

    fn profile(capital: Money) -> InvestmentProfile {
        InvestmentProfile {
            acquisition: AcquisitionCosts {
                purchase_price: dec!(1000000),
                transfer_duty: dec!(20000),
                conveyancing_fees: dec!(15000),
                bond_registration: dec!(10000),
                furnishing_cost: dec!(5000),
            },
            financing: FinancingParameters {
                financing_type: FinancingKind::Leveraged,
                ltv_ratio: dec!(0.7),
                appreciation_rate: dec!(0.06),
                interest_rate: Some(dec!(0.12)),
                loan_term_years: Some(20),
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

    fn mixed() -> StrategyConfig {
        StrategyConfig::mixed(60, dec!(0.5), dec!(0.5), dec!(0.7), FirstPropertyType::Cash)
            .unwrap()
    }

    #[test]
    fn test_cash_quote_excludes_bond_registration() {
        let p = profile(Decimal::ZERO);
        let q = quote(&p, &mixed(), None, FinancingKind::Cash, dec!(1000000)).unwrap();
        assert_eq!(q.cash_required(), dec!(1040000));
        assert_eq!(q.loan_amount, Decimal::ZERO);
    }

    #[test]
    fn test_leveraged_quote_scales_costs() {
        let p = profile(Decimal::ZERO);
        let terms = p.loan_terms();
        let q = quote(&p, &mixed(), terms.as_ref(), FinancingKind::Leveraged, dec!(2000000))
            .unwrap();
        assert_eq!(q.loan_amount, dec!(1400000));
        // 600k down + 2 x (20k + 15k + 10k + 5k)
        assert_eq!(q.cash_required(), dec!(700000));
        assert!(q.monthly_payment > Decimal::ZERO);
    }

    #[test]
    fn test_leveraged_quote_without_terms_fails() {
        let p = profile(Decimal::ZERO);
        let err = quote(&p, &mixed(), None, FinancingKind::Leveraged, dec!(1000000));
        assert!(err.is_err());
    }

    #[test]
    fn test_mixed_tie_goes_to_leverage() {
        let strategy = mixed();
        let mut state = PortfolioState::default();
        let p = profile(dec!(5000000));
        let terms = p.loan_terms();
        assert_eq!(choose_financing(&strategy, &state), FinancingKind::Cash);

        let first = quote(&p, &strategy, terms.as_ref(), FinancingKind::Cash, dec!(1000000))
            .unwrap();
        settle(&mut state, &p, &first, 0);
        assert_eq!(choose_financing(&strategy, &state), FinancingKind::Leveraged);

        let second = quote(&p, &strategy, terms.as_ref(), FinancingKind::Leveraged, dec!(1000000))
            .unwrap();
        settle(&mut state, &p, &second, 0);
        // 50/50 against a 50/50 target
        assert_eq!(choose_financing(&strategy, &state), FinancingKind::Leveraged);
    }

    #[test]
    fn test_insufficient_first_purchase_terminates() {
        let p = profile(dec!(100000));
        let strategy = StrategyConfig::cash_only(12);
        let mut state = PortfolioState::with_cash(p.available_capital);

        let bought = acquire_first(&mut state, &p, &strategy, None).unwrap();

        assert!(bought.is_none());
        assert_eq!(state.property_count(), 0);
        assert_eq!(
            state.termination_reason.as_deref(),
            Some("Insufficient cash to buy first property. Need R1,040,000, have R100,000")
        );
    }

    #[test]
    fn test_reinvestment_buys_until_cash_runs_out() {
        let p = profile(Decimal::ZERO);
        let strategy = StrategyConfig::cash_only(12).with_pricing(AcquisitionPricing::Template);
        let mut state = PortfolioState::with_cash(dec!(2500000));

        let bought = apply_reinvestment(&mut state, &p, &strategy, None, 3).unwrap();

        assert_eq!(bought.len(), 2);
        assert_eq!(bought[1].property_id, 1);
        assert_eq!(state.cash_available, dec!(420000));
        assert!(state.properties.iter().all(|r| r.purchase_period == 3));
    }

    fn thin_rent_leverage() -> (InvestmentProfile, StrategyConfig) {
        let mut p = profile(Decimal::ZERO);
        p.operating.monthly_rental_income = dec!(8000);
        let strategy =
            StrategyConfig::leveraged(12, dec!(0.7)).with_pricing(AcquisitionPricing::Template);
        (p, strategy)
    }

    #[test]
    fn test_deficit_guard_skips_purchase_without_six_months_cover() {
        let (p, strategy) = thin_rent_leverage();
        let terms = p.loan_terms();
        let q = quote(&p, &strategy, terms.as_ref(), FinancingKind::Leveraged, dec!(1000000))
            .unwrap();
        let cover = -template_cashflow(&p, q.monthly_payment) * dec!(6);
        assert_eq!(q.cash_required(), dec!(350000));
        assert!(cover > dec!(10000) && cover < dec!(20000), "cover {cover}");

        let mut state = PortfolioState::with_cash(dec!(360000));
        let bought = apply_reinvestment(&mut state, &p, &strategy, terms.as_ref(), 4).unwrap();

        assert!(bought.is_empty());
        assert_eq!(state.property_count(), 0);
        assert_eq!(state.cash_available, dec!(360000));
    }

    #[test]
    fn test_deficit_guard_allows_purchase_with_six_months_cover() {
        let (p, strategy) = thin_rent_leverage();
        let terms = p.loan_terms();
        let mut state = PortfolioState::with_cash(dec!(370000));

        let bought = apply_reinvestment(&mut state, &p, &strategy, terms.as_ref(), 4).unwrap();

        assert_eq!(bought.len(), 1);
        assert_eq!(bought[0].financing_type, FinancingKind::Leveraged);
        assert_eq!(state.cash_available, dec!(20000));
        assert!(state.properties[0].monthly_cashflow < Decimal::ZERO);
    }

    #[test]
    fn test_format_rand() {
        assert_eq!(format_rand(dec!(1234567.4), true), "R1,234,567");
        assert_eq!(format_rand(dec!(999), true), "R999");
        assert_eq!(format_rand(dec!(-4520.6), false), "-R4521");
    }
}
