use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::state::{PortfolioState, PropertyRecord};
use crate::time_value::annualized_growth;
use crate::types::{safe_div, Money, Period, Rate, MONTHS_PER_YEAR};

/// Annual yield figures for a single property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyYields {
    pub property_id: u32,
    /// Annual rental income / current value
    pub rental_yield: Rate,
    /// (Annual rental income - annual expenses) / current value
    pub net_rental_yield: Rate,
    /// Annual cash flow / cash invested in the property
    pub cash_on_cash_return: Rate,
    /// Annualised appreciation since purchase
    pub capital_growth_yield: Rate,
    /// Net rental yield + capital growth yield
    pub total_return_yield: Rate,
}

/// Portfolio-wide yield figures.
///
/// Rental and net rental yields come from portfolio sums, not from averaging
/// per-property yields. Capital growth is value-weighted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioYields {
    pub period: Period,
    pub portfolio_rental_yield: Rate,
    pub portfolio_net_rental_yield: Rate,
    pub portfolio_cash_on_cash_return: Rate,
    pub portfolio_capital_growth_yield: Rate,
    pub portfolio_total_return_yield: Rate,
    pub total_annual_rental_income: Money,
    pub total_annual_operating_expenses: Money,
    pub total_annual_cashflow: Money,
    pub total_portfolio_value: Money,
    pub total_cash_invested: Money,
}

fn annual_cashflow(property: &PropertyRecord) -> Money {
    property.monthly_cashflow * Decimal::from(MONTHS_PER_YEAR)
}

pub fn property_yields(property: &PropertyRecord) -> PropertyYields {
    let value = property.current_value;
    let net_income = property.annual_rental_income - property.annual_expenses;

    let rental_yield = safe_div(property.annual_rental_income, value);
    let net_rental_yield = safe_div(net_income, value);
    let cash_on_cash_return = safe_div(annual_cashflow(property), property.cost_basis);
    let capital_growth_yield = annualized_growth(
        property.current_value,
        property.purchase_price,
        property.months_owned,
    );

    PropertyYields {
        property_id: property.property_id,
        rental_yield,
        net_rental_yield,
        cash_on_cash_return,
        capital_growth_yield,
        total_return_yield: net_rental_yield + capital_growth_yield,
    }
}

pub fn portfolio_yields(state: &PortfolioState, period: Period) -> PortfolioYields {
    let properties = &state.properties;

    let total_portfolio_value: Money = properties.iter().map(|p| p.current_value).sum();
    let total_annual_rental_income: Money =
        properties.iter().map(|p| p.annual_rental_income).sum();
    let total_annual_operating_expenses: Money =
        properties.iter().map(|p| p.annual_expenses).sum();
    let total_annual_cashflow: Money = properties.iter().map(annual_cashflow).sum();
    let total_cash_invested = state.total_cash_invested();

    let held = || properties.iter().filter(|p| p.months_owned > 0);
    let total_weight: Money = held().map(|p| p.current_value).sum();
    let weighted_growth: Rate = held()
        .map(|p| {
            annualized_growth(p.current_value, p.purchase_price, p.months_owned)
                * safe_div(p.current_value, total_weight)
        })
        .sum();

    let portfolio_net_rental_yield = safe_div(
        total_annual_rental_income - total_annual_operating_expenses,
        total_portfolio_value,
    );
    let portfolio_capital_growth_yield = weighted_growth;

    PortfolioYields {
        period,
        portfolio_rental_yield: safe_div(total_annual_rental_income, total_portfolio_value),
        portfolio_net_rental_yield,
        portfolio_cash_on_cash_return: safe_div(total_annual_cashflow, total_cash_invested),
        portfolio_capital_growth_yield,
        portfolio_total_return_yield: portfolio_net_rental_yield + portfolio_capital_growth_yield,
        total_annual_rental_income,
        total_annual_operating_expenses,
        total_annual_cashflow,
        total_portfolio_value,
        total_cash_invested,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::FinancingKind;
    use rust_decimal_macros::dec;

    fn owned(id: u32, price: Money, value: Money, months: u32) -> PropertyRecord {
        PropertyRecord {
            property_id: id,
            purchase_price: price,
            current_value: value,
            loan_balance: Decimal::ZERO,
            monthly_payment: Decimal::ZERO,
            financing_type: FinancingKind::Cash,
            acquisition_ltv: Decimal::ZERO,
            purchase_period: 0,
            last_refinanced_period: None,
            months_owned: months,
            annual_rental_income: dec!(120000),
            annual_expenses: dec!(24000),
            monthly_cashflow: dec!(8000),
            cost_basis: dec!(1000000),
        }
    }

    #[test]
    fn test_property_yields_basic() {
        let y = property_yields(&owned(0, dec!(1000000), dec!(1000000), 0));
        assert_eq!(y.rental_yield, dec!(0.12));
        assert_eq!(y.net_rental_yield, dec!(0.096));
        assert_eq!(y.cash_on_cash_return, dec!(0.096));
        assert_eq!(y.capital_growth_yield, Decimal::ZERO);
        assert_eq!(y.total_return_yield, y.net_rental_yield);
    }

    #[test]
    fn test_zero_value_guards() {
        let mut p = owned(0, dec!(1000000), Decimal::ZERO, 12);
        p.cost_basis = Decimal::ZERO;
        let y = property_yields(&p);
        assert_eq!(y.rental_yield, Decimal::ZERO);
        assert_eq!(y.cash_on_cash_return, Decimal::ZERO);
        assert_eq!(y.capital_growth_yield, Decimal::ZERO);
    }

    #[test]
    fn test_portfolio_growth_is_value_weighted() {
        let mut state = PortfolioState::default();
        // 10% growth over a year on 1.1M, no growth yet on the fresh one
        state.push_property(owned(0, dec!(1000000), dec!(1100000), 12));
        state.push_property(owned(1, dec!(1000000), dec!(1000000), 0));
        let y = portfolio_yields(&state, 12);
        assert!((y.portfolio_capital_growth_yield - dec!(0.1)).abs() < dec!(0.000001));
        assert_eq!(y.total_portfolio_value, dec!(2100000));
        assert_eq!(y.total_annual_rental_income, dec!(240000));
    }

    #[test]
    fn test_empty_portfolio_yields_are_zero() {
        let y = portfolio_yields(&PortfolioState::default(), 0);
        assert_eq!(y.portfolio_rental_yield, Decimal::ZERO);
        assert_eq!(y.portfolio_total_return_yield, Decimal::ZERO);
    }
}
