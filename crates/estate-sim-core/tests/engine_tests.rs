use estate_sim_core::profile::{
    AcquisitionCosts, FinancingKind, FinancingParameters, InvestmentProfile, OperatingParameters,
};
use estate_sim_core::simulation::{compare_strategies, simulate, NamedStrategy, PortfolioEvent};
use estate_sim_core::strategy::{
    AcquisitionPricing, FirstPropertyType, StrategyConfig, TrackingFrequency,
};
use estate_sim_core::EstateSimError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Period stepper: end-to-end runs over small portfolios
// ===========================================================================

fn operating(monthly_rent: Decimal) -> OperatingParameters {
    OperatingParameters {
        monthly_rental_income: monthly_rent,
        vacancy_rate: dec!(0.05),
        monthly_levies: dec!(1000),
        property_management_fee_rate: dec!(0.08),
        monthly_insurance: dec!(300),
        monthly_maintenance_reserve: dec!(500),
        monthly_furnishing_repair_costs: Decimal::ZERO,
    }
}

fn cash_profile(available_capital: Decimal) -> InvestmentProfile {
    InvestmentProfile::new(
        AcquisitionCosts {
            purchase_price: dec!(1000000),
            transfer_duty: dec!(20000),
            conveyancing_fees: dec!(15000),
            bond_registration: Decimal::ZERO,
            furnishing_cost: Decimal::ZERO,
        },
        FinancingParameters {
            financing_type: FinancingKind::Cash,
            ltv_ratio: Decimal::ZERO,
            appreciation_rate: dec!(0.06),
            interest_rate: None,
            loan_term_years: None,
        },
        operating(dec!(12000)),
        available_capital,
    )
    .unwrap()
}

fn leveraged_profile(ltv: Decimal, monthly_rent: Decimal, capital: Decimal) -> InvestmentProfile {
    InvestmentProfile::new(
        AcquisitionCosts {
            purchase_price: dec!(1000000),
            transfer_duty: dec!(20000),
            conveyancing_fees: dec!(15000),
            bond_registration: dec!(12000),
            furnishing_cost: Decimal::ZERO,
        },
        FinancingParameters {
            financing_type: FinancingKind::Leveraged,
            ltv_ratio: ltv,
            appreciation_rate: dec!(0.06),
            interest_rate: Some(dec!(0.12)),
            loan_term_years: Some(20),
        },
        operating(monthly_rent),
        capital,
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Cash-only
// ---------------------------------------------------------------------------

#[test]
fn test_cash_only_two_years_without_reinvestment() {
    let profile = cash_profile(dec!(1500000));
    let strategy = StrategyConfig::cash_only(24).with_reinvestment(false);

    let outcome = simulate(&profile, &strategy).unwrap();

    assert_eq!(outcome.snapshots.len(), 25);
    assert!(!outcome.terminated);
    for (i, snap) in outcome.snapshots.iter().enumerate() {
        assert_eq!(snap.period, i as u32);
        assert_eq!(snap.total_debt, Decimal::ZERO);
        assert!(
            (snap.total_equity - snap.total_property_value).abs() < Decimal::ONE,
            "equity {} != value {} at period {}",
            snap.total_equity,
            snap.total_property_value,
            snap.period
        );
        assert_eq!(snap.property_count, 1);
    }
}

#[test]
fn test_cash_only_appreciation_compounds_monthly() {
    let profile = cash_profile(dec!(1500000));
    let strategy = StrategyConfig::cash_only(12).with_reinvestment(false);

    let outcome = simulate(&profile, &strategy).unwrap();
    let last = outcome.final_snapshot().unwrap();

    // 1,000,000 * 1.005^12
    assert!(
        (last.total_property_value - dec!(1061677.81)).abs() < dec!(0.01),
        "got {}",
        last.total_property_value
    );
}

#[test]
fn test_cash_accumulates_from_rent() {
    let profile = cash_profile(dec!(1500000));
    let strategy = StrategyConfig::cash_only(3).with_reinvestment(false);

    let outcome = simulate(&profile, &strategy).unwrap();

    // 11,400 effective rent - 2,712 expenses = 8,688 per month
    let cash: Vec<Decimal> = outcome.snapshots.iter().map(|s| s.cash_available).collect();
    assert_eq!(
        cash,
        vec![dec!(465000), dec!(473688), dec!(482376), dec!(491064)]
    );
}

#[test]
fn test_insufficient_capital_for_first_property() {
    let profile = cash_profile(dec!(500000));
    let strategy = StrategyConfig::cash_only(24).with_reinvestment(false);

    let outcome = simulate(&profile, &strategy).unwrap();

    assert!(outcome.terminated);
    assert_eq!(outcome.snapshots.len(), 1);
    let snap = &outcome.snapshots[0];
    assert!(snap.terminated);
    assert_eq!(snap.property_count, 0);
    assert_eq!(snap.cash_available, dec!(500000));
    assert_eq!(
        outcome.termination_reason.as_deref(),
        Some("Insufficient cash to buy first property. Need R1,035,000, have R500,000")
    );
}

#[test]
fn test_reinvestment_buys_second_property_at_market_average() {
    let profile = cash_profile(dec!(2200000));
    let strategy = StrategyConfig::cash_only(2);

    let outcome = simulate(&profile, &strategy).unwrap();

    let first = &outcome.snapshots[1];
    assert_eq!(first.property_count, 2);
    let purchase = &first.events.property_purchases[0];
    assert_eq!(purchase.property_id, 1);
    // priced at the appreciated value of property #0
    assert_eq!(purchase.purchase_price, dec!(1005000));
    assert_eq!(purchase.financing_label, "cash");
}

#[test]
fn test_template_pricing_ignores_appreciation() {
    let profile = cash_profile(dec!(2200000));
    let strategy = StrategyConfig::cash_only(2).with_pricing(AcquisitionPricing::Template);

    let outcome = simulate(&profile, &strategy).unwrap();

    let purchase = &outcome.snapshots[1].events.property_purchases[0];
    assert_eq!(purchase.purchase_price, dec!(1000000));
    assert_eq!(purchase.cash_required, dec!(1035000));
}

// ---------------------------------------------------------------------------
// Leverage, amortization and termination
// ---------------------------------------------------------------------------

#[test]
fn test_loan_balances_never_increase_without_refinancing() {
    let profile = leveraged_profile(dec!(0.5), dec!(12000), dec!(2000000));
    let strategy = StrategyConfig::leveraged(36, dec!(0.5)).without_refinancing();

    let outcome = simulate(&profile, &strategy).unwrap();

    for pair in outcome.snapshots.windows(2) {
        for before in &pair[0].properties {
            let after = &pair[1].properties[before.property_id as usize];
            assert!(after.loan_balance <= before.loan_balance);
            assert!(after.loan_balance >= Decimal::ZERO);
        }
    }
}

#[test]
fn test_high_leverage_low_rent_terminates_on_deficit() {
    let profile = leveraged_profile(dec!(0.95), dec!(5000), dec!(150000));
    let strategy = StrategyConfig::leveraged(24, dec!(0.95));

    let outcome = simulate(&profile, &strategy).unwrap();

    assert!(outcome.terminated);
    assert!(outcome.snapshots.len() <= 25);
    assert!(outcome.periods_simulated < 24);
    let reason = outcome.termination_reason.clone().unwrap_or_default();
    assert!(reason.contains("deficit"), "reason: {reason}");
    assert!(reason.contains("cash"), "reason: {reason}");

    let last = outcome.final_snapshot().unwrap();
    assert!(last.terminated);
    assert_eq!(last.termination_reason, outcome.termination_reason);
}

#[test]
fn test_termination_flag_is_permanent() {
    let profile = leveraged_profile(dec!(0.95), dec!(5000), dec!(150000));
    let strategy = StrategyConfig::leveraged(24, dec!(0.95));

    let outcome = simulate(&profile, &strategy).unwrap();

    let first = outcome
        .snapshots
        .iter()
        .position(|s| s.terminated)
        .expect("run should terminate");
    for snap in &outcome.snapshots[first..] {
        assert!(snap.terminated);
        assert_eq!(snap.termination_reason, outcome.termination_reason);
    }
}

#[test]
fn test_refinancing_extracts_equity_after_a_year() {
    let mut profile = leveraged_profile(dec!(0.5), dec!(12000), dec!(600000));
    profile.financing.appreciation_rate = dec!(0.12);
    let strategy = StrategyConfig::leveraged(12, dec!(0.5))
        .with_refinance_target(dec!(0.6))
        .with_reinvestment(false);

    let outcome = simulate(&profile, &strategy).unwrap();

    let refis: Vec<_> = outcome
        .timeline
        .iter()
        .filter(|e| matches!(e.event, PortfolioEvent::Refinance(_)))
        .collect();
    assert_eq!(refis.len(), 1);
    assert_eq!(refis[0].period, 12);

    let snap = &outcome.snapshots[12];
    let event = &snap.events.refinancing_events[0];
    assert_eq!(event.new_ltv, dec!(0.6));
    assert!(event.cash_extracted > dec!(10000));
    assert_eq!(snap.properties[0].loan_balance, event.new_loan_amount);
    assert_eq!(snap.properties[0].last_refinanced_period, Some(12));
}

#[test]
fn test_refinance_reprices_cashflow_in_the_same_period() {
    let profile = leveraged_profile(dec!(0.5), dec!(12000), dec!(600000));
    let strategy = StrategyConfig::leveraged(12, dec!(0.5))
        .with_refinance_target(dec!(0.7))
        .with_reinvestment(false);

    let outcome = simulate(&profile, &strategy).unwrap();

    let before = &outcome.snapshots[11].properties[0];
    let snap = &outcome.snapshots[12];
    let event = &snap.events.refinancing_events[0];
    let refinanced = &snap.properties[0];
    let expected = profile.operating.effective_monthly_rental()
        - profile.operating.total_monthly_expenses()
        - event.new_monthly_payment;

    assert_eq!(refinanced.monthly_payment, event.new_monthly_payment);
    assert_eq!(refinanced.monthly_cashflow, expected);
    assert!(refinanced.monthly_cashflow < before.monthly_cashflow);
    assert_eq!(snap.monthly_cashflow, expected);
    assert_eq!(snap.annual_cashflow, expected * dec!(12));
}

// ---------------------------------------------------------------------------
// Input bounds and arithmetic overflow
// ---------------------------------------------------------------------------

#[test]
fn test_extreme_loan_term_rejected_before_running() {
    let mut profile = leveraged_profile(dec!(0.7), dec!(12000), dec!(600000));
    profile.financing.loan_term_years = Some(700);
    let strategy = StrategyConfig::leveraged(12, dec!(0.7));

    let err = simulate(&profile, &strategy).unwrap_err();
    assert!(
        matches!(&err, EstateSimError::InvalidInput { field, .. } if field == "loan_term_years"),
        "got {err}"
    );
}

#[test]
fn test_runaway_appreciation_reports_overflow() {
    let mut profile = cash_profile(dec!(1500000));
    profile.financing.appreciation_rate = Decimal::ONE;
    profile.validate().unwrap();
    let strategy = StrategyConfig::cash_only(1200);

    let err = simulate(&profile, &strategy).unwrap_err();
    assert!(matches!(err, EstateSimError::Overflow { .. }), "got {err}");
}

// ---------------------------------------------------------------------------
// Mixed strategy
// ---------------------------------------------------------------------------

#[test]
fn test_mixed_strategy_rebalances_toward_targets() {
    let profile = leveraged_profile(dec!(0.7), dec!(12000), dec!(3500000));
    let strategy = StrategyConfig::mixed(
        6,
        dec!(0.5),
        dec!(0.5),
        dec!(0.7),
        FirstPropertyType::Cash,
    )
    .unwrap();

    let outcome = simulate(&profile, &strategy).unwrap();
    let kinds: Vec<FinancingKind> = outcome
        .final_snapshot()
        .unwrap()
        .properties
        .iter()
        .map(|p| p.financing_type)
        .collect();

    assert!(kinds.len() >= 4, "bought {kinds:?}");
    assert_eq!(
        kinds[..4].to_vec(),
        vec![
            FinancingKind::Cash,
            FinancingKind::Leveraged,
            FinancingKind::Leveraged,
            FinancingKind::Cash,
        ]
    );
}

#[test]
fn test_mixed_ratios_must_sum_to_one() {
    let result = StrategyConfig::mixed(
        12,
        dec!(0.6),
        dec!(0.3),
        dec!(0.7),
        FirstPropertyType::Cash,
    );
    assert!(matches!(result, Err(EstateSimError::InvalidInput { .. })));
}

#[test]
fn test_refinancing_without_target_rejected_before_running() {
    let profile = leveraged_profile(dec!(0.5), dec!(12000), dec!(600000));
    let mut strategy = StrategyConfig::leveraged(12, dec!(0.5));
    strategy.target_refinance_ltv = None;

    assert!(simulate(&profile, &strategy).is_err());
}

// ---------------------------------------------------------------------------
// Tracking frequency
// ---------------------------------------------------------------------------

#[test]
fn test_yearly_tracking_matches_monthly_compounding() {
    let profile = cash_profile(dec!(1500000));
    let monthly = StrategyConfig::cash_only(36).with_reinvestment(false);
    let yearly = monthly.clone().with_tracking(TrackingFrequency::Yearly);

    let m = simulate(&profile, &monthly).unwrap();
    let y = simulate(&profile, &yearly).unwrap();

    assert_eq!(y.snapshots.len(), 4);
    for snap in &y.snapshots {
        let same = &m.snapshots[snap.period as usize];
        assert_eq!(snap.total_property_value, same.total_property_value);
        assert_eq!(snap.cash_available, same.cash_available);
    }
}

#[test]
fn test_comparison_tie_keeps_first_strategy() {
    let profile = cash_profile(dec!(1500000));
    // Twelve months of rent never funds a second unit, so both runs match
    let strategies = vec![
        NamedStrategy::new("Hold", StrategyConfig::cash_only(12).with_reinvestment(false)),
        NamedStrategy::new("Reinvest", StrategyConfig::cash_only(12)),
    ];

    let output = compare_strategies(&profile, &strategies).unwrap();
    let summaries = &output.result.summaries;

    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].name, "Hold");
    assert_eq!(summaries[0].portfolio, summaries[1].portfolio);
    assert_eq!(summaries[0].portfolio.property_count, 1);
    assert_eq!(output.result.best_strategy.as_deref(), Some("Hold"));
    assert!(output.warnings.is_empty());
}
