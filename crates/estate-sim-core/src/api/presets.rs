use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::request::{RefinanceFrequency, StrategyRequest};
use crate::error::EstateSimError;
use crate::strategy::{FirstPropertyType, StrategyKind};
use crate::EstateSimResult;

/// A named, ready-made strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyPreset {
    pub name: String,
    pub description: String,
    pub strategy_type: StrategyKind,
    pub config: StrategyRequest,
}

fn preset(
    name: &str,
    description: &str,
    strategy_type: StrategyKind,
    tweak: impl FnOnce(&mut StrategyRequest),
) -> StrategyPreset {
    let mut config = StrategyRequest::new(name, strategy_type.to_string());
    tweak(&mut config);
    StrategyPreset {
        name: name.to_string(),
        description: description.to_string(),
        strategy_type,
        config,
    }
}

pub fn strategy_presets() -> Vec<StrategyPreset> {
    vec![
        preset(
            "Conservative Cash",
            "Low-risk cash-only strategy with reinvestment",
            StrategyKind::CashOnly,
            |_| {},
        ),
        preset(
            "Moderate Leverage",
            "Balanced leveraged strategy with 60% LTV",
            StrategyKind::Leveraged,
            |c| {
                c.ltv_ratio = Some(dec!(0.6));
                c.interest_rate = Some(dec!(0.115));
                c.loan_term_years = Some(20);
                c.enable_refinancing = true;
                c.refinance_frequency = RefinanceFrequency::Annually;
                c.target_refinance_ltv = Some(dec!(0.5));
            },
        ),
        preset(
            "Aggressive Leverage",
            "High-growth strategy with 80% LTV",
            StrategyKind::Leveraged,
            |c| {
                c.ltv_ratio = Some(dec!(0.8));
                c.interest_rate = Some(dec!(0.125));
                c.loan_term_years = Some(20);
                c.enable_refinancing = true;
                c.refinance_frequency = RefinanceFrequency::Annually;
                c.target_refinance_ltv = Some(dec!(0.6));
            },
        ),
        preset(
            "Balanced Mixed",
            "60% leveraged, 40% cash properties",
            StrategyKind::Mixed,
            |c| {
                c.leveraged_property_ratio = Some(dec!(0.6));
                c.cash_property_ratio = Some(dec!(0.4));
                c.ltv_ratio = Some(dec!(0.7));
                c.interest_rate = Some(dec!(0.118));
                c.loan_term_years = Some(20);
                c.enable_refinancing = true;
                c.refinance_frequency = RefinanceFrequency::Annually;
                c.target_refinance_ltv = Some(dec!(0.5));
            },
        ),
        preset(
            "Conservative Mixed",
            "30% leveraged, 70% cash properties",
            StrategyKind::Mixed,
            |c| {
                c.leveraged_property_ratio = Some(dec!(0.3));
                c.cash_property_ratio = Some(dec!(0.7));
                c.ltv_ratio = Some(dec!(0.5));
                c.interest_rate = Some(dec!(0.112));
                c.loan_term_years = Some(25);
                c.first_property_type = FirstPropertyType::Cash;
            },
        ),
    ]
}

pub fn preset_by_name(name: &str) -> EstateSimResult<StrategyPreset> {
    strategy_presets()
        .into_iter()
        .find(|p| p.name == name)
        .ok_or_else(|| EstateSimError::InvalidRequest(format!("Preset '{name}' not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::request::strategy_kind_from_str;

    #[test]
    fn test_five_presets_with_consistent_kinds() {
        let presets = strategy_presets();
        assert_eq!(presets.len(), 5);
        for p in &presets {
            assert_eq!(strategy_kind_from_str(&p.config.strategy_type).unwrap(), p.strategy_type);
            assert_eq!(p.config.name, p.name);
        }
    }

    #[test]
    fn test_lookup() {
        let p = preset_by_name("Aggressive Leverage").unwrap();
        assert_eq!(p.config.ltv_ratio, Some(dec!(0.8)));
        assert!(matches!(
            preset_by_name("Reckless"),
            Err(EstateSimError::InvalidRequest(_))
        ));
    }
}
