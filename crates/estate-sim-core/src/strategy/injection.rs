use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::EstateSimError;
use crate::types::{Money, Period};
use crate::EstateSimResult;

/// Cadence of an additional capital injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionFrequency {
    Monthly,
    Quarterly,
    Yearly,
    FiveYearly,
    OneTime,
}

impl InjectionFrequency {
    /// Interval in periods for recurring cadences; `None` for one-time.
    pub fn interval(&self) -> Option<Period> {
        match self {
            InjectionFrequency::Monthly => Some(1),
            InjectionFrequency::Quarterly => Some(3),
            InjectionFrequency::Yearly => Some(12),
            InjectionFrequency::FiveYearly => Some(60),
            InjectionFrequency::OneTime => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InjectionFrequency::Monthly => "monthly",
            InjectionFrequency::Quarterly => "quarterly",
            InjectionFrequency::Yearly => "yearly",
            InjectionFrequency::FiveYearly => "five_yearly",
            InjectionFrequency::OneTime => "one_time",
        }
    }
}

impl fmt::Display for InjectionFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn default_start_period() -> Period {
    1
}

/// A scheduled source of extra capital.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalInjectionRule {
    pub amount: Money,
    pub frequency: InjectionFrequency,
    #[serde(default = "default_start_period")]
    pub start_period: Period,
    /// Inclusive last period; `None` runs until the horizon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_period: Option<Period>,
    /// Explicit trigger periods for one-time injections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specific_periods: Option<Vec<Period>>,
}

impl CapitalInjectionRule {
    pub fn new(amount: Money, frequency: InjectionFrequency) -> Self {
        CapitalInjectionRule {
            amount,
            frequency,
            start_period: default_start_period(),
            end_period: None,
            specific_periods: None,
        }
    }

    /// One-time injection firing at each of `periods`.
    pub fn one_time_at(amount: Money, periods: Vec<Period>) -> Self {
        CapitalInjectionRule {
            specific_periods: Some(periods),
            ..CapitalInjectionRule::new(amount, InjectionFrequency::OneTime)
        }
    }

    pub fn starting(mut self, period: Period) -> Self {
        self.start_period = period;
        self
    }

    pub fn ending(mut self, period: Period) -> Self {
        self.end_period = Some(period);
        self
    }

    /// Whether this rule injects capital in `period`.
    pub fn fires_in(&self, period: Period) -> bool {
        if period < self.start_period {
            return false;
        }
        if self.end_period.is_some_and(|end| period > end) {
            return false;
        }

        match self.frequency.interval() {
            None => match &self.specific_periods {
                Some(periods) => periods.contains(&period),
                None => period == self.start_period,
            },
            Some(interval) => (period - self.start_period) % interval == 0,
        }
    }

    pub fn source_label(&self) -> &'static str {
        self.frequency.label()
    }

    pub fn validate(&self, index: usize) -> EstateSimResult<()> {
        let field = format!("capital_injections[{index}]");
        if self.amount < Decimal::ZERO {
            return Err(EstateSimError::invalid(&field, "Injection amount cannot be negative"));
        }
        if self.start_period == 0 {
            return Err(EstateSimError::invalid(
                &field,
                "Injections start at period 1 or later",
            ));
        }
        if let Some(end) = self.end_period {
            if end < self.start_period {
                return Err(EstateSimError::invalid(
                    &field,
                    format!("end_period {end} precedes start_period {}", self.start_period),
                ));
            }
        }
        if self.specific_periods.is_some() && self.frequency != InjectionFrequency::OneTime {
            return Err(EstateSimError::invalid(
                &field,
                "specific_periods only apply to one-time injections",
            ));
        }
        Ok(())
    }
}

/// Rules firing in `period`, in configuration order.
pub fn due_injections(
    rules: &[CapitalInjectionRule],
    period: Period,
) -> impl Iterator<Item = &CapitalInjectionRule> {
    rules.iter().filter(move |rule| rule.fires_in(period))
}
