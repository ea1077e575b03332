use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::EstateSimError;
use crate::types::{Money, Rate, MONTHS_PER_YEAR};
use crate::EstateSimResult;

const SERIES_EPSILON: Decimal = dec!(0.00000000000001);
const MAX_EXP_TERMS: u32 = 40;
const MAX_LN_ITERATIONS: u32 = 30;

/// Compute (1 + r)^n via iterative multiplication (avoids Decimal::powd drift).
///
/// Errors instead of panicking when the power leaves the Decimal range.
pub fn compound(rate: Rate, n: u32) -> EstateSimResult<Decimal> {
    let mut result = Decimal::ONE;
    let factor = Decimal::ONE + rate;
    for _ in 0..n {
        result = result
            .checked_mul(factor)
            .ok_or_else(|| EstateSimError::overflow(format!("compound({rate}, {n})")))?;
    }
    Ok(result)
}

/// Level monthly payment on an amortising loan.
///
/// `payment = L * r(1+r)^n / ((1+r)^n - 1)` with `r = annual_rate / 12` and
/// `n = term_years * 12`. A zero rate degenerates to straight-line repayment
/// `L / n`.
pub fn monthly_payment(
    loan_amount: Money,
    annual_rate: Rate,
    term_years: u32,
) -> EstateSimResult<Money> {
    if term_years == 0 {
        return Err(EstateSimError::invalid(
            "loan_term_years",
            "Loan term must be at least 1 year",
        ));
    }
    if loan_amount <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }

    let n = term_years * MONTHS_PER_YEAR;
    let monthly_rate = annual_rate / Decimal::from(MONTHS_PER_YEAR);

    if monthly_rate.is_zero() {
        return Ok(loan_amount / Decimal::from(n));
    }

    let factor = compound(monthly_rate, n)?;
    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Err(EstateSimError::invalid(
            "interest_rate",
            "Annuity factor collapsed to zero",
        ));
    }

    loan_amount
        .checked_mul(monthly_rate)
        .and_then(|interest| interest.checked_mul(factor))
        .map(|scaled| scaled / denominator)
        .ok_or_else(|| EstateSimError::overflow("monthly payment"))
}

/// e^x via Taylor series with argument halving for |x| >= 0.5.
pub fn decimal_exp(x: Decimal) -> Decimal {
    let mut reduced = x;
    let mut halvings = 0u32;
    while reduced.abs() >= dec!(0.5) {
        reduced /= dec!(2);
        halvings += 1;
    }

    let mut sum = Decimal::ONE;
    let mut term = Decimal::ONE;
    for n in 1..=MAX_EXP_TERMS {
        term *= reduced / Decimal::from(n);
        sum += term;
        if term.abs() < SERIES_EPSILON {
            break;
        }
    }

    for _ in 0..halvings {
        sum *= sum;
    }
    sum
}

/// Natural logarithm via Newton's method on e^y - x = 0.
/// Non-positive inputs are undefined and return zero.
pub fn decimal_ln(x: Decimal) -> Decimal {
    if x <= Decimal::ZERO || x == Decimal::ONE {
        return Decimal::ZERO;
    }

    let mut guess = x - Decimal::ONE;
    if guess.abs() > dec!(2) {
        // Count factors of e to land close to the root
        guess = Decimal::ZERO;
        let mut temp = x;
        let e_approx = dec!(2.718281828);
        if temp > Decimal::ONE {
            while temp > e_approx {
                temp /= e_approx;
                guess += Decimal::ONE;
            }
        } else {
            while temp < Decimal::ONE / e_approx {
                temp *= e_approx;
                guess -= Decimal::ONE;
            }
        }
        guess += temp - Decimal::ONE;
    }

    for _ in 0..MAX_LN_ITERATIONS {
        let exp_guess = decimal_exp(guess);
        if exp_guess.is_zero() {
            break;
        }
        let delta = (exp_guess - x) / exp_guess;
        guess -= delta;
        if delta.abs() < SERIES_EPSILON {
            break;
        }
    }

    guess
}

/// Annualised growth rate `(current / original)^(1 / years) - 1`.
///
/// `months_held` is converted to fractional years. Returns zero when nothing
/// has been held yet or the original value is not positive.
pub fn annualized_growth(current: Money, original: Money, months_held: u32) -> Rate {
    if months_held == 0 || original <= Decimal::ZERO || current <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let years = Decimal::from(months_held) / Decimal::from(MONTHS_PER_YEAR);
    let ratio = current / original;
    decimal_exp(decimal_ln(ratio) / years) - Decimal::ONE
}
