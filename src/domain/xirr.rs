//! Annualized rate of return for cash flows made at different times.
//!
//! Solves for the constant yearly compounding rate that reconciles a set of
//! past investments with their value now. Assumes 365 days per year; leap
//! years are not special-cased.

const INITIAL_GUESS: f64 = 10.0;
const TOLERANCE: f64 = 1e-6;
const MAX_ITERATIONS: usize = 1000;
const DAYS_PER_YEAR: f64 = 365.0;

/// A single past investment: the amount put in and how long ago, in days.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CashFlow {
    pub amount: f64,
    pub age_days: u32,
}

impl CashFlow {
    pub fn new(amount: f64, age_days: u32) -> Self {
        Self { amount, age_days }
    }

    fn years(&self) -> f64 {
        f64::from(self.age_days) / DAYS_PER_YEAR
    }
}

/// Solve for the annualized rate (in percent) at which `flows` grew into
/// `current_value`, via Newton-Raphson.
///
/// `flows = [(1000, 730), (1000, 365)]` with `current_value = 6000` means two
/// investments of 1000 made two years and one year ago are now worth 6000
/// together; the answer is 100 (each doubling yearly).
///
/// Degenerate inputs short-circuit to 0.0: nothing invested, or the invested
/// total exactly equals the current value. A zero derivative or hitting the
/// iteration cap returns the best current guess rather than failing.
pub fn solve_xirr(flows: &[CashFlow], current_value: f64) -> f64 {
    let total_invested: f64 = flows.iter().map(|f| f.amount).sum();
    if total_invested == 0.0 || total_invested == current_value {
        return 0.0;
    }

    let future_value = |rate: f64| -> f64 {
        flows
            .iter()
            .map(|f| f.amount * (1.0 + rate / 100.0).powf(f.years()))
            .sum()
    };

    let mut rate = INITIAL_GUESS;
    for _ in 0..MAX_ITERATIONS {
        let residual = future_value(rate) - current_value;
        if residual.abs() < TOLERANCE {
            break;
        }

        let derivative: f64 = flows
            .iter()
            .map(|f| f.amount * f.years() * (1.0 + rate / 100.0).powf(f.years() - 1.0))
            .sum();
        if derivative == 0.0 {
            break;
        }

        rate -= residual / derivative;
    }

    rate
}
