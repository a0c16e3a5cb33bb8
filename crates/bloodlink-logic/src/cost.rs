//! Connector cost arithmetic.
//!
//! A connector is charged per tenth of a world unit: the segment length is
//! rounded to one decimal place and then multiplied by the per-unit blood cost
//! from the game state table. The pool holds whole units, so the amount
//! actually debited drops the fractional part of the cost.

/// Round to one decimal place (half away from zero).
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Blood cost of a connector of the given length.
///
/// Negative or NaN inputs are clamped to zero, so the result is never
/// negative and never decreases as `distance` grows.
pub fn connection_cost(distance: f64, cost_per_unit: f64) -> f64 {
    round_tenth(distance.max(0.0)) * cost_per_unit.max(0.0)
}

/// Whole blood units taken from the pool for a cost.
pub fn debit_amount(cost: f64) -> i64 {
    // `as` saturates, NaN maps to 0
    cost.max(0.0).trunc() as i64
}

/// Whether a connector may attempt a commit this tick.
pub fn is_feasible(valid: bool, available: i64, cost: f64) -> bool {
    valid && available as f64 >= cost
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_tenth() {
        assert_eq!(round_tenth(2.96), 3.0);
        assert_eq!(round_tenth(2.94), 2.9);
        assert_eq!(round_tenth(0.0), 0.0);
        assert_eq!(round_tenth(12.349), 12.3);
    }

    #[test]
    fn test_cost_scales_with_rounded_length() {
        assert_eq!(connection_cost(3.0, 2.0), 6.0);
        assert_eq!(connection_cost(3.04, 2.0), 6.0);
        assert!((connection_cost(1.25, 4.0) - 5.2).abs() < 1e-9);
    }

    #[test]
    fn test_cost_never_negative() {
        assert_eq!(connection_cost(-4.0, 2.0), 0.0);
        assert_eq!(connection_cost(4.0, -2.0), 0.0);
        assert_eq!(connection_cost(f64::NAN, 2.0), 0.0);
    }

    #[test]
    fn test_cost_monotonic_in_distance() {
        let mut last = 0.0;
        for step in 0..2000 {
            let distance = step as f64 * 0.013;
            let cost = connection_cost(distance, 1.7);
            assert!(cost >= last, "cost dropped at distance {}", distance);
            last = cost;
        }
    }

    #[test]
    fn test_debit_amount_drops_fraction() {
        assert_eq!(debit_amount(6.0), 6);
        assert_eq!(debit_amount(6.9), 6);
        assert_eq!(debit_amount(-1.0), 0);
        assert_eq!(debit_amount(f64::NAN), 0);
    }

    #[test]
    fn test_feasibility() {
        assert!(is_feasible(true, 10, 6.0));
        assert!(is_feasible(true, 6, 6.0));
        assert!(!is_feasible(true, 5, 6.0));
        assert!(!is_feasible(false, 10, 6.0));
    }
}
