use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// Used for every quantity the simulation computes with — cycle progress,
/// prices, cost multipliers. `f64` is allowed only at data-file
/// initialization and display boundaries.
pub type Fixed64 = I32F32;

/// Whole credits. All money amounts are integral; fixed-point products are
/// floored on conversion.
pub type Money = u64;

/// Convert an f64 to Fixed64. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display, never in sim loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Floor a fixed-point value to whole credits. Negative values floor to 0.
#[inline]
pub fn floor_to_money(v: Fixed64) -> Money {
    v.to_num::<i64>().max(0) as Money
}

/// Exponentiation by squaring. Returns `None` on overflow.
pub fn checked_pow(base: Fixed64, mut exp: u32) -> Option<Fixed64> {
    let mut result = Fixed64::from_num(1);
    let mut factor = base;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result.checked_mul(factor)?;
        }
        exp >>= 1;
        if exp > 0 {
            factor = factor.checked_mul(factor)?;
        }
    }
    Some(result)
}

/// `floor(base · factor^owned)`, saturating to `Money::MAX` when the product
/// leaves the representable range. A saturated cost is simply unaffordable.
pub fn scale_cost(base: Money, factor: Fixed64, owned: u32) -> Money {
    let Some(base_fixed) = Fixed64::checked_from_num(base) else {
        return Money::MAX;
    };
    match checked_pow(factor, owned).and_then(|m| base_fixed.checked_mul(m)) {
        Some(total) => floor_to_money(total),
        None => Money::MAX,
    }
}

/// `floor(amount · rate)`, saturating. Used for refunds and rate-scaled fees.
pub fn scale_money(amount: Money, rate: Fixed64) -> Money {
    let Some(amount_fixed) = Fixed64::checked_from_num(amount) else {
        return Money::MAX;
    };
    match amount_fixed.checked_mul(rate) {
        Some(total) => floor_to_money(total),
        None => Money::MAX,
    }
}

/// `floor(price · quantity)`, saturating. The revenue of a sale.
pub fn sale_revenue(price: Fixed64, quantity: u32) -> Money {
    let Some(qty) = Fixed64::checked_from_num(quantity) else {
        return Money::MAX;
    };
    match price.checked_mul(qty) {
        Some(total) => floor_to_money(total),
        None => Money::MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_to_money_truncates() {
        assert_eq!(floor_to_money(f64_to_fixed64(12.99)), 12);
        assert_eq!(floor_to_money(f64_to_fixed64(12.0)), 12);
        assert_eq!(floor_to_money(f64_to_fixed64(-3.5)), 0);
    }

    #[test]
    fn checked_pow_basics() {
        let two = f64_to_fixed64(2.0);
        assert_eq!(checked_pow(two, 0), Some(f64_to_fixed64(1.0)));
        assert_eq!(checked_pow(two, 1), Some(two));
        assert_eq!(checked_pow(two, 10), Some(f64_to_fixed64(1024.0)));
    }

    #[test]
    fn checked_pow_fractional_base() {
        let half = f64_to_fixed64(0.5);
        assert_eq!(checked_pow(half, 2), Some(f64_to_fixed64(0.25)));
    }

    #[test]
    fn checked_pow_overflow_is_none() {
        let two = f64_to_fixed64(2.0);
        assert!(checked_pow(two, 64).is_none());
    }

    #[test]
    fn scale_cost_matches_geometric_growth() {
        // 100 * 1.15^2 = 132.25 -> 132
        let factor = f64_to_fixed64(1.15);
        assert_eq!(scale_cost(100, factor, 0), 100);
        assert_eq!(scale_cost(100, factor, 1), 114);
        assert_eq!(scale_cost(100, factor, 2), 132);
    }

    #[test]
    fn scale_cost_saturates_on_overflow() {
        let factor = f64_to_fixed64(2.0);
        assert_eq!(scale_cost(1000, factor, 200), Money::MAX);
        assert_eq!(scale_cost(Money::MAX, factor, 1), Money::MAX);
    }

    #[test]
    fn scale_money_floors() {
        assert_eq!(scale_money(333, f64_to_fixed64(0.5)), 166);
        assert_eq!(scale_money(0, f64_to_fixed64(0.5)), 0);
    }

    #[test]
    fn sale_revenue_floors_per_batch_not_per_item() {
        // 3 items at 7.5 each: floor(22.5) = 22, not 3 * floor(7.5) = 21.
        assert_eq!(sale_revenue(f64_to_fixed64(7.5), 3), 22);
    }

    #[test]
    fn fixed64_determinism() {
        let a = f64_to_fixed64(1.0 / 3.0);
        let b = f64_to_fixed64(1.0 / 3.0);
        assert_eq!(a, b);
    }
}
