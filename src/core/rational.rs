/// Exact rational number used for intermediate share arithmetic.
///
/// Always normalized: the denominator is positive and shares no factor with
/// the numerator. Inputs are products of `i64` minor-unit amounts and `i64`
/// weights, so `i128` cannot overflow for a single share.
///
/// # Examples
///
/// ```
/// use split_engine::core::rational::Rational;
///
/// let third = Rational::new(100, 3).unwrap();
/// assert_eq!(third.floor(), 33);
/// assert_eq!(third.ceil(), 34);
///
/// let negative = Rational::new(-100, 3).unwrap();
/// assert_eq!(negative.round_toward_zero(), -33);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    numer: i128,
    denom: i128,
}

impl Rational {
    /// Build `numer / denom`. Returns `None` when `denom` is zero.
    pub fn new(numer: i128, denom: i128) -> Option<Self> {
        if denom == 0 {
            return None;
        }
        let (mut numer, mut denom) = (numer, denom);
        if denom < 0 {
            numer = -numer;
            denom = -denom;
        }
        let g = gcd(numer.unsigned_abs(), denom.unsigned_abs()) as i128;
        Some(Self {
            numer: numer / g,
            denom: denom / g,
        })
    }

    pub fn numer(&self) -> i128 {
        self.numer
    }

    pub fn denom(&self) -> i128 {
        self.denom
    }

    pub fn is_negative(&self) -> bool {
        self.numer < 0
    }

    /// Largest integer not greater than this value.
    pub fn floor(&self) -> i128 {
        self.numer.div_euclid(self.denom)
    }

    /// Smallest integer not less than this value.
    pub fn ceil(&self) -> i128 {
        -(-self.numer).div_euclid(self.denom)
    }

    /// `floor` for non-negative values, `ceil` for negative ones.
    ///
    /// The rounded magnitude never exceeds the exact magnitude, so a rounded
    /// share can never carry the opposite sign of the exact share.
    pub fn round_toward_zero(&self) -> i128 {
        if self.is_negative() {
            self.ceil()
        } else {
            self.floor()
        }
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    if a == 0 {
        1
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        let r = Rational::new(6, -4).unwrap();
        assert_eq!(r.numer(), -3);
        assert_eq!(r.denom(), 2);
        assert_eq!(Rational::new(0, -7).unwrap(), Rational::new(0, 1).unwrap());
    }

    #[test]
    fn test_zero_denominator() {
        assert!(Rational::new(1, 0).is_none());
    }

    #[test]
    fn test_floor_and_ceil() {
        let r = Rational::new(-7, 2).unwrap();
        assert_eq!(r.floor(), -4);
        assert_eq!(r.ceil(), -3);
        let r = Rational::new(7, 2).unwrap();
        assert_eq!(r.floor(), 3);
        assert_eq!(r.ceil(), 4);
        let exact = Rational::new(10, 2).unwrap();
        assert_eq!(exact.denom(), 1);
        assert_eq!(exact.floor(), 5);
        assert_eq!(exact.ceil(), 5);
    }

    #[test]
    fn test_round_toward_zero_keeps_sign() {
        assert_eq!(Rational::new(2, 3).unwrap().round_toward_zero(), 0);
        assert_eq!(Rational::new(-2, 3).unwrap().round_toward_zero(), 0);
        assert_eq!(Rational::new(-1000, 3).unwrap().round_toward_zero(), -333);
    }

    #[test]
    fn test_large_products_stay_exact() {
        let r = Rational::new(i64::MAX as i128 * 9_999, 10_000).unwrap();
        assert_eq!(r.floor(), (i64::MAX as i128 * 9_999) / 10_000);
        assert!(r.floor() < i64::MAX as i128);
    }
}
