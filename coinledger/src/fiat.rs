use crate::errors::CoinLedgerError;
use crate::models::Quote;
use num_bigint::BigUint;
use num_traits::{FromPrimitive, ToPrimitive};

/// Fractional token amounts above 10^6 are scaled down by this many digits
/// before being multiplied by the price.
const FRACTIONAL_LIMIT_FACTOR: u32 = 6;

/// Ledger milliunits per cent.
const MILLIUNITS_PER_CENT: i64 = 10;

/// Converts a raw token balance into cents at the given quote.
///
/// The balance is split into whole tokens and a fractional remainder. Both are priced with
/// integer math except for the `cents_ratio` product, which is truncated. The fractional
/// part is rescaled when it exceeds 10^6 to bound the intermediate products, so the result
/// is a floor of the exact value, never an overestimate.
pub fn as_fiat(balance: &BigUint, decimals: u32, quote: &Quote) -> BigUint {
    if decimals == 0 {
        return fiat_value(balance, quote);
    }

    let mut divisor = BigUint::from(10u32).pow(decimals);
    let mut fractional = balance % &divisor;
    let whole = (balance - &fractional) / &divisor;

    let limit = BigUint::from(10u32).pow(FRACTIONAL_LIMIT_FACTOR);
    if fractional > limit {
        fractional /= &limit;
        divisor = BigUint::from(10u32).pow(decimals - FRACTIONAL_LIMIT_FACTOR);
    }

    let whole_fiat = fiat_value(&whole, quote);
    let fractional_fiat = fiat_value(&fractional, quote);
    whole_fiat + fractional_fiat / divisor
}

fn fiat_value(amount: &BigUint, quote: &Quote) -> BigUint {
    let dollars = amount * quote.whole_dollars * 100u32;
    let cents = amount.to_f64()
        .map(|a| quote.cents_ratio * a * 100.0)
        .and_then(|c| BigUint::from_f64(c.trunc()))
        .unwrap_or_default();
    dollars + cents
}

/// Cents to the ledger's milliunits (1000 per dollar).
pub fn to_milliunits(cents: &BigUint) -> Result<i64, CoinLedgerError> {
    cents.to_i64()
        .and_then(|c| c.checked_mul(MILLIUNITS_PER_CENT))
        .ok_or_else(|| CoinLedgerError::Overflow(format!("{} cents in milliunits", cents)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fiat(balance: u64, decimals: u32, whole_dollars: u64, cents_ratio: f64) -> u64 {
        as_fiat(&BigUint::from(balance), decimals, &Quote::new(whole_dollars, cents_ratio))
            .to_u64()
            .unwrap()
    }

    #[test]
    fn test_token_decimals() {
        assert_eq!(1296225, fiat(12345, 0, 1, 0.05), "decimals of zero");
        assert_eq!(129622, fiat(12345, 1, 1, 0.05), "decimals of one");
        assert_eq!(12962, fiat(12345, 2, 1, 0.05), "decimals of two");
        assert_eq!(1296, fiat(12345, 3, 1, 0.05), "decimals of three");
    }

    #[test]
    fn test_dollar_rate() {
        assert_eq!(4938250, fiat(98765, 0, 0, 0.5), "dollar rate of zero");
        assert_eq!(14814750, fiat(98765, 0, 1, 0.5), "dollar rate of one");
        assert_eq!(24691250, fiat(98765, 0, 2, 0.5), "dollar rate of two");
    }

    #[test]
    fn test_sub_cent_price() {
        assert_eq!(9881438, fiat(98765, 0, 1, 0.0005));
    }

    #[test]
    fn test_realistic_eth_balance() {
        assert_eq!(601043, fiat(2410555693229900000, 18, 2493, 0.38));
    }

    #[test]
    fn test_balance_beyond_u64() {
        // 100,000,000,000 whole tokens with 18 decimals at $2
        let balance = BigUint::from(10u32).pow(29);
        let cents = as_fiat(&balance, 18, &Quote::new(2, 0.0));
        assert_eq!(BigUint::from(20_000_000_000_000u64), cents);
    }

    #[test]
    fn test_zero_balance() {
        assert_eq!(0, fiat(0, 18, 2493, 0.38));
    }

    #[test]
    fn test_whole_dollars_match_exact_value() {
        let balances = [0u64, 1, 999_999, 1_000_001, 12345, 98765, 2410555693229900000, u64::MAX];
        let prices = [0u64, 1, 7, 2493, 65000];
        for decimals in 0..=18u32 {
            for balance in balances {
                for price in prices {
                    let cents = as_fiat(&BigUint::from(balance), decimals, &Quote::new(price, 0.0));
                    let dollars = cents / 100u32;
                    let exact = BigUint::from(balance) * price / BigUint::from(10u32).pow(decimals);
                    assert!(dollars <= exact, "{} at {} decimals, ${}", balance, decimals, price);
                    // below 10^6 the fraction is never rescaled; above it at most 10^6 units are dropped
                    let tolerance = if decimals <= FRACTIONAL_LIMIT_FACTOR { 0 } else { price / 10 + 1 };
                    assert!(&exact - &dollars <= BigUint::from(tolerance), "{} at {} decimals, ${}", balance, decimals, price);
                }
            }
        }
    }

    #[test]
    fn test_to_milliunits() {
        assert_eq!(6010430, to_milliunits(&BigUint::from(601043u32)).unwrap());
        assert!(to_milliunits(&BigUint::from(u64::MAX)).is_err());
    }
}
