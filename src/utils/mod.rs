use crate::core::error::{GatewayError, GatewayResult};
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Serde adapter keeping base-unit amounts as decimal strings on the wire,
/// the format every aggregator API exchanges amounts in.
pub mod serde_amount {
    use num_bigint::BigUint;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(amount: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let raw = String::deserialize(deserializer)?;
        BigUint::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

/// Parse an integer-string amount in token base units.
pub fn parse_amount(raw: &str) -> GatewayResult<BigUint> {
    BigUint::from_str(raw.trim()).map_err(|_| GatewayError::InvalidAmount(raw.to_string()))
}

/// Price of the buy token in sell tokens, normalized by token decimals.
/// Falls back to zero for a zero sell amount rather than dividing by it.
pub fn decimal_price(
    sell_amount: &BigUint,
    sell_decimals: u8,
    buy_amount: &BigUint,
    buy_decimals: u8,
) -> Decimal {
    if sell_amount.is_zero() {
        return Decimal::ZERO;
    }
    let sell = sell_amount.to_f64().unwrap_or(f64::MAX) / 10f64.powi(sell_decimals as i32);
    let buy = buy_amount.to_f64().unwrap_or(f64::MAX) / 10f64.powi(buy_decimals as i32);
    Decimal::from_f64(buy / sell).unwrap_or(Decimal::ZERO)
}

/// Render a base-unit amount as a human-readable decimal string.
pub fn format_units(amount: &BigUint, decimals: u8) -> String {
    let raw = amount.to_string();
    if decimals == 0 {
        return raw;
    }
    let decimals = decimals as usize;
    let padded = format!("{:0>width$}", raw, width = decimals + 1);
    let split = padded.len() - decimals;
    let (integer, fraction) = padded.split_at(split);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        integer.to_string()
    } else {
        format!("{}.{}", integer, fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::One;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1000").unwrap(), BigUint::from(1000u32));
        assert_eq!(
            parse_amount("1000000000000000000").unwrap(),
            BigUint::from(10u32).pow(18)
        );
        assert!(parse_amount("").is_err());
        assert!(parse_amount("-5").is_err());
        assert!(parse_amount("1.5").is_err());
    }

    #[test_case(1_500_000, 6, "1.5" ; "trims trailing zeros")]
    #[test_case(25, 6, "0.000025" ; "pads small amounts")]
    #[test_case(42, 0, "42" ; "zero decimals")]
    fn test_format_units_cases(raw: u64, decimals: u8, expected: &str) {
        assert_eq!(format_units(&BigUint::from(raw), decimals), expected);
    }

    #[test]
    fn test_decimal_price() {
        // Sell 1e18 of an 18-decimal token for 2000e6 of a 6-decimal token
        let sell = BigUint::from(10u32).pow(18);
        let buy = BigUint::from(2000u32) * BigUint::from(10u32).pow(6);
        let price = decimal_price(&sell, 18, &buy, 6);
        assert_eq!(price, Decimal::from(2000));

        // Zero sell amount never divides
        assert_eq!(decimal_price(&BigUint::zero(), 18, &buy, 6), Decimal::ZERO);
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(&BigUint::from(10u32).pow(18), 18), "1");
        assert_eq!(format_units(&BigUint::one(), 18), "0.000000000000000001");
    }

    #[test]
    fn test_serde_amount_round_trip() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Wrapper {
            #[serde(with = "super::serde_amount")]
            amount: BigUint,
        }

        let wrapper = Wrapper {
            amount: BigUint::from(10u32).pow(30),
        };
        let json = serde_json::to_string(&wrapper).unwrap();
        assert_eq!(json, "{\"amount\":\"1000000000000000000000000000000\"}");

        let back: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(back.amount, wrapper.amount);
    }
}
