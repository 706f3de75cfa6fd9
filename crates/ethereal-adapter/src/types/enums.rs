/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust enums with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize, Serializer};
use serde::de::{self, Deserializer};

/// Order side, wire-encoded as an integer: 0 = buy, 1 = sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Serialize for Side {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value: u8 = match self {
            Side::Buy => 0,
            Side::Sell => 1,
        };
        serializer.serialize_u8(value)
    }
}

impl<'de> Deserialize<'de> for Side {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(Side::Buy),
            1 => Ok(Side::Sell),
            other => Err(de::Error::custom(format!("unknown side code {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Limit,
    Market,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeInForce {
    Gtc,
    Ioc,
    Fok,
    /// Good-Till-Date: the only time-in-force the quoting core places.
    Gtd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireOrderStatus {
    New,
    Open,
    PartiallyFilled,
    Filled,
    #[serde(alias = "canceled")]
    Cancelled,
    Expired,
    Rejected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_round_trips_as_integer() {
        let buy = serde_json::to_string(&Side::Buy).unwrap();
        assert_eq!(buy, "0");
        let sell: Side = serde_json::from_str("1").unwrap();
        assert_eq!(sell, Side::Sell);
    }

    #[test]
    fn unknown_side_code_errors() {
        let result: Result<Side, _> = serde_json::from_str("7");
        assert!(result.is_err());
    }

    #[test]
    fn time_in_force_gtd_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&TimeInForce::Gtd).unwrap(), "\"GTD\"");
    }
}
