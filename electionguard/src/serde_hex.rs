// Wire conventions for ballots: field elements are uppercase hex, plain integers are lowercase
// hex, and booleans are "00" or "01".
use crate::*;
use num_bigint::BigUint;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

fn parse_hex_int<E: DeError>(s: &str) -> Result<BigUint, E> {
    BigUint::parse_bytes(s.as_bytes(), 16)
        .ok_or_else(|| E::custom(format!("invalid hexadecimal: {}", s)))
}

impl Serialize for ElementModQ {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ElementModQ {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        int_to_q(parse_hex_int(&s)?).ok_or_else(|| D::Error::custom("element out of range for Q"))
    }
}

impl Serialize for ElementModP {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ElementModP {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        int_to_p(parse_hex_int(&s)?).ok_or_else(|| D::Error::custom("element out of range for P"))
    }
}

// a single-purpose module for use in `#[serde(with)]`
pub mod hex_u64 {
    use super::*;

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:x}", value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let s = String::deserialize(deserializer)?;
        u64::from_str_radix(&s, 16).map_err(|e| D::Error::custom(format!("{}: {}", s, e)))
    }
}

// a single-purpose module for use in `#[serde(with)]`
pub mod hex_bool {
    use super::*;

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "01" } else { "00" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match String::deserialize(deserializer)?.as_str() {
            "00" => Ok(false),
            "01" => Ok(true),
            other => Err(D::Error::custom(format!("invalid boolean: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Wire {
        element: ElementModQ,
        #[serde(with = "hex_u64")]
        sequence_order: u64,
        #[serde(with = "hex_bool")]
        flag: bool,
        timestamp: u64,
        nonce: Option<ElementModQ>,
    }

    #[test]
    fn test_wire_format() {
        let wire = Wire {
            element: ElementModQ::from(0x26f5),
            sequence_order: 26,
            flag: true,
            timestamp: 1635015400,
            nonce: None,
        };

        let json = serde_json::to_string(&wire).unwrap();
        assert_eq!(
            json,
            r#"{"element":"26F5","sequence_order":"1a","flag":"01","timestamp":1635015400,"nonce":null}"#
        );
        assert_eq!(serde_json::from_str::<Wire>(&json).unwrap(), wire);
    }

    #[test]
    fn test_padded_input() {
        let json = r#"{"element":"013A","sequence_order":"00","flag":"00","timestamp":0,"nonce":"9DA6"}"#;
        let wire: Wire = serde_json::from_str(json).unwrap();
        assert_eq!(wire.element, ElementModQ::from(0x13a));
        assert_eq!(wire.sequence_order, 0);
        assert!(!wire.flag);
        assert_eq!(wire.nonce, Some(ElementModQ::from(0x9da6)));
    }

    #[test]
    fn test_rejects_bad_input() {
        let bad_bool = r#"{"element":"01","sequence_order":"00","flag":"true","timestamp":0,"nonce":null}"#;
        assert!(serde_json::from_str::<Wire>(bad_bool).is_err());

        let bad_hex = r#"{"element":"XYZ","sequence_order":"00","flag":"00","timestamp":0,"nonce":null}"#;
        assert!(serde_json::from_str::<Wire>(bad_hex).is_err());

        let too_big = format!(
            r#"{{"element":"{:X}","sequence_order":"00","flag":"00","timestamp":0,"nonce":null}}"#,
            *Q
        );
        assert!(serde_json::from_str::<Wire>(&too_big).is_err());
    }

    #[test]
    fn test_element_mod_p() {
        let element = ElementModP::generator();
        let json = serde_json::to_string(&element).unwrap();
        assert_eq!(serde_json::from_str::<ElementModP>(&json).unwrap(), element);
    }
}
