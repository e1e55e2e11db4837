//! Ledger primitive types: fixed-point amounts and little-endian hashes

use crate::error::{RelayerError, RelayerResult};

use bigdecimal::{BigDecimal, ToPrimitive};
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

/// Raw units per whole coin
const D: i64 = 100_000_000;

/// Fixed-point amount with 8 decimal places
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Fixed8(i64);

impl Fixed8 {
    pub const ZERO: Fixed8 = Fixed8(0);

    /// Build from the raw 10^-8 unit count
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Build from a whole number of coins
    pub const fn from_units(units: i64) -> Self {
        Self(units * D)
    }

    pub fn raw(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, rhs: Fixed8) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Fixed8) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Round up to the next whole unit; `None` if that leaves the i64 range
    pub fn checked_ceiling(self) -> Option<Self> {
        let remainder = self.0 % D;
        if remainder > 0 {
            (self.0 - remainder).checked_add(D).map(Self)
        } else {
            Some(Self(self.0 - remainder))
        }
    }
}

impl FromStr for Fixed8 {
    type Err = RelayerError;

    fn from_str(s: &str) -> RelayerResult<Self> {
        let decimal = BigDecimal::from_str(s.trim())
            .map_err(|e| RelayerError::Parse(format!("invalid amount {:?}: {}", s, e)))?;
        let scaled = decimal * BigDecimal::from(D);
        if scaled.with_scale(0) != scaled {
            return Err(RelayerError::Parse(format!(
                "amount {:?} has more than 8 decimal places",
                s
            )));
        }
        scaled
            .to_i64()
            .map(Fixed8)
            .ok_or_else(|| RelayerError::Parse(format!("amount {:?} out of range", s)))
    }
}

impl fmt::Display for Fixed8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / D as u64;
        let frac = abs % D as u64;
        if frac == 0 {
            write!(f, "{}{}", sign, whole)
        } else {
            let digits = format!("{:08}", frac);
            write!(f, "{}{}.{}", sign, whole, digits.trim_end_matches('0'))
        }
    }
}

impl Add for Fixed8 {
    type Output = Fixed8;

    fn add(self, rhs: Fixed8) -> Fixed8 {
        Fixed8(self.0 + rhs.0)
    }
}

impl AddAssign for Fixed8 {
    fn add_assign(&mut self, rhs: Fixed8) {
        self.0 += rhs.0;
    }
}

impl Sub for Fixed8 {
    type Output = Fixed8;

    fn sub(self, rhs: Fixed8) -> Fixed8 {
        Fixed8(self.0 - rhs.0)
    }
}

impl SubAssign for Fixed8 {
    fn sub_assign(&mut self, rhs: Fixed8) {
        self.0 -= rhs.0;
    }
}

impl Sum for Fixed8 {
    fn sum<I: Iterator<Item = Fixed8>>(iter: I) -> Fixed8 {
        iter.fold(Fixed8::ZERO, |acc, v| acc + v)
    }
}

impl<'a> Sum<&'a Fixed8> for Fixed8 {
    fn sum<I: Iterator<Item = &'a Fixed8>>(iter: I) -> Fixed8 {
        iter.copied().sum()
    }
}

// Nodes report amounts both as JSON strings and as bare numbers.
impl<'de> Deserialize<'de> for Fixed8 {
    fn deserialize<De>(deserializer: De) -> Result<Self, De::Error>
    where
        De: Deserializer<'de>,
    {
        struct Fixed8Visitor;

        impl<'de> Visitor<'de> for Fixed8Visitor {
            type Value = Fixed8;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a decimal amount as string or number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Fixed8, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Fixed8, E> {
                v.checked_mul(D)
                    .map(Fixed8)
                    .ok_or_else(|| E::custom("amount out of range"))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Fixed8, E> {
                i64::try_from(v)
                    .map_err(E::custom)
                    .and_then(|v| self.visit_i64(v))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Fixed8, E> {
                self.visit_str(&v.to_string())
            }
        }

        deserializer.deserialize_any(Fixed8Visitor)
    }
}

/// Little-endian hash types displayed as reversed, `0x`-prefixed hex
macro_rules! le_hash {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name([u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub fn from_le_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub fn from_slice(bytes: &[u8]) -> RelayerResult<Self> {
                let bytes: [u8; $len] = bytes.try_into().map_err(|_| {
                    RelayerError::Parse(format!(
                        "{} expects {} bytes, got {}",
                        stringify!($name),
                        $len,
                        bytes.len()
                    ))
                })?;
                Ok(Self(bytes))
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = RelayerError;

            fn from_str(s: &str) -> RelayerResult<Self> {
                let trimmed = s.strip_prefix("0x").unwrap_or(s);
                let mut bytes = hex::decode(trimmed).map_err(|e| {
                    RelayerError::Parse(format!("invalid {} {:?}: {}", stringify!($name), s, e))
                })?;
                bytes.reverse();
                Self::from_slice(&bytes)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let mut bytes = self.0;
                bytes.reverse();
                write!(f, "0x{}", hex::encode(bytes))
            }
        }
    };
}

le_hash!(
    /// 160-bit script hash
    UInt160,
    20
);

le_hash!(
    /// 256-bit transaction or asset hash
    UInt256,
    32
);
