/// Type-safe wrappers for domain identifiers
///
/// Identifiers are validated at construction time so that nothing downstream
/// has to re-check a raw string.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::constants::{FIRST_CYCLE, ID_LENGTH};
use crate::errors::{DomainError, Result};

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse a hyphenated 36-character UUID
            pub fn parse(value: &str) -> Result<Self> {
                if value.trim().is_empty() {
                    return Err(DomainError::InvalidId {
                        kind: $kind,
                        reason: "must not be blank".to_string(),
                    });
                }
                if value.len() != ID_LENGTH {
                    return Err(DomainError::InvalidId {
                        kind: $kind,
                        reason: format!("expected {} characters, got {}", ID_LENGTH, value.len()),
                    });
                }
                Uuid::parse_str(value)
                    .map(Self)
                    .map_err(|e| DomainError::InvalidId {
                        kind: $kind,
                        reason: e.to_string(),
                    })
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.hyphenated())
            }
        }
    };
}

uuid_id!(
    /// Identifier of a single wager, unique per placement
    BetId,
    "bet id"
);
uuid_id!(UserId, "user id");
uuid_id!(JackpotId, "jackpot id");

/// Cycle counter of a jackpot, starting at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct CycleNumber(u32);

impl CycleNumber {
    pub const FIRST: CycleNumber = CycleNumber(FIRST_CYCLE);

    pub fn new(value: i64) -> Result<Self> {
        u32::try_from(value)
            .ok()
            .filter(|v| *v >= FIRST_CYCLE)
            .map(Self)
            .ok_or(DomainError::InvalidCycle(value))
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// The cycle following this one
    pub fn next(&self) -> Result<Self> {
        self.0
            .checked_add(1)
            .map(Self)
            .ok_or(DomainError::InvalidCycle(i64::from(self.0) + 1))
    }
}

impl TryFrom<i64> for CycleNumber {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CycleNumber> for u32 {
    fn from(cycle: CycleNumber) -> Self {
        cycle.0
    }
}

impl fmt::Display for CycleNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A jackpot together with the cycle a contribution or reward belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JackpotCycle {
    pub jackpot_id: JackpotId,
    pub cycle: CycleNumber,
}

impl JackpotCycle {
    pub fn new(jackpot_id: JackpotId, cycle: CycleNumber) -> Self {
        Self { jackpot_id, cycle }
    }
}

impl fmt::Display for JackpotCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.jackpot_id, self.cycle)
    }
}
