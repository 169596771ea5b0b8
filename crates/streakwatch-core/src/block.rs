//! Outcome blocks and their classification dimensions.
//!
//! Every block carries two independent classes: a parity class (odd/even) and
//! a size class (big/small). Streak detection runs over each dimension
//! separately, so the engine mostly talks about [`OutcomeClass`] and
//! [`Dimension`] rather than the two concrete enums.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Classes
// ---------------------------------------------------------------------------

/// Parity class of a block outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParityClass {
    Odd,
    Even,
}

/// Size class of a block outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Big,
    Small,
}

/// Any class a streak can be made of, regardless of dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeClass {
    Odd,
    Even,
    Big,
    Small,
}

impl OutcomeClass {
    /// All four classes in display order.
    pub const ALL: [OutcomeClass; 4] = [
        OutcomeClass::Odd,
        OutcomeClass::Even,
        OutcomeClass::Big,
        OutcomeClass::Small,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeClass::Odd => "odd",
            OutcomeClass::Even => "even",
            OutcomeClass::Big => "big",
            OutcomeClass::Small => "small",
        }
    }

    /// The dimension this class belongs to.
    pub fn dimension(self) -> Dimension {
        match self {
            OutcomeClass::Odd | OutcomeClass::Even => Dimension::Parity,
            OutcomeClass::Big | OutcomeClass::Small => Dimension::Size,
        }
    }
}

impl From<ParityClass> for OutcomeClass {
    fn from(p: ParityClass) -> Self {
        match p {
            ParityClass::Odd => OutcomeClass::Odd,
            ParityClass::Even => OutcomeClass::Even,
        }
    }
}

impl From<SizeClass> for OutcomeClass {
    fn from(s: SizeClass) -> Self {
        match s {
            SizeClass::Big => OutcomeClass::Big,
            SizeClass::Small => OutcomeClass::Small,
        }
    }
}

impl fmt::Display for OutcomeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutcomeClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "odd" => Ok(OutcomeClass::Odd),
            "even" => Ok(OutcomeClass::Even),
            "big" => Ok(OutcomeClass::Big),
            "small" => Ok(OutcomeClass::Small),
            other => Err(format!("unknown outcome class '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Dimension
// ---------------------------------------------------------------------------

/// Classification axis a streak is computed along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Parity,
    Size,
}

impl Dimension {
    /// Evaluation order used by the pattern scan.
    pub const ALL: [Dimension; 2] = [Dimension::Parity, Dimension::Size];

    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::Parity => "parity",
            Dimension::Size => "size",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// One observed outcome block. Immutable once observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub height: u64,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub result_value: u32,
    pub parity: ParityClass,
    pub size: SizeClass,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: u64,
}

impl Block {
    /// Class of this block along `dimension`.
    pub fn class(&self, dimension: Dimension) -> OutcomeClass {
        match dimension {
            Dimension::Parity => self.parity.into(),
            Dimension::Size => self.size.into(),
        }
    }
}
