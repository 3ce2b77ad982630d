//! Truncated differential values.
//!
//! A truncated difference classifies every bit of a wire as a provably zero
//! difference, a provably one difference, or undetermined. The constraint
//! model encodes these as the integers `0`, `1` and `2`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TruncatedParseError {
    #[error("invalid truncated code {0}; expected 0, 1 or 2")]
    InvalidCode(u8),
    #[error("invalid truncated digit '{0}'; expected 0, 1 or 2")]
    InvalidChar(char),
}

/// One bit of a truncated differential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum TruncatedValue {
    /// Difference is provably zero.
    Zero,
    /// Difference is provably one.
    One,
    /// Difference is undetermined.
    Unknown,
}

impl TruncatedValue {
    /// Largest code of the solver-side domain `0..2`.
    pub const MAX_CODE: u8 = 2;

    pub fn code(self) -> u8 {
        match self {
            TruncatedValue::Zero => 0,
            TruncatedValue::One => 1,
            TruncatedValue::Unknown => 2,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, TruncatedParseError> {
        match code {
            0 => Ok(TruncatedValue::Zero),
            1 => Ok(TruncatedValue::One),
            2 => Ok(TruncatedValue::Unknown),
            other => Err(TruncatedParseError::InvalidCode(other)),
        }
    }

    pub fn from_char(c: char) -> Result<Self, TruncatedParseError> {
        match c {
            '0' => Ok(TruncatedValue::Zero),
            '1' => Ok(TruncatedValue::One),
            '2' => Ok(TruncatedValue::Unknown),
            other => Err(TruncatedParseError::InvalidChar(other)),
        }
    }

    pub fn is_fixed(self) -> bool {
        !matches!(self, TruncatedValue::Unknown)
    }

    /// True iff one side is fixed zero and the other fixed one.
    ///
    /// With the `0/1/2` encoding this is exactly `a + b == 1`; an
    /// undetermined bit never contradicts anything.
    pub fn contradicts(self, other: TruncatedValue) -> bool {
        self.code() + other.code() == 1
    }
}

impl From<TruncatedValue> for u8 {
    fn from(value: TruncatedValue) -> Self {
        value.code()
    }
}

impl TryFrom<u8> for TruncatedValue {
    type Error = TruncatedParseError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        TruncatedValue::from_code(code)
    }
}

impl fmt::Display for TruncatedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The observable state of a cipher wire: one truncated value per bit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TruncatedWord(Vec<TruncatedValue>);

impl TruncatedWord {
    pub fn new(bits: Vec<TruncatedValue>) -> Self {
        Self(bits)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn bits(&self) -> &[TruncatedValue] {
        &self.0
    }

    pub fn get(&self, position: usize) -> Option<TruncatedValue> {
        self.0.get(position).copied()
    }

    pub fn push(&mut self, value: TruncatedValue) {
        self.0.push(value);
    }

    pub fn count(&self, value: TruncatedValue) -> usize {
        self.0.iter().filter(|bit| **bit == value).count()
    }

    /// Positions at which `self` and `other` carry a zero/one contradiction.
    ///
    /// Words of different length are never compared and yield no positions.
    pub fn contradiction_positions(&self, other: &TruncatedWord) -> Vec<usize> {
        if self.len() != other.len() {
            return Vec::new();
        }
        self.0
            .iter()
            .zip(&other.0)
            .enumerate()
            .filter(|(_, (a, b))| a.contradicts(**b))
            .map(|(i, _)| i)
            .collect()
    }
}

impl FromIterator<TruncatedValue> for TruncatedWord {
    fn from_iter<I: IntoIterator<Item = TruncatedValue>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Parses both the compact form `0121` and the solver's array form
/// `[0, 1, 2, 1]`.
impl FromStr for TruncatedWord {
    type Err = TruncatedParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars()
            .filter(|c| !matches!(c, '[' | ']' | ',') && !c.is_whitespace())
            .map(TruncatedValue::from_char)
            .collect()
    }
}

impl fmt::Display for TruncatedWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.0 {
            write!(f, "{bit}")?;
        }
        Ok(())
    }
}
