//! Fixed-variable requests: pin (or forbid) bit values of a named wire
//! before the search starts.

use serde::{Deserialize, Serialize};

use crate::cipher::CipherError;
use crate::truncated::TruncatedValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// Every listed bit equals its value.
    Equal,
    /// At least one listed bit differs from its value.
    NotEqual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedVariable {
    pub component_id: String,
    pub constraint: ConstraintKind,
    pub bit_positions: Vec<usize>,
    pub bit_values: Vec<u8>,
}

impl FixedVariable {
    pub fn new(
        component_id: impl Into<String>,
        constraint: ConstraintKind,
        bit_positions: impl IntoIterator<Item = usize>,
        bit_values: impl IntoIterator<Item = u8>,
    ) -> Result<Self, CipherError> {
        let fixed = Self {
            component_id: component_id.into(),
            constraint,
            bit_positions: bit_positions.into_iter().collect(),
            bit_values: bit_values.into_iter().collect(),
        };
        fixed.validate()?;
        Ok(fixed)
    }

    pub fn equal(
        component_id: impl Into<String>,
        bit_positions: impl IntoIterator<Item = usize>,
        bit_values: impl IntoIterator<Item = u8>,
    ) -> Result<Self, CipherError> {
        Self::new(component_id, ConstraintKind::Equal, bit_positions, bit_values)
    }

    pub fn not_equal(
        component_id: impl Into<String>,
        bit_positions: impl IntoIterator<Item = usize>,
        bit_values: impl IntoIterator<Item = u8>,
    ) -> Result<Self, CipherError> {
        Self::new(component_id, ConstraintKind::NotEqual, bit_positions, bit_values)
    }

    pub fn validate(&self) -> Result<(), CipherError> {
        if self.bit_positions.len() != self.bit_values.len() {
            return Err(CipherError::FixedLengthMismatch {
                id: self.component_id.clone(),
                positions: self.bit_positions.len(),
                values: self.bit_values.len(),
            });
        }
        if let Some(value) = self
            .bit_values
            .iter()
            .copied()
            .find(|v| *v > TruncatedValue::MAX_CODE)
        {
            return Err(CipherError::FixedValueOutOfDomain {
                id: self.component_id.clone(),
                value,
            });
        }
        Ok(())
    }

    /// `(position, value)` pairs in declaration order.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, u8)> + '_ {
        self.bit_positions
            .iter()
            .copied()
            .zip(self.bit_values.iter().copied())
    }
}
