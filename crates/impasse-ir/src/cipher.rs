//! Ciphers as ordered rounds of components.

use std::collections::HashSet;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::component::Component;

/// Name of the plaintext input of every supported cipher.
pub const PLAINTEXT_INPUT: &str = "plaintext";
/// Name of the key input; the key schedule is traced from here.
pub const KEY_INPUT: &str = "key";

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("invalid cipher description: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate component id '{0}'")]
    DuplicateComponent(String),
    #[error("duplicate cipher input '{0}'")]
    DuplicateInput(String),
    #[error("fixed variable '{id}' has {positions} bit positions but {values} values")]
    FixedLengthMismatch {
        id: String,
        positions: usize,
        values: usize,
    },
    #[error("fixed variable '{id}' has out-of-domain value {value}")]
    FixedValueOutOfDomain { id: String, value: u8 },
}

/// A declared cipher input (plaintext, key, or for an inverse cipher the
/// ciphertext side).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherInput {
    pub name: String,
    pub bit_size: usize,
}

impl CipherInput {
    pub fn new(name: impl Into<String>, bit_size: usize) -> Self {
        Self {
            name: name.into(),
            bit_size,
        }
    }
}

/// A cipher: declared inputs plus its components grouped by round.
///
/// The structural inverse of a cipher is itself a `Cipher`; producing it is
/// the job of whoever describes the cipher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cipher {
    pub id: String,
    pub inputs: Vec<CipherInput>,
    #[serde(default)]
    pub rounds: Vec<Vec<Component>>,
}

impl Cipher {
    pub fn new(id: impl Into<String>, inputs: Vec<CipherInput>) -> Self {
        Self {
            id: id.into(),
            inputs,
            rounds: Vec::new(),
        }
    }

    /// Load and validate a JSON cipher description.
    pub fn from_json_str(source: &str) -> Result<Self, CipherError> {
        let cipher: Cipher = serde_json::from_str(source)?;
        cipher.validate()?;
        Ok(cipher)
    }

    pub fn add_round(&mut self, components: Vec<Component>) {
        self.rounds.push(components);
    }

    pub fn number_of_rounds(&self) -> usize {
        self.rounds.len()
    }

    /// Components of `round`; empty past the last round.
    pub fn components_in_round(&self, round: usize) -> &[Component] {
        self.rounds.get(round).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Components of every round in `rounds`, in round order.
    pub fn components_in_rounds(&self, rounds: Range<usize>) -> impl Iterator<Item = &Component> {
        rounds.flat_map(move |r| self.components_in_round(r).iter())
    }

    pub fn all_components(&self) -> impl Iterator<Item = &Component> {
        self.rounds.iter().flatten()
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.all_components().find(|c| c.id == id)
    }

    pub fn last_component(&self) -> Option<&Component> {
        self.rounds.iter().rev().find_map(|round| round.last())
    }

    pub fn input_names(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|input| input.name.as_str())
    }

    pub fn has_input(&self, name: &str) -> bool {
        self.input_names().any(|n| n == name)
    }

    /// Input names and component ids must be unique within one cipher.
    pub fn validate(&self) -> Result<(), CipherError> {
        let mut inputs = HashSet::new();
        for name in self.input_names() {
            if !inputs.insert(name) {
                return Err(CipherError::DuplicateInput(name.to_string()));
            }
        }
        let mut ids = HashSet::new();
        for component in self.all_components() {
            if !ids.insert(component.id.as_str()) {
                return Err(CipherError::DuplicateComponent(component.id.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentKind, WordOperation};

    fn two_round_cipher() -> Cipher {
        let mut cipher = Cipher::new(
            "toy",
            vec![CipherInput::new("plaintext", 4), CipherInput::new("key", 4)],
        );
        cipher.add_round(vec![Component::new(
            "xor_0_0",
            ComponentKind::word(WordOperation::Xor),
            4,
        )
        .with_input("plaintext", 0..4)
        .with_input("key", 0..4)]);
        cipher.add_round(vec![
            Component::new("rot_1_0", ComponentKind::word(WordOperation::Rotate), 4)
                .with_input("xor_0_0", [1, 2, 3, 0]),
            Component::new("cipher_output_1_1", ComponentKind::CipherOutput, 4)
                .with_input("rot_1_0", 0..4),
        ]);
        cipher
    }

    #[test]
    fn rounds_are_enumerated_in_order() {
        let cipher = two_round_cipher();
        assert_eq!(cipher.number_of_rounds(), 2);
        let ids: Vec<_> = cipher
            .components_in_rounds(0..2)
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["xor_0_0", "rot_1_0", "cipher_output_1_1"]);
        assert!(cipher.components_in_round(7).is_empty());
        assert_eq!(cipher.last_component().unwrap().id, "cipher_output_1_1");
    }

    #[test]
    fn duplicate_component_ids_are_rejected() {
        let mut cipher = two_round_cipher();
        cipher.add_round(vec![Component::new(
            "xor_0_0",
            ComponentKind::word(WordOperation::Xor),
            4,
        )]);
        assert!(matches!(
            cipher.validate(),
            Err(CipherError::DuplicateComponent(id)) if id == "xor_0_0"
        ));
    }

    #[test]
    fn json_description_round_trips() {
        let cipher = two_round_cipher();
        let json = serde_json::to_string(&cipher).unwrap();
        let loaded = Cipher::from_json_str(&json).unwrap();
        assert_eq!(loaded, cipher);
        assert!(loaded.has_input(PLAINTEXT_INPUT));
        assert!(loaded.has_input(KEY_INPUT));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            Cipher::from_json_str("{\"id\": 3}"),
            Err(CipherError::Json(_))
        ));
    }
}
