//! Cipher components and their input links.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Word-level operation carried by a `word_operation` component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WordOperation {
    And,
    Or,
    ModAdd,
    ModSub,
    Not,
    Rotate,
    Shift,
    Xor,
    /// Any operation name the model has no truncated encoding for.
    Other(String),
}

impl WordOperation {
    pub fn as_str(&self) -> &str {
        match self {
            WordOperation::And => "AND",
            WordOperation::Or => "OR",
            WordOperation::ModAdd => "MODADD",
            WordOperation::ModSub => "MODSUB",
            WordOperation::Not => "NOT",
            WordOperation::Rotate => "ROTATE",
            WordOperation::Shift => "SHIFT",
            WordOperation::Xor => "XOR",
            WordOperation::Other(name) => name,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, WordOperation::Other(_))
    }
}

impl From<String> for WordOperation {
    fn from(raw: String) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "AND" => WordOperation::And,
            "OR" => WordOperation::Or,
            "MODADD" => WordOperation::ModAdd,
            "MODSUB" => WordOperation::ModSub,
            "NOT" => WordOperation::Not,
            "ROTATE" => WordOperation::Rotate,
            "SHIFT" => WordOperation::Shift,
            "XOR" => WordOperation::Xor,
            _ => WordOperation::Other(raw),
        }
    }
}

impl From<WordOperation> for String {
    fn from(op: WordOperation) -> Self {
        op.as_str().to_string()
    }
}

impl fmt::Display for WordOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a cipher component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComponentKind {
    Constant,
    IntermediateOutput,
    CipherOutput,
    LinearLayer,
    Sbox {
        /// Lookup table; `table[x]` is the image of `x`.
        table: Vec<u64>,
    },
    MixColumn,
    WordOperation {
        operation: WordOperation,
    },
    /// A component type with no truncated-differential encoding.
    Other {
        name: String,
    },
}

/// Why a component cannot contribute to the truncated-differential model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnsupportedComponent {
    #[error("component type '{0}' is not supported")]
    Kind(String),
    #[error("word operation '{0}' is not supported")]
    Operation(String),
}

impl ComponentKind {
    pub fn word(operation: WordOperation) -> Self {
        ComponentKind::WordOperation { operation }
    }

    pub fn sbox(table: Vec<u64>) -> Self {
        ComponentKind::Sbox { table }
    }

    /// Type name as used in cipher descriptions.
    pub fn name(&self) -> &str {
        match self {
            ComponentKind::Constant => "constant",
            ComponentKind::IntermediateOutput => "intermediate_output",
            ComponentKind::CipherOutput => "cipher_output",
            ComponentKind::LinearLayer => "linear_layer",
            ComponentKind::Sbox { .. } => "sbox",
            ComponentKind::MixColumn => "mix_column",
            ComponentKind::WordOperation { .. } => "word_operation",
            ComponentKind::Other { name } => name,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, ComponentKind::Constant)
    }

    pub fn is_sbox(&self) -> bool {
        matches!(self, ComponentKind::Sbox { .. })
    }

    pub fn is_cipher_output(&self) -> bool {
        matches!(self, ComponentKind::CipherOutput)
    }

    /// Whether the truncated-differential model has an encoding for this kind.
    pub fn check_supported(&self) -> Result<(), UnsupportedComponent> {
        match self {
            ComponentKind::Other { name } => Err(UnsupportedComponent::Kind(name.clone())),
            ComponentKind::WordOperation { operation } if !operation.is_supported() => Err(
                UnsupportedComponent::Operation(operation.as_str().to_string()),
            ),
            _ => Ok(()),
        }
    }
}

/// One upstream wire feeding a component: the producer's identifier and
/// the bit positions consumed from it, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputLink {
    pub id: String,
    pub bit_positions: Vec<usize>,
}

impl InputLink {
    pub fn new(id: impl Into<String>, bit_positions: impl IntoIterator<Item = usize>) -> Self {
        Self {
            id: id.into(),
            bit_positions: bit_positions.into_iter().collect(),
        }
    }
}

/// A single cipher operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    pub kind: ComponentKind,
    #[serde(default)]
    pub inputs: Vec<InputLink>,
    pub output_bit_size: usize,
}

impl Component {
    pub fn new(id: impl Into<String>, kind: ComponentKind, output_bit_size: usize) -> Self {
        Self {
            id: id.into(),
            kind,
            inputs: Vec::new(),
            output_bit_size,
        }
    }

    pub fn with_input(
        mut self,
        id: impl Into<String>,
        bit_positions: impl IntoIterator<Item = usize>,
    ) -> Self {
        self.inputs.push(InputLink::new(id, bit_positions));
        self
    }

    pub fn input_ids(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|link| link.id.as_str())
    }

    pub fn input_bit_size(&self) -> usize {
        self.inputs.iter().map(|link| link.bit_positions.len()).sum()
    }
}
