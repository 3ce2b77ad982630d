//! The per-component encoding interface and the S-box memo threaded
//! through it.

use indexmap::IndexMap;
use impasse_ir::{Component, UnsupportedComponent};
use thiserror::Error;

use crate::items::CpItem;

/// Which half of the meet-in-the-middle model a component is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    /// Built from the inverse cipher.
    Backward,
}

impl Direction {
    pub fn is_inverse(self) -> bool {
        self == Direction::Backward
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        }
    }
}

/// Variables and constraints contributed by one component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentEncoding {
    pub variables: Vec<CpItem>,
    pub constraints: Vec<CpItem>,
}

impl ComponentEncoding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variable(&mut self, item: CpItem) {
        self.variables.push(item);
    }

    pub fn constraint(&mut self, item: CpItem) {
        self.constraints.push(item);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error(transparent)]
    Unsupported(#[from] UnsupportedComponent),
    #[error("encoding failed: {0}")]
    Failed(String),
}

/// Memo of S-box lookup tables already encoded during one build.
///
/// Identical tables share one model-level definition; the inverse flag is
/// part of the key so forward and backward encodings never share a name.
#[derive(Debug, Clone, Default)]
pub struct SboxTable {
    entries: IndexMap<(Vec<u64>, bool), String>,
}

impl SboxTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared name for `table`, and whether it was just created (in which
    /// case the caller must emit its definition).
    pub fn lookup_or_insert(&mut self, table: &[u64], inverse: bool) -> (String, bool) {
        let key = (table.to_vec(), inverse);
        if let Some(name) = self.entries.get(&key) {
            return (name.clone(), false);
        }
        let name = format!("truncated_sbox_{}", self.entries.len());
        self.entries.insert(key, name.clone());
        (name, true)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(String::as_str)
    }
}

/// Produces the truncated-differential encoding of single components.
///
/// Implementations must not declare a component's own output array; the
/// model declares every non-constant component output itself.
pub trait TruncatedEncoder {
    fn encode(
        &self,
        component: &Component,
        direction: Direction,
    ) -> Result<ComponentEncoding, EncodingError>;

    /// S-box components additionally see the build's shared memo.
    fn encode_sbox(
        &self,
        component: &Component,
        direction: Direction,
        _table: &mut SboxTable,
    ) -> Result<ComponentEncoding, EncodingError> {
        self.encode(component, direction)
    }
}

impl<E: TruncatedEncoder + ?Sized> TruncatedEncoder for &E {
    fn encode(
        &self,
        component: &Component,
        direction: Direction,
    ) -> Result<ComponentEncoding, EncodingError> {
        (**self).encode(component, direction)
    }

    fn encode_sbox(
        &self,
        component: &Component,
        direction: Direction,
        table: &mut SboxTable,
    ) -> Result<ComponentEncoding, EncodingError> {
        (**self).encode_sbox(component, direction, table)
    }
}
