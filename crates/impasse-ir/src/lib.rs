#![doc = include_str!("../README.md")]

//! Impasse cipher description layer.
//!
//! This crate defines the data the impossible-differential model is built
//! from: truncated bit values, cipher components with their input links,
//! ciphers as ordered rounds of components, and fixed-variable requests.

pub mod cipher;
pub mod component;
pub mod fixed;
#[cfg(any(test, feature = "proptest"))]
pub mod proptest_generators;
pub mod truncated;

pub use cipher::{Cipher, CipherError, CipherInput, KEY_INPUT, PLAINTEXT_INPUT};
pub use component::{Component, ComponentKind, InputLink, UnsupportedComponent, WordOperation};
pub use fixed::{ConstraintKind, FixedVariable};
pub use truncated::{TruncatedParseError, TruncatedValue, TruncatedWord};
