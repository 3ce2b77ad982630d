//! Proptest strategies for truncated values, identifiers and small ciphers.

use proptest::prelude::*;

use crate::cipher::{Cipher, CipherInput};
use crate::component::{Component, ComponentKind, WordOperation};
use crate::truncated::{TruncatedValue, TruncatedWord};

pub fn arb_truncated_value() -> impl Strategy<Value = TruncatedValue> {
    prop_oneof![
        Just(TruncatedValue::Zero),
        Just(TruncatedValue::One),
        Just(TruncatedValue::Unknown),
    ]
}

/// Words whose bits are all fixed (zero or one).
pub fn arb_fixed_word(len: usize) -> impl Strategy<Value = TruncatedWord> {
    proptest::collection::vec(
        prop_oneof![Just(TruncatedValue::Zero), Just(TruncatedValue::One)],
        len..=len,
    )
    .prop_map(TruncatedWord::new)
}

pub fn arb_truncated_word(len: usize) -> impl Strategy<Value = TruncatedWord> {
    proptest::collection::vec(arb_truncated_value(), len..=len).prop_map(TruncatedWord::new)
}

/// Identifiers shaped like real component ids: `<op>_<round>_<index>`.
/// Some operation names end others (`or`/`xor`), and indices run past 9,
/// so short ids can sit inside longer ones.
pub fn arb_component_id() -> impl Strategy<Value = String> {
    (
        proptest::sample::select(vec![
            "xor",
            "or",
            "and",
            "not",
            "shift",
            "rot",
            "modadd",
            "sbox",
            "linear_layer",
            "intermediate_output",
            "cipher_output",
        ]),
        0..4usize,
        0..16usize,
    )
        .prop_map(|(op, round, index)| format!("{op}_{round}_{index}"))
}

/// A cipher of `1..=4` rounds where every round XORs the previous state
/// with the key, rotates it and ends on an output stage.
pub fn arb_toy_cipher() -> impl Strategy<Value = Cipher> {
    (1..=4usize, 2..=8usize).prop_map(|(rounds, width)| {
        let mut cipher = Cipher::new(
            format!("toy_r{rounds}_w{width}"),
            vec![
                CipherInput::new("plaintext", width),
                CipherInput::new("key", width),
            ],
        );
        let mut state = "plaintext".to_string();
        for r in 0..rounds {
            let xor = format!("xor_{r}_0");
            let rot = format!("rot_{r}_1");
            let out = if r + 1 == rounds {
                format!("cipher_output_{r}_2")
            } else {
                format!("intermediate_output_{r}_2")
            };
            let out_kind = if r + 1 == rounds {
                ComponentKind::CipherOutput
            } else {
                ComponentKind::IntermediateOutput
            };
            cipher.add_round(vec![
                Component::new(&xor, ComponentKind::word(WordOperation::Xor), width)
                    .with_input(&state, 0..width)
                    .with_input("key", 0..width),
                Component::new(&rot, ComponentKind::word(WordOperation::Rotate), width)
                    .with_input(&xor, (1..width).chain(0..1)),
                Component::new(&out, out_kind, width).with_input(&rot, 0..width),
            ]);
            state = out;
        }
        cipher
    })
}
