//! A two-round, 4-bit toy cipher, its inverse, and a small truncated
//! encoder for it. Not a real cipher; it exists to exercise the model.

use impasse_ir::{Cipher, CipherInput, Component, ComponentKind, WordOperation};

use crate::encoder::{ComponentEncoding, Direction, EncodingError, SboxTable, TruncatedEncoder};
use crate::items::{ArrayDecl, CpItem};
use crate::terms::{CpTerm, VarRef};

/// PRESENT's 4-bit S-box.
pub const TOY_SBOX: [u64; 16] = [12, 5, 6, 11, 9, 0, 10, 13, 3, 14, 15, 8, 4, 7, 1, 2];

fn inverse_table(table: &[u64]) -> Vec<u64> {
    let mut inverse = vec![0; table.len()];
    for (x, &y) in table.iter().enumerate() {
        if let Some(slot) = inverse.get_mut(y as usize) {
            *slot = x as u64;
        }
    }
    inverse
}

/// Round 0 holds a one-constant key schedule, the key addition and the
/// S-box layer; round 1 mixes in the schedule and rotates.
pub fn toy_cipher() -> Cipher {
    let mut cipher = Cipher::new(
        "toy_cipher_p4_k4_r2",
        vec![CipherInput::new("plaintext", 4), CipherInput::new("key", 4)],
    );
    cipher.add_round(vec![
        Component::new("constant_0_0", ComponentKind::Constant, 4),
        Component::new("xor_0_1", ComponentKind::word(WordOperation::Xor), 4)
            .with_input("key", 0..4)
            .with_input("constant_0_0", 0..4),
        Component::new("xor_0_2", ComponentKind::word(WordOperation::Xor), 4)
            .with_input("plaintext", 0..4)
            .with_input("key", 0..4),
        Component::new("sbox_0_3", ComponentKind::sbox(TOY_SBOX.to_vec()), 4)
            .with_input("xor_0_2", 0..4),
        Component::new("intermediate_output_0_4", ComponentKind::IntermediateOutput, 4)
            .with_input("sbox_0_3", 0..4),
    ]);
    cipher.add_round(vec![
        Component::new("xor_1_0", ComponentKind::word(WordOperation::Xor), 4)
            .with_input("sbox_0_3", 0..4)
            .with_input("xor_0_1", 0..4),
        Component::new("rot_1_1", ComponentKind::word(WordOperation::Rotate), 4)
            .with_input("xor_1_0", [1, 2, 3, 0]),
        Component::new("cipher_output_1_2", ComponentKind::CipherOutput, 4)
            .with_input("rot_1_1", 0..4),
    ]);
    cipher
}

/// Structural inverse of [`toy_cipher`]. Each inverse component carries
/// the value of its forward namesake's inputs.
pub fn toy_inverse_cipher() -> Cipher {
    let mut inverse = Cipher::new(
        "toy_cipher_p4_k4_r2_inverse",
        vec![
            CipherInput::new("cipher_output_1_2", 4),
            CipherInput::new("key", 4),
        ],
    );
    inverse.add_round(vec![
        Component::new("constant_0_0", ComponentKind::Constant, 4),
        Component::new("xor_0_1", ComponentKind::word(WordOperation::Xor), 4)
            .with_input("key", 0..4)
            .with_input("constant_0_0", 0..4),
        Component::new("rot_1_1", ComponentKind::word(WordOperation::Rotate), 4)
            .with_input("cipher_output_1_2", [3, 0, 1, 2]),
        Component::new("xor_1_0", ComponentKind::LinearLayer, 8)
            .with_input("rot_1_1", 0..4)
            .with_input("xor_0_1", 0..4),
    ]);
    inverse.add_round(vec![
        Component::new(
            "sbox_0_3",
            ComponentKind::sbox(inverse_table(&TOY_SBOX)),
            4,
        )
        .with_input("xor_1_0", 0..4),
        Component::new("intermediate_output_0_4", ComponentKind::IntermediateOutput, 4)
            .with_input("xor_1_0", 0..4),
        Component::new("xor_0_2", ComponentKind::LinearLayer, 8)
            .with_input("sbox_0_3", 0..4)
            .with_input("key", 0..4),
        Component::new("cipher_output_1_5", ComponentKind::CipherOutput, 4)
            .with_input("xor_0_2", 0..4),
    ]);
    inverse
}

/// How the toy encoder phrases its constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingStyle {
    /// Pre-rendered MiniZinc lines.
    #[default]
    Text,
    /// Structured items with namespace-tagged references.
    Structured,
}

/// Deterministic truncated propagation for the toy cipher's component
/// kinds. The encoding is the same in both directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToyEncoder {
    pub style: EncodingStyle,
}

impl ToyEncoder {
    pub fn text() -> Self {
        Self {
            style: EncodingStyle::Text,
        }
    }

    pub fn structured() -> Self {
        Self {
            style: EncodingStyle::Structured,
        }
    }

    fn constant(&self, component: &Component) -> ComponentEncoding {
        let mut encoding = ComponentEncoding::new();
        let var = VarRef::forward(&component.id);
        let n = component.output_bit_size;
        match self.style {
            EncodingStyle::Text => {
                encoding.variable(CpItem::text(format!(
                    "array[0..{}] of var 0..2: {var};",
                    n as i64 - 1
                )));
                for i in 0..n {
                    encoding.constraint(CpItem::text(format!("constraint {var}[{i}] = 0;")));
                }
            }
            EncodingStyle::Structured => {
                encoding.variable(CpItem::Declare(ArrayDecl::truncated(var.clone(), n)));
                for i in 0..n {
                    encoding.constraint(CpItem::Constraint(
                        CpTerm::elem(var.clone(), i).eq(CpTerm::int(0)),
                    ));
                }
            }
        }
        encoding
    }

    fn copy(&self, component: &Component) -> Result<ComponentEncoding, EncodingError> {
        let bits = input_bits(component);
        if bits.len() < component.output_bit_size {
            return Err(EncodingError::Failed(format!(
                "{} outputs {} bits from {} input bits",
                component.id,
                component.output_bit_size,
                bits.len()
            )));
        }
        let mut encoding = ComponentEncoding::new();
        let out = VarRef::forward(&component.id);
        for (i, (link, position)) in bits.iter().take(component.output_bit_size).enumerate() {
            encoding.constraint(match self.style {
                EncodingStyle::Text => {
                    CpItem::text(format!("constraint {out}[{i}] = {link}[{position}];"))
                }
                EncodingStyle::Structured => CpItem::Constraint(
                    CpTerm::elem(out.clone(), i)
                        .eq(CpTerm::elem(VarRef::forward(link), *position)),
                ),
            });
        }
        Ok(encoding)
    }

    fn xor(&self, component: &Component) -> Result<ComponentEncoding, EncodingError> {
        let n = component.output_bit_size;
        let [a, b] = component.inputs.as_slice() else {
            return Err(EncodingError::Failed(format!(
                "{} has {} inputs; the toy XOR takes two",
                component.id,
                component.inputs.len()
            )));
        };
        if a.bit_positions.len() != n || b.bit_positions.len() != n {
            return Err(EncodingError::Failed(format!(
                "{} mixes input widths",
                component.id
            )));
        }

        let mut encoding = ComponentEncoding::new();
        let out = VarRef::forward(&component.id);
        let pairs = a.bit_positions.iter().zip(&b.bit_positions).enumerate();
        for (i, (&p, &q)) in pairs {
            encoding.constraint(match self.style {
                EncodingStyle::Text => CpItem::text(format!(
                    "constraint {out}[{i}] = if {x}[{p}] = 2 \\/ {y}[{q}] = 2 then 2 \
                     else ({x}[{p}] + {y}[{q}]) mod 2 endif;",
                    x = a.id,
                    y = b.id
                )),
                EncodingStyle::Structured => {
                    let x = || CpTerm::elem(VarRef::forward(&a.id), p);
                    let y = || CpTerm::elem(VarRef::forward(&b.id), q);
                    let o = || CpTerm::elem(out.clone(), i);
                    let case = |xv: i64, yv: i64, ov: i64| {
                        CpTerm::and(vec![
                            x().eq(CpTerm::int(xv)),
                            y().eq(CpTerm::int(yv)),
                            o().eq(CpTerm::int(ov)),
                        ])
                    };
                    CpItem::Constraint(CpTerm::or(vec![
                        case(0, 0, 0),
                        case(1, 1, 0),
                        case(0, 1, 1),
                        case(1, 0, 1),
                        CpTerm::and(vec![x().eq(CpTerm::int(2)), o().eq(CpTerm::int(2))]),
                        CpTerm::and(vec![y().eq(CpTerm::int(2)), o().eq(CpTerm::int(2))]),
                    ]))
                }
            });
        }
        Ok(encoding)
    }
}

/// Input bits of `component` in link order.
fn input_bits(component: &Component) -> Vec<(String, usize)> {
    component
        .inputs
        .iter()
        .flat_map(|link| {
            link.bit_positions
                .iter()
                .map(move |&position| (link.id.clone(), position))
        })
        .collect()
}

impl TruncatedEncoder for ToyEncoder {
    fn encode(
        &self,
        component: &Component,
        _direction: Direction,
    ) -> Result<ComponentEncoding, EncodingError> {
        match &component.kind {
            ComponentKind::Constant => Ok(self.constant(component)),
            ComponentKind::WordOperation {
                operation: WordOperation::Xor,
            } => self.xor(component),
            ComponentKind::WordOperation {
                operation: WordOperation::Rotate | WordOperation::Shift | WordOperation::Not,
            }
            | ComponentKind::LinearLayer
            | ComponentKind::MixColumn
            | ComponentKind::IntermediateOutput
            | ComponentKind::CipherOutput => self.copy(component),
            other => Err(EncodingError::Failed(format!(
                "no toy encoding for {}",
                match other {
                    ComponentKind::WordOperation { operation } => operation.as_str(),
                    kind => kind.name(),
                }
            ))),
        }
    }

    fn encode_sbox(
        &self,
        component: &Component,
        direction: Direction,
        table: &mut SboxTable,
    ) -> Result<ComponentEncoding, EncodingError> {
        let ComponentKind::Sbox { table: lookup } = &component.kind else {
            return self.encode(component, direction);
        };
        let (name, fresh) = table.lookup_or_insert(lookup, direction.is_inverse());

        let mut encoding = ComponentEncoding::new();
        if fresh {
            encoding.variable(CpItem::text(format!(
                "predicate {name}(array[int] of var 0..2: x, array[int] of var 0..2: y) = \
                 if forall(i in index_set(x))(x[i] = 0) \
                 then forall(j in index_set(y))(y[j] = 0) \
                 else forall(j in index_set(y))(y[j] = 2) endif;"
            )));
        }
        let inputs: Vec<String> = input_bits(component)
            .into_iter()
            .map(|(link, position)| format!("{link}[{position}]"))
            .collect();
        encoding.constraint(CpItem::text(format!(
            "constraint {name}([{}], {});",
            inputs.join(", "),
            component.id
        )));
        Ok(encoding)
    }
}
