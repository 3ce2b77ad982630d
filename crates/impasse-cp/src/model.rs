//! Assembling the meet-in-the-middle model from both ciphers.

use std::collections::HashSet;

use impasse_ir::{Cipher, CipherError, ConstraintKind, FixedVariable, PLAINTEXT_INPUT};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backends::minizinc_printer::item_to_minizinc;
use crate::encoder::{Direction, SboxTable, TruncatedEncoder};
use crate::finalize::Finalizer;
use crate::half_model::{BuildSession, ComponentReport};
use crate::items::CpItem;
use crate::output::{parse_solver_output, Interpretation, ModelType, Roster};
use crate::rewrite::rewrite_backward;
use crate::terms::{CpTerm, VarRef};

/// Library the emitted model includes for `count`.
pub const GLOBALS_INCLUDE: &str = "globals.mzn";

#[derive(Debug, Error, Diagnostic)]
pub enum ModelError {
    #[error("cannot model {requested} rounds of a {available}-round cipher")]
    #[diagnostic(
        code(impasse::model::rounds),
        help("request at least one round and no more than the cipher has")
    )]
    InvalidRounds { requested: usize, available: usize },

    #[error("middle round {middle_round} is outside 1..={number_of_rounds}")]
    #[diagnostic(code(impasse::model::middle_round))]
    InvalidMiddleRound {
        middle_round: usize,
        number_of_rounds: usize,
    },

    #[error("cipher '{cipher}' has no '{input}' input")]
    #[diagnostic(code(impasse::model::missing_input))]
    MissingInput { cipher: String, input: String },

    #[error("'{name}' is declared by both halves of the model")]
    #[diagnostic(
        code(impasse::model::namespace_collision),
        help("an encoder must not declare a component's own output array")
    )]
    NamespaceCollision { name: String },

    #[error("fixed variable refers to undeclared '{0}'")]
    #[diagnostic(code(impasse::model::unknown_variable))]
    UnknownVariable(String),

    #[error(transparent)]
    #[diagnostic(code(impasse::model::fixed))]
    Fixed(#[from] CipherError),
}

/// Parameters of one model build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildRequest {
    /// Defaults to every round of the cipher.
    pub number_of_rounds: Option<usize>,
    /// Round (1-based) at which the two halves meet.
    pub middle_round: usize,
    pub fixed_variables: Vec<FixedVariable>,
}

impl Default for BuildRequest {
    fn default() -> Self {
        Self {
            number_of_rounds: None,
            middle_round: 1,
            fixed_variables: Vec::new(),
        }
    }
}

impl BuildRequest {
    pub fn with_rounds(mut self, number_of_rounds: usize) -> Self {
        self.number_of_rounds = Some(number_of_rounds);
        self
    }

    pub fn with_middle_round(mut self, middle_round: usize) -> Self {
        self.middle_round = middle_round;
        self
    }

    pub fn with_fixed(mut self, fixed: FixedVariable) -> Self {
        self.fixed_variables.push(fixed);
        self
    }
}

/// Which identifiers a build covers; drives the interpreter's roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchLayout {
    pub number_of_rounds: usize,
    pub middle_round: usize,
    pub cipher_inputs: Vec<String>,
    pub forward_ids: Vec<String>,
    /// Unmarked ids of the backward components.
    pub backward_ids: Vec<String>,
    pub inverse_inputs: Vec<String>,
}

impl SearchLayout {
    pub fn roster(&self) -> Roster {
        Roster::new(
            self.cipher_inputs.iter().map(String::as_str),
            self.forward_ids.iter().map(String::as_str),
            self.backward_ids.iter().map(String::as_str),
            self.inverse_inputs.iter().map(String::as_str),
        )
    }
}

/// A complete model, ready to print.
#[derive(Debug, Clone)]
pub struct AssembledModel {
    pub items: Vec<CpItem>,
    pub layout: SearchLayout,
    pub reports: Vec<ComponentReport>,
    pub sbox_table: SboxTable,
}

impl AssembledModel {
    pub fn to_minizinc(&self) -> String {
        let mut out = String::new();
        for item in &self.items {
            out.push_str(&item_to_minizinc(item));
            out.push('\n');
        }
        out
    }

    /// Whether every component of both halves was modeled.
    pub fn is_complete(&self) -> bool {
        self.reports.iter().all(|r| r.outcome.is_modeled())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &ComponentReport> {
        self.reports.iter().filter(|r| !r.outcome.is_modeled())
    }

    pub fn declared_names(&self) -> Vec<String> {
        self.items.iter().filter_map(CpItem::declared_name).collect()
    }
}

/// Constraints pinning or excluding bit values of named wires.
pub fn fixed_variable_constraints(fixed: &[FixedVariable]) -> Vec<CpItem> {
    let mut items = Vec::new();
    for variable in fixed {
        let var = VarRef::parse(&variable.component_id);
        let element = |position: usize| CpTerm::elem(var.clone(), position);
        match variable.constraint {
            ConstraintKind::Equal => {
                for (position, value) in variable.pairs() {
                    items.push(CpItem::Constraint(
                        element(position).eq(CpTerm::int(i64::from(value))),
                    ));
                }
            }
            ConstraintKind::NotEqual => {
                let differs = variable
                    .pairs()
                    .map(|(position, value)| element(position).ne(CpTerm::int(i64::from(value))))
                    .collect();
                items.push(CpItem::Constraint(CpTerm::or(differs)));
            }
        }
    }
    items
}

/// Every declared name must be unique once both halves are joined.
fn check_namespaces(items: &[CpItem]) -> Result<HashSet<String>, ModelError> {
    let mut declared = HashSet::new();
    for name in items.iter().filter_map(CpItem::declared_name) {
        if !declared.insert(name.clone()) {
            return Err(ModelError::NamespaceCollision { name });
        }
    }
    Ok(declared)
}

/// Impossible-differential model over a cipher and its structural inverse.
pub struct ImpossibleXorDifferentialModel<E> {
    cipher: Cipher,
    inverse: Cipher,
    encoder: E,
}

impl<E: TruncatedEncoder> ImpossibleXorDifferentialModel<E> {
    pub fn new(cipher: Cipher, inverse: Cipher, encoder: E) -> Self {
        Self {
            cipher,
            inverse,
            encoder,
        }
    }

    pub fn cipher(&self) -> &Cipher {
        &self.cipher
    }

    pub fn inverse(&self) -> &Cipher {
        &self.inverse
    }

    /// Validate `request` against the cipher and resolve its defaults.
    pub fn layout(&self, request: &BuildRequest) -> Result<SearchLayout, ModelError> {
        if !self.cipher.has_input(PLAINTEXT_INPUT) {
            return Err(ModelError::MissingInput {
                cipher: self.cipher.id.clone(),
                input: PLAINTEXT_INPUT.to_string(),
            });
        }
        let available = self.cipher.number_of_rounds();
        let number_of_rounds = request.number_of_rounds.unwrap_or(available);
        if number_of_rounds == 0 || number_of_rounds > available {
            return Err(ModelError::InvalidRounds {
                requested: number_of_rounds,
                available,
            });
        }
        let middle_round = request.middle_round;
        if middle_round == 0 || middle_round > number_of_rounds {
            return Err(ModelError::InvalidMiddleRound {
                middle_round,
                number_of_rounds,
            });
        }

        let finalizer = Finalizer::new(&self.cipher, &self.inverse, number_of_rounds, middle_round);
        Ok(SearchLayout {
            number_of_rounds,
            middle_round,
            cipher_inputs: self.cipher.input_names().map(str::to_string).collect(),
            forward_ids: finalizer.forward_components().map(|c| c.id.clone()).collect(),
            backward_ids: finalizer.backward_ids().map(str::to_string).collect(),
            inverse_inputs: self.inverse.input_names().map(str::to_string).collect(),
        })
    }

    /// Build both halves, namespace the backward one, and join them with
    /// the declarations and closing items.
    pub fn build(&self, request: &BuildRequest) -> Result<AssembledModel, ModelError> {
        let layout = self.layout(request)?;
        for fixed in &request.fixed_variables {
            fixed.validate()?;
        }
        let finalizer = Finalizer::new(
            &self.cipher,
            &self.inverse,
            layout.number_of_rounds,
            layout.middle_round,
        );

        let mut session = BuildSession::new(&self.encoder);
        let forward = session.build_half(finalizer.forward_components(), Direction::Forward);
        let backward = rewrite_backward(
            session.build_half(finalizer.backward_components(), Direction::Backward),
        );

        let mut items = vec![CpItem::Include(GLOBALS_INCLUDE.to_string())];
        items.extend(finalizer.declarations());
        items.extend(forward.variables);
        items.extend(backward.variables);
        items.extend(finalizer.sanity_constraints());
        items.extend(fixed_variable_constraints(&request.fixed_variables));
        items.extend(forward.constraints);
        items.extend(backward.constraints);
        items.extend(finalizer.closing_items());

        let declared = check_namespaces(&items)?;
        for fixed in &request.fixed_variables {
            let name = VarRef::parse(&fixed.component_id).rendered();
            if !declared.contains(&name) {
                return Err(ModelError::UnknownVariable(name));
            }
        }

        let mut reports = forward.reports;
        reports.extend(backward.reports);
        let model = AssembledModel {
            items,
            layout,
            reports,
            sbox_table: session.into_sbox_table(),
        };
        tracing::info!(
            cipher = %self.cipher.id,
            rounds = model.layout.number_of_rounds,
            middle_round = model.layout.middle_round,
            items = model.items.len(),
            skipped = model.skipped().count(),
            "assembled impossible-differential model"
        );
        Ok(model)
    }

    /// Interpret solver output for a model built with `layout`.
    pub fn parse_solver_output<S: AsRef<str>>(
        &self,
        layout: &SearchLayout,
        lines: &[S],
        model_type: ModelType,
    ) -> Interpretation {
        parse_solver_output(lines, &layout.roster(), model_type, &self.cipher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toy::{toy_cipher, toy_inverse_cipher, ToyEncoder};
    use impasse_ir::{CipherInput, Component, ComponentKind};

    fn toy_model() -> ImpossibleXorDifferentialModel<ToyEncoder> {
        ImpossibleXorDifferentialModel::new(toy_cipher(), toy_inverse_cipher(), ToyEncoder::text())
    }

    #[test]
    fn rounds_are_validated() {
        let model = toy_model();
        assert!(matches!(
            model.layout(&BuildRequest::default().with_rounds(3)),
            Err(ModelError::InvalidRounds {
                requested: 3,
                available: 2
            })
        ));
        assert!(matches!(
            model.layout(&BuildRequest::default().with_rounds(0)),
            Err(ModelError::InvalidRounds { .. })
        ));
        assert!(matches!(
            model.layout(&BuildRequest::default().with_middle_round(3)),
            Err(ModelError::InvalidMiddleRound {
                middle_round: 3,
                number_of_rounds: 2
            })
        ));
    }

    #[test]
    fn layout_defaults_to_all_rounds() {
        let layout = toy_model().layout(&BuildRequest::default()).unwrap();
        assert_eq!(layout.number_of_rounds, 2);
        assert_eq!(layout.forward_ids.len(), 5);
        assert_eq!(layout.backward_ids.len(), 8);
        let roster = layout.roster();
        let ids: Vec<_> = roster.ids().collect();
        assert_eq!(&ids[..3], ["plaintext", "key", "constant_0_0"]);
        assert!(ids.contains(&"inverse_cipher_output_1_5"));
        assert_eq!(ids.last(), Some(&"cipher_output_1_2"));
    }

    #[test]
    fn missing_plaintext_is_an_error() {
        let cipher = Cipher::new("keyonly", vec![CipherInput::new("key", 4)]);
        let model = ImpossibleXorDifferentialModel::new(cipher, toy_inverse_cipher(), ToyEncoder::text());
        assert!(matches!(
            model.build(&BuildRequest::default()),
            Err(ModelError::MissingInput { .. })
        ));
    }

    #[test]
    fn fixed_variables_print_as_constraints() {
        let fixed = [
            FixedVariable::equal("plaintext", [0, 1], [1, 0]).unwrap(),
            FixedVariable::not_equal("inverse_cipher_output_1_2", [0, 3], [0, 0]).unwrap(),
        ];
        let printed: Vec<_> = fixed_variable_constraints(&fixed)
            .iter()
            .map(item_to_minizinc)
            .collect();
        assert_eq!(
            printed,
            vec![
                "constraint plaintext[0] = 1;",
                "constraint plaintext[1] = 0;",
                "constraint (inverse_cipher_output_1_2[0] != 0) \\/ (inverse_cipher_output_1_2[3] != 0);",
            ]
        );
    }

    #[test]
    fn fixed_variables_must_name_declared_arrays() {
        let request = BuildRequest::default()
            .with_fixed(FixedVariable::equal("nonexistent_0_0", [0], [1]).unwrap());
        assert!(matches!(
            toy_model().build(&request),
            Err(ModelError::UnknownVariable(name)) if name == "nonexistent_0_0"
        ));
    }

    #[test]
    fn encoders_declaring_outputs_collide() {
        struct Redeclaring;
        impl TruncatedEncoder for Redeclaring {
            fn encode(
                &self,
                component: &Component,
                _direction: Direction,
            ) -> Result<crate::encoder::ComponentEncoding, crate::encoder::EncodingError> {
                let mut encoding = crate::encoder::ComponentEncoding::new();
                encoding.variable(CpItem::text(format!(
                    "array[0..{}] of var 0..2: {};",
                    component.output_bit_size - 1,
                    component.id
                )));
                Ok(encoding)
            }
        }

        let mut cipher = Cipher::new(
            "one",
            vec![CipherInput::new("plaintext", 2), CipherInput::new("key", 2)],
        );
        cipher.add_round(vec![Component::new("linear_layer_0_0", ComponentKind::LinearLayer, 2)
            .with_input("plaintext", 0..2)]);
        let inverse = cipher.clone();
        let model = ImpossibleXorDifferentialModel::new(cipher, inverse, Redeclaring);
        assert!(matches!(
            model.build(&BuildRequest::default()),
            Err(ModelError::NamespaceCollision { name }) if name == "linear_layer_0_0"
        ));
    }

    #[test]
    fn model_starts_with_include_and_ends_with_show() {
        let model = toy_model().build(&BuildRequest::default()).unwrap();
        let text = model.to_minizinc();
        assert!(text.starts_with("include \"globals.mzn\";\n"));
        let lines: Vec<_> = text.lines().collect();
        let n = lines.len();
        assert_eq!(lines[n - 3], "solve satisfy;");
        assert!(lines[n - 2].starts_with("constraint (plaintext[0] + inverse_xor_0_2[0] = 1) \\/ "));
        assert!(lines[n - 1].starts_with("output[\"plaintext = \" ++ show(plaintext)"));
        assert!(model.is_complete());
        assert_eq!(model.sbox_table.len(), 2);
    }
}
