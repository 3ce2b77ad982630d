//! Declarations and closing items that tie the two half-models together.

use std::ops::Range;

use impasse_ir::{Cipher, Component, KEY_INPUT, PLAINTEXT_INPUT};
use indexmap::IndexSet;

use crate::items::{ArrayDecl, CpItem, ShowEntry, SolveGoal};
use crate::terms::{CpTerm, VarRef};

/// Rounds of the forward cipher in the forward half.
pub fn forward_rounds(middle_round: usize) -> Range<usize> {
    0..middle_round
}

/// Rounds of the inverse cipher in the backward half; the meeting round
/// is covered by both halves.
pub fn backward_rounds(number_of_rounds: usize, middle_round: usize) -> Range<usize> {
    0..(number_of_rounds + 1).saturating_sub(middle_round)
}

/// Ids reachable from the key through constants and other key-schedule
/// components only, in component order. Includes the key input itself.
pub fn key_schedule_components(cipher: &Cipher) -> IndexSet<String> {
    let constants: IndexSet<&str> = cipher
        .all_components()
        .filter(|c| c.kind.is_constant())
        .map(|c| c.id.as_str())
        .collect();
    let mut schedule = IndexSet::new();
    schedule.insert(KEY_INPUT.to_string());
    for component in cipher.all_components() {
        let derived = component
            .input_ids()
            .all(|id| constants.contains(id) || schedule.contains(id));
        if derived {
            schedule.insert(component.id.clone());
        }
    }
    schedule
}

/// Builds the parts of the model that depend on both ciphers at once.
pub struct Finalizer<'a> {
    cipher: &'a Cipher,
    inverse: &'a Cipher,
    number_of_rounds: usize,
    middle_round: usize,
    key_schedule: IndexSet<String>,
    backward_ids: IndexSet<String>,
}

impl<'a> Finalizer<'a> {
    pub fn new(
        cipher: &'a Cipher,
        inverse: &'a Cipher,
        number_of_rounds: usize,
        middle_round: usize,
    ) -> Self {
        let backward_ids = inverse
            .components_in_rounds(backward_rounds(number_of_rounds, middle_round))
            .map(|c| c.id.clone())
            .collect();
        Self {
            cipher,
            inverse,
            number_of_rounds,
            middle_round,
            key_schedule: key_schedule_components(cipher),
            backward_ids,
        }
    }

    pub fn key_schedule(&self) -> &IndexSet<String> {
        &self.key_schedule
    }

    pub fn forward_components(&self) -> impl Iterator<Item = &'a Component> {
        self.cipher
            .components_in_rounds(forward_rounds(self.middle_round))
    }

    pub fn backward_components(&self) -> impl Iterator<Item = &'a Component> {
        self.inverse
            .components_in_rounds(backward_rounds(self.number_of_rounds, self.middle_round))
    }

    pub fn backward_ids(&self) -> impl Iterator<Item = &str> {
        self.backward_ids.iter().map(String::as_str)
    }

    /// One truncated array per cipher input, inverse-cipher input and
    /// non-constant component output of either half.
    pub fn declarations(&self) -> Vec<CpItem> {
        let mut items = Vec::new();
        for input in &self.cipher.inputs {
            items.push(CpItem::Declare(ArrayDecl::truncated(
                VarRef::forward(&input.name),
                input.bit_size,
            )));
        }
        for input in &self.inverse.inputs {
            items.push(CpItem::Declare(ArrayDecl::truncated(
                VarRef::inverse(&input.name),
                input.bit_size,
            )));
        }
        let forward = self
            .forward_components()
            .map(|c| (c, VarRef::forward(&c.id)));
        let backward = self
            .backward_components()
            .map(|c| (c, VarRef::inverse(&c.id)));
        for (component, var) in forward.chain(backward) {
            if !component.kind.is_constant() {
                items.push(CpItem::Declare(ArrayDecl::truncated(
                    var,
                    component.output_bit_size,
                )));
            }
        }
        items
    }

    /// Rule out the all-unknown output and the zero plaintext difference.
    pub fn sanity_constraints(&self) -> Vec<CpItem> {
        let forward = self
            .forward_components()
            .map(|c| (c, VarRef::forward(&c.id)));
        let backward = self
            .backward_components()
            .map(|c| (c, VarRef::inverse(&c.id)));
        let mut items: Vec<CpItem> = forward
            .chain(backward)
            .filter(|(c, _)| c.kind.is_cipher_output())
            .map(|(c, var)| {
                CpItem::Constraint(
                    CpTerm::count(var, 2).lt(CpTerm::int(c.output_bit_size as i64)),
                )
            })
            .collect();
        items.push(CpItem::Constraint(
            CpTerm::count(VarRef::forward(PLAINTEXT_INPUT), 1).gt(CpTerm::int(0)),
        ));
        items
    }

    /// Forward components of the meeting round whose inputs carry a data
    /// difference and whose backward counterpart exists.
    pub fn meeting_components(&self) -> Vec<&'a Component> {
        let Some(meeting_round) = self.middle_round.checked_sub(1) else {
            return Vec::new();
        };
        self.cipher
            .components_in_round(meeting_round)
            .iter()
            .filter(|c| !c.kind.is_constant() && !self.key_schedule.contains(&c.id))
            .filter(|c| {
                let paired = self.backward_ids.contains(&c.id) || self.inverse.has_input(&c.id);
                if !paired {
                    tracing::warn!(
                        component = %c.id,
                        "meeting-round component has no backward counterpart; not checked"
                    );
                }
                paired
            })
            .collect()
    }

    /// One disjunction over every meeting-round input bit: some forward
    /// bit and its backward counterpart must sum to one.
    pub fn detection_constraint(&self) -> CpItem {
        let mut disjuncts = Vec::new();
        for component in self.meeting_components() {
            let counterpart = VarRef::inverse(&component.id);
            let bits = component.inputs.iter().flat_map(|link| {
                link.bit_positions
                    .iter()
                    .map(move |&position| (link.id.as_str(), position))
            });
            for (index, (link, position)) in bits.enumerate() {
                disjuncts.push(
                    CpTerm::elem(VarRef::forward(link), position)
                        .add(CpTerm::elem(counterpart.clone(), index))
                        .eq(CpTerm::int(1)),
                );
            }
        }
        if disjuncts.is_empty() {
            tracing::warn!(
                middle_round = self.middle_round,
                "no meeting-round bit can be checked; detection constraint is false"
            );
        }
        CpItem::Constraint(CpTerm::or(disjuncts))
    }

    /// What the solver prints: cipher inputs, inverse-cipher inputs, and
    /// every meeting-round input link and backward counterpart.
    pub fn show_directive(&self) -> CpItem {
        let mut seen = IndexSet::new();
        let mut entries = Vec::new();
        let mut show = |entry: ShowEntry| {
            if seen.insert(entry.var.rendered()) {
                entries.push(entry);
            }
        };

        for input in &self.cipher.inputs {
            show(ShowEntry::plain(VarRef::forward(&input.name)));
        }
        for input in &self.inverse.inputs {
            show(ShowEntry::weighted(VarRef::inverse(&input.name)));
        }
        for component in self.meeting_components() {
            for link in &component.inputs {
                show(ShowEntry::weighted(VarRef::forward(&link.id)));
            }
            show(ShowEntry::weighted(VarRef::inverse(&component.id)));
        }
        CpItem::Output(entries)
    }

    /// `solve satisfy;`, the detection constraint, then the show directive.
    pub fn closing_items(&self) -> Vec<CpItem> {
        vec![
            CpItem::Solve(SolveGoal::Satisfy),
            self.detection_constraint(),
            self.show_directive(),
        ]
    }
}
