//! Reducing a solution to the evidence of an impossible trail.

use impasse_ir::{Cipher, Component, TruncatedWord, PLAINTEXT_INPUT};

use crate::output::{Solution, SolutionRecord};
use crate::terms::INVERSE_MARKER;

/// A component whose forward inputs contradict its backward counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncompatibilitySite {
    pub component_id: String,
    /// Bit positions where one side is fixed zero and the other fixed one.
    pub positions: Vec<usize>,
}

fn parse_word(solution: &Solution, id: &str) -> Option<TruncatedWord> {
    solution.get(id)?.value.parse().ok()
}

/// Forward input bits of `component`, concatenated in link order. `None`
/// when any link is not reported or does not cover its bit positions.
fn upstream_bits(solution: &Solution, component: &Component) -> Option<TruncatedWord> {
    let mut bits = TruncatedWord::default();
    for link in &component.inputs {
        let word = parse_word(solution, &link.id)?;
        for &position in &link.bit_positions {
            bits.push(word.get(position)?);
        }
    }
    Some(bits)
}

/// Every component of `cipher` whose inverse counterpart is reported and
/// contradicts its reconstructed inputs.
pub fn find_incompatibilities(solution: &Solution, cipher: &Cipher) -> Vec<IncompatibilitySite> {
    let mut sites = Vec::new();
    for component in cipher.all_components() {
        let inverse_id = format!("{INVERSE_MARKER}{}", component.id);
        let Some(inverse) = parse_word(solution, &inverse_id) else {
            continue;
        };
        let Some(upstream) = upstream_bits(solution, component) else {
            tracing::debug!(component = %component.id, "inputs not resolved; skipped");
            continue;
        };
        let positions = upstream.contradiction_positions(&inverse);
        if !positions.is_empty() {
            sites.push(IncompatibilitySite {
                component_id: component.id.clone(),
                positions,
            });
        }
    }
    sites
}

/// Keep the plaintext, the inputs and inverse value of every
/// contradicting component, and the inverse value of the last component.
pub fn extract_incompatibilities(solution: &Solution, cipher: &Cipher) -> SolutionRecord {
    let mut evidence = Solution::default();
    let mut retain = |id: &str| {
        if let Some(value) = solution.get(id) {
            evidence.insert(id, value.clone());
        }
    };

    retain(PLAINTEXT_INPUT);
    for site in find_incompatibilities(solution, cipher) {
        tracing::info!(
            component = %site.component_id,
            positions = ?site.positions,
            "incompatibility found"
        );
        if let Some(component) = cipher.component(&site.component_id) {
            for link in &component.inputs {
                retain(&link.id);
            }
        }
        retain(&format!("{INVERSE_MARKER}{}", site.component_id));
    }
    if let Some(last) = cipher.last_component() {
        retain(&format!("{INVERSE_MARKER}{}", last.id));
    }

    SolutionRecord::single(evidence)
}
