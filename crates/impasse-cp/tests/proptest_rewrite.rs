//! Property-based tests for namespace rewriting, contradiction detection
//! and solution numbering.

use impasse_cp::output::{collect_solutions, Roster, SOLUTION_SEPARATOR};
use impasse_cp::rewrite::rewrite_text;
use impasse_ir::proptest_generators::{
    arb_component_id, arb_fixed_word, arb_truncated_word,
};
use impasse_ir::TruncatedValue;
use proptest::prelude::*;

/// A constraint-like line mentioning every id at least once.
fn constraint_text(ids: &[String]) -> String {
    let refs: Vec<String> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| format!("{id}[{i}]"))
        .collect();
    format!("constraint {} = key[0];", refs.join(" + "))
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn identifiers(text: &str) -> Vec<&str> {
    text.split(|c: char| !is_identifier_char(c))
        .filter(|token| !token.is_empty())
        .collect()
}

proptest! {
    #[test]
    fn rewriting_is_idempotent(ids in proptest::collection::vec(arb_component_id(), 1..6)) {
        let text = constraint_text(&ids);
        let once = rewrite_text(&text, ids.as_slice());
        let twice = rewrite_text(&once, ids.as_slice());
        prop_assert_eq!(&once, &twice);
        prop_assert!(!once.contains("inverse_inverse_"));
    }

    #[test]
    fn every_backward_identifier_is_marked_once(
        ids in proptest::collection::vec(arb_component_id(), 1..6)
    ) {
        let forward = constraint_text(&ids);
        let rewritten = rewrite_text(&forward, ids.as_slice());
        let before = identifiers(&forward);
        let after = identifiers(&rewritten);
        prop_assert_eq!(before.len(), after.len());
        for (old, new) in before.iter().zip(&after) {
            let backward = ids.iter().any(|id| id == old) || old.starts_with("cipher_output");
            if backward {
                prop_assert_eq!(new.to_string(), format!("inverse_{old}"));
            } else {
                prop_assert_eq!(old, new);
            }
        }
    }

    #[test]
    fn markers_only_start_identifiers(
        ids in proptest::collection::vec(arb_component_id(), 1..6)
    ) {
        let rewritten = rewrite_text(&constraint_text(&ids), ids.as_slice());
        for (pos, _) in rewritten.match_indices("inverse_") {
            let previous = rewritten[..pos].chars().next_back();
            prop_assert!(
                !previous.is_some_and(is_identifier_char),
                "marker inside an identifier in {}", rewritten
            );
        }
    }

    #[test]
    fn rewritten_text_never_equals_forward_text(
        ids in proptest::collection::vec(arb_component_id(), 1..6)
    ) {
        let forward = constraint_text(&ids);
        prop_assert_ne!(rewrite_text(&forward, ids.as_slice()), forward);
    }

    #[test]
    fn fixed_words_contradict_exactly_where_they_differ(
        (a, b) in (1..12usize).prop_flat_map(|n| (arb_fixed_word(n), arb_fixed_word(n)))
    ) {
        let expected: Vec<usize> = a
            .bits()
            .iter()
            .zip(b.bits())
            .enumerate()
            .filter(|(_, (x, y))| x.code() + y.code() == 1)
            .map(|(i, _)| i)
            .collect();
        prop_assert_eq!(a.contradiction_positions(&b), expected);
    }

    #[test]
    fn unknown_bits_are_never_flagged(
        (a, b) in (1..12usize).prop_flat_map(|n| (arb_truncated_word(n), arb_truncated_word(n)))
    ) {
        for i in a.contradiction_positions(&b) {
            prop_assert_ne!(a.get(i), Some(TruncatedValue::Unknown));
            prop_assert_ne!(b.get(i), Some(TruncatedValue::Unknown));
        }
    }

    #[test]
    fn separators_give_one_more_bucket(
        solutions in proptest::collection::vec(0..4u8, 0..6),
        trailing in any::<bool>(),
    ) {
        let mut lines = Vec::new();
        for (i, value) in solutions.iter().enumerate() {
            if i > 0 {
                lines.push(SOLUTION_SEPARATOR.to_string());
            }
            lines.push(format!("plaintext = [{}, 0]", value % 3));
        }
        if trailing {
            lines.push(SOLUTION_SEPARATOR.to_string());
        }
        let none: [&str; 0] = [];
        let roster = Roster::new(["plaintext"], none, none, none);
        let record = collect_solutions(lines.as_slice(), &roster);

        let separators = lines.iter().filter(|l| *l == SOLUTION_SEPARATOR).count();
        prop_assert_eq!(record.bucket_count(), separators + 1);
        prop_assert_eq!(record.non_empty_count(), solutions.len());
        if trailing {
            prop_assert!(record.solutions.last().unwrap().is_empty());
        }
    }
}
