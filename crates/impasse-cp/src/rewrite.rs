//! Moving the backward half-model into the inverse namespace.
//!
//! Text items are rewritten by marking identifier occurrences; structured
//! items only have their namespace tag relabelled. Both yield the same
//! rendered names for references that are whole identifiers.

use crate::encoder::Direction;
use crate::half_model::{ComponentReport, HalfModel};
use crate::items::CpItem;
use crate::terms::{VarRef, INVERSE_MARKER};

/// Generic token carried by every final-output identifier.
pub const CIPHER_OUTPUT_TOKEN: &str = "cipher_output";

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Whether an identifier may start right after `before`.
fn at_identifier_start(before: &str) -> bool {
    !before.chars().next_back().is_some_and(is_identifier_char)
}

/// Where an occurrence sits relative to the identifier around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Occurrence {
    /// Starts an identifier; needs the marker.
    Unmarked,
    /// Already preceded by a marker that starts the identifier.
    Marked,
    /// Part of some other identifier; left alone.
    Embedded,
}

fn classify(before: &str, after: &str, whole: bool) -> Occurrence {
    if whole && after.chars().next().is_some_and(is_identifier_char) {
        return Occurrence::Embedded;
    }
    if at_identifier_start(before) {
        return Occurrence::Unmarked;
    }
    match before.strip_suffix(INVERSE_MARKER) {
        Some(rest) if at_identifier_start(rest) => Occurrence::Marked,
        _ => Occurrence::Embedded,
    }
}

fn mark(text: &str, pattern: &str, whole: bool) -> String {
    if pattern.is_empty() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (pos, _) in text.match_indices(pattern) {
        let end = pos + pattern.len();
        if classify(&text[..pos], &text[end..], whole) == Occurrence::Unmarked {
            out.push_str(&text[last..pos]);
            out.push_str(INVERSE_MARKER);
            out.push_str(pattern);
            last = end;
        }
    }
    out.push_str(&text[last..]);
    out
}

/// Insert the marker before every non-overlapping occurrence of `id` that
/// forms a whole identifier. Occurrences inside a longer identifier, and
/// ones already marked, are left as they are.
pub fn mark_occurrences(text: &str, id: &str) -> String {
    mark(text, id, true)
}

/// Insert the marker before every identifier that starts with `prefix`.
pub fn mark_prefixed(text: &str, prefix: &str) -> String {
    mark(text, prefix, false)
}

/// Collapse doubled markers until none remain.
pub fn collapse_double_markers(text: &str) -> String {
    let doubled = format!("{INVERSE_MARKER}{INVERSE_MARKER}");
    let mut out = text.to_string();
    while out.contains(&doubled) {
        out = out.replace(&doubled, INVERSE_MARKER);
    }
    out
}

/// Textual rewrite: mark every backward id, then every identifier carrying
/// the output token, then collapse doubled markers.
pub fn rewrite_text<S: AsRef<str>>(text: &str, backward_ids: &[S]) -> String {
    let mut out = collapse_double_markers(text);
    for id in backward_ids {
        out = mark_occurrences(&out, id.as_ref());
    }
    out = mark_prefixed(&out, CIPHER_OUTPUT_TOKEN);
    collapse_double_markers(&out)
}

/// Whether a structured reference belongs to the backward half. Uses the
/// same whole-identifier rule as [`rewrite_text`].
fn owned_by_backward<S: AsRef<str>>(var: &VarRef, backward_ids: &[S]) -> bool {
    var.name.starts_with(CIPHER_OUTPUT_TOKEN)
        || backward_ids.iter().any(|id| var.name == id.as_ref())
}

/// Rewrite one item in place.
pub fn rewrite_item<S: AsRef<str>>(item: &mut CpItem, backward_ids: &[S]) {
    match item {
        CpItem::Text(text) => *text = rewrite_text(text, backward_ids),
        other => other.for_each_var_mut(&mut |var| {
            var.normalize();
            if owned_by_backward(var, backward_ids) {
                var.mark_inverse();
            }
        }),
    }
}

/// The backward half after namespacing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenHalfModel {
    pub component_ids: Vec<String>,
    pub variables: Vec<CpItem>,
    pub constraints: Vec<CpItem>,
    pub reports: Vec<ComponentReport>,
}

/// Move a backward half into the inverse namespace. A forward half is
/// passed through unchanged.
pub fn rewrite_backward(half: HalfModel) -> RewrittenHalfModel {
    let HalfModel {
        direction,
        component_ids,
        mut variables,
        mut constraints,
        reports,
    } = half;

    if direction == Direction::Backward {
        for item in variables.iter_mut().chain(constraints.iter_mut()) {
            rewrite_item(item, component_ids.as_slice());
        }
    }

    RewrittenHalfModel {
        component_ids,
        variables,
        constraints,
        reports,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terms::CpTerm;

    #[test]
    fn marks_each_occurrence_once() {
        assert_eq!(
            mark_occurrences("xor_0_1[0] = xor_0_1[1];", "xor_0_1"),
            "inverse_xor_0_1[0] = inverse_xor_0_1[1];"
        );
        assert_eq!(mark_occurrences("abc", ""), "abc");
    }

    #[test]
    fn shorter_ids_do_not_match_inside_longer_ones() {
        let ids = ["xor_0_1", "xor_0_10"];
        assert_eq!(
            rewrite_text("constraint xor_0_10[3] = xor_0_1[3];", &ids),
            "constraint inverse_xor_0_10[3] = inverse_xor_0_1[3];"
        );
    }

    #[test]
    fn ids_ending_another_id_stay_outside_it() {
        let ids = ["xor_0_15", "or_0_1"];
        assert_eq!(
            rewrite_text("constraint xor_0_15[0] = or_0_1[0];", &ids),
            "constraint inverse_xor_0_15[0] = inverse_or_0_1[0];"
        );
        let ids = ["or_0_1", "xor_0_15"];
        assert_eq!(
            rewrite_text("constraint xor_0_15[0] = or_0_1[0];", &ids),
            "constraint inverse_xor_0_15[0] = inverse_or_0_1[0];"
        );
        assert_eq!(mark_occurrences("xor_0_1[0]", "or_0_1"), "xor_0_1[0]");
    }

    #[test]
    fn marked_occurrences_are_not_marked_again() {
        assert_eq!(
            mark_occurrences("inverse_or_0_1[0] = or_0_1[1]", "or_0_1"),
            "inverse_or_0_1[0] = inverse_or_0_1[1]"
        );
        assert_eq!(
            rewrite_text("inverse_inverse_or_0_1[0]", &["or_0_1"]),
            "inverse_or_0_1[0]"
        );
    }

    #[test]
    fn output_token_marks_only_whole_identifiers() {
        let ids: [&str; 0] = [];
        assert_eq!(
            rewrite_text("pre_cipher_output_1[0] = cipher_output_1_2[0]", &ids),
            "pre_cipher_output_1[0] = inverse_cipher_output_1_2[0]"
        );
    }

    #[test]
    fn output_token_is_marked_globally() {
        let ids: [&str; 0] = [];
        assert_eq!(
            rewrite_text("rot_1_1[0] = cipher_output_1_2[3]", &ids),
            "rot_1_1[0] = inverse_cipher_output_1_2[3]"
        );
        assert_eq!(
            rewrite_text("cipher_output_1_2[3]", &["cipher_output_1_2"]),
            "inverse_cipher_output_1_2[3]"
        );
    }

    #[test]
    fn rewriting_twice_is_a_no_op() {
        let ids = ["sbox_0_3", "xor_0_2"];
        let once = rewrite_text("constraint xor_0_2[0] = sbox_0_3[1] + key[0];", &ids);
        assert_eq!(rewrite_text(&once, &ids), once);
        assert!(!once.contains("inverse_inverse_"));
        assert!(once.contains("key[0]"));
    }

    #[test]
    fn structured_items_are_relabelled() {
        let ids = ["rot_1_1"];
        let mut item = CpItem::Constraint(
            CpTerm::elem(VarRef::forward("rot_1_1"), 0)
                .eq(CpTerm::elem(VarRef::forward("cipher_output_1_2"), 3)),
        );
        rewrite_item(&mut item, &ids);
        let CpItem::Constraint(term) = &item else {
            panic!("constraint expected");
        };
        assert_eq!(
            term.vars(),
            vec![
                VarRef::inverse("rot_1_1"),
                VarRef::inverse("cipher_output_1_2")
            ]
        );

        let mut key = CpItem::Constraint(CpTerm::elem(VarRef::forward("key"), 0).eq(CpTerm::int(0)));
        rewrite_item(&mut key, &ids);
        assert_eq!(
            key,
            CpItem::Constraint(CpTerm::elem(VarRef::forward("key"), 0).eq(CpTerm::int(0)))
        );
    }

    #[test]
    fn structured_names_match_whole_ids() {
        let ids = ["or_0_1"];
        let mut item = CpItem::Constraint(
            CpTerm::elem(VarRef::forward("or_0_1"), 0)
                .eq(CpTerm::elem(VarRef::forward("xor_0_15"), 0)),
        );
        rewrite_item(&mut item, &ids);
        let CpItem::Constraint(term) = &item else {
            panic!("constraint expected");
        };
        assert_eq!(
            term.vars(),
            vec![VarRef::inverse("or_0_1"), VarRef::forward("xor_0_15")]
        );
    }

    #[test]
    fn forward_halves_pass_through() {
        let half = HalfModel {
            direction: Direction::Forward,
            component_ids: vec!["xor_0_0".into()],
            variables: vec![],
            constraints: vec![CpItem::text("constraint xor_0_0[0] = 0;")],
            reports: vec![],
        };
        let rewritten = rewrite_backward(half);
        assert_eq!(
            rewritten.constraints,
            vec![CpItem::text("constraint xor_0_0[0] = 0;")]
        );
    }
}
