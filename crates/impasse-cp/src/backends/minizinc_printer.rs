use crate::items::{ArrayDecl, CpItem, ShowEntry, SolveGoal};
use crate::terms::CpTerm;

/// Print a CpTerm in MiniZinc syntax.
pub fn to_minizinc(term: &CpTerm) -> String {
    match term {
        CpTerm::Var(v) => v.rendered(),
        CpTerm::Elem(v, index) => format!("{v}[{index}]"),
        CpTerm::IntLit(n) => n.to_string(),
        CpTerm::BoolLit(b) => {
            if *b {
                "true".to_string()
            } else {
                "false".to_string()
            }
        }
        CpTerm::Add(lhs, rhs) => format!("{} + {}", operand(lhs, 1), operand(rhs, 1)),
        CpTerm::Eq(lhs, rhs) => format!("{} = {}", operand(lhs, 2), operand(rhs, 2)),
        CpTerm::Ne(lhs, rhs) => format!("{} != {}", operand(lhs, 2), operand(rhs, 2)),
        CpTerm::Lt(lhs, rhs) => format!("{} < {}", operand(lhs, 2), operand(rhs, 2)),
        CpTerm::Gt(lhs, rhs) => format!("{} > {}", operand(lhs, 2), operand(rhs, 2)),
        CpTerm::And(terms) => connective(terms, "/\\", "true"),
        CpTerm::Or(terms) => connective(terms, "\\/", "false"),
        CpTerm::Count(v, value) => format!("count({v}, {value})"),
    }
}

/// Binding strength; 0 for atoms.
fn precedence(term: &CpTerm) -> u8 {
    match term {
        CpTerm::Var(_)
        | CpTerm::Elem(..)
        | CpTerm::IntLit(_)
        | CpTerm::BoolLit(_)
        | CpTerm::Count(..) => 0,
        CpTerm::Add(..) => 1,
        CpTerm::Eq(..) | CpTerm::Ne(..) | CpTerm::Lt(..) | CpTerm::Gt(..) => 2,
        CpTerm::And(terms) | CpTerm::Or(terms) if terms.len() <= 1 => {
            terms.first().map_or(0, precedence)
        }
        CpTerm::And(_) | CpTerm::Or(_) => 3,
    }
}

fn operand(term: &CpTerm, parent: u8) -> String {
    let inner = to_minizinc(term);
    if precedence(term) >= parent && precedence(term) > 0 {
        format!("({inner})")
    } else {
        inner
    }
}

fn connective(terms: &[CpTerm], op: &str, empty: &str) -> String {
    match terms {
        [] => empty.to_string(),
        [single] => to_minizinc(single),
        _ => {
            let inner: Vec<String> = terms
                .iter()
                .map(|t| {
                    if precedence(t) > 0 {
                        format!("({})", to_minizinc(t))
                    } else {
                        to_minizinc(t)
                    }
                })
                .collect();
            inner.join(&format!(" {op} "))
        }
    }
}

pub fn decl_to_minizinc(decl: &ArrayDecl) -> String {
    format!(
        "array[0..{}] of var {}..{}: {};",
        decl.len as i64 - 1,
        decl.lower,
        decl.upper,
        decl.var
    )
}

fn show_to_minizinc(entries: &[ShowEntry]) -> String {
    let parts: Vec<String> = entries
        .iter()
        .map(|entry| {
            let name = entry.var.rendered();
            let mut part = format!("\"{name} = \" ++ show({name}) ++ \"\\n\"");
            if entry.with_weight {
                part.push_str(" ++ \"0\" ++ \"\\n\"");
            }
            part
        })
        .collect();
    format!("output[{}];", parts.join(" ++ "))
}

/// Print one model item as a MiniZinc statement.
pub fn item_to_minizinc(item: &CpItem) -> String {
    match item {
        CpItem::Include(file) => format!("include \"{file}\";"),
        CpItem::Declare(decl) => decl_to_minizinc(decl),
        CpItem::Constraint(term) => format!("constraint {};", to_minizinc(term)),
        CpItem::Text(text) => text.clone(),
        CpItem::Solve(SolveGoal::Satisfy) => "solve satisfy;".to_string(),
        CpItem::Output(entries) => show_to_minizinc(entries),
    }
}
