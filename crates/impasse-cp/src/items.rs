//! Top-level model items: declarations, constraints, directives.

use crate::terms::{CpTerm, VarRef};

/// `array[0..len-1] of var lower..upper: var;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayDecl {
    pub var: VarRef,
    pub len: usize,
    pub lower: i64,
    pub upper: i64,
}

impl ArrayDecl {
    /// A bit array over the truncated domain `{0, 1, 2}`.
    pub fn truncated(var: VarRef, len: usize) -> Self {
        Self {
            var,
            len,
            lower: 0,
            upper: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveGoal {
    Satisfy,
}

/// One entry of the output directive: print `name = <value>` and, when
/// `with_weight` is set, a weight line `0` after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowEntry {
    pub var: VarRef,
    pub with_weight: bool,
}

impl ShowEntry {
    pub fn plain(var: VarRef) -> Self {
        Self {
            var,
            with_weight: false,
        }
    }

    pub fn weighted(var: VarRef) -> Self {
        Self {
            var,
            with_weight: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CpItem {
    Include(String),
    Declare(ArrayDecl),
    Constraint(CpTerm),
    /// Pre-rendered model text produced by an encoder.
    Text(String),
    Solve(SolveGoal),
    Output(Vec<ShowEntry>),
}

impl CpItem {
    pub fn text(text: impl Into<String>) -> Self {
        CpItem::Text(text.into())
    }

    /// Name introduced by this item, if it is a declaration.
    pub fn declared_name(&self) -> Option<String> {
        match self {
            CpItem::Declare(decl) => Some(decl.var.rendered()),
            CpItem::Text(text) => declared_name_in_text(text),
            _ => None,
        }
    }

    /// Visit every structured variable reference held by the item.
    pub fn for_each_var_mut(&mut self, f: &mut impl FnMut(&mut VarRef)) {
        match self {
            CpItem::Declare(decl) => f(&mut decl.var),
            CpItem::Constraint(term) => term.for_each_var_mut(f),
            CpItem::Output(entries) => {
                for entry in entries {
                    f(&mut entry.var);
                }
            }
            CpItem::Include(_) | CpItem::Text(_) | CpItem::Solve(_) => {}
        }
    }
}

/// Best-effort extraction of the declared name from a textual declaration
/// such as `array[0..3] of var 0..2: x;` or `array[0..15] of int: t = [..];`.
fn declared_name_in_text(text: &str) -> Option<String> {
    let text = text.trim();
    let is_decl = text.starts_with("array") || text.starts_with("var ") || text.starts_with("int");
    if !is_decl {
        return None;
    }
    let body = text.trim_end_matches(';');
    let head = body.split_once('=').map_or(body, |(head, _)| head);
    let (_, name) = head.rsplit_once(':')?;
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}
