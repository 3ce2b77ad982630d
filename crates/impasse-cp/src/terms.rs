use std::fmt;

/// Marker prepended to every identifier owned by the backward half-model.
pub const INVERSE_MARKER: &str = "inverse_";

/// Which half-model a variable reference belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Namespace {
    #[default]
    Forward,
    Inverse,
}

/// A reference to a model variable, tagged with its namespace.
///
/// The name never carries the inversion marker itself; the marker is only
/// produced when the reference is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VarRef {
    pub namespace: Namespace,
    pub name: String,
}

impl VarRef {
    pub fn forward(name: impl Into<String>) -> Self {
        Self {
            namespace: Namespace::Forward,
            name: name.into(),
        }
    }

    pub fn inverse(name: impl Into<String>) -> Self {
        Self {
            namespace: Namespace::Inverse,
            name: name.into(),
        }
    }

    /// Read a rendered identifier back into a reference; any number of
    /// leading markers collapses into the inverse namespace.
    pub fn parse(rendered: &str) -> Self {
        let mut name = rendered;
        let mut namespace = Namespace::Forward;
        while let Some(rest) = name.strip_prefix(INVERSE_MARKER) {
            name = rest;
            namespace = Namespace::Inverse;
        }
        Self {
            namespace,
            name: name.to_string(),
        }
    }

    /// Move the reference into the inverse namespace.
    pub fn mark_inverse(&mut self) {
        self.normalize();
        self.namespace = Namespace::Inverse;
    }

    /// Fold markers that leaked into the name into the namespace tag.
    pub fn normalize(&mut self) {
        if self.name.starts_with(INVERSE_MARKER) {
            *self = VarRef::parse(&self.to_string());
        }
    }

    pub fn rendered(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for VarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.namespace {
            Namespace::Forward => f.write_str(&self.name),
            Namespace::Inverse => write!(f, "{INVERSE_MARKER}{}", self.name),
        }
    }
}

/// Abstract constraint term, solver-language agnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CpTerm {
    /// Whole-array or scalar variable.
    Var(VarRef),
    /// Array element `x[i]`.
    Elem(VarRef, usize),
    IntLit(i64),
    BoolLit(bool),

    Add(Box<CpTerm>, Box<CpTerm>),

    Eq(Box<CpTerm>, Box<CpTerm>),
    Ne(Box<CpTerm>, Box<CpTerm>),
    Lt(Box<CpTerm>, Box<CpTerm>),
    Gt(Box<CpTerm>, Box<CpTerm>),

    And(Vec<CpTerm>),
    Or(Vec<CpTerm>),

    /// Number of elements of an array equal to a value.
    Count(VarRef, i64),
}

#[allow(clippy::should_implement_trait)]
impl CpTerm {
    pub fn var(var: VarRef) -> Self {
        CpTerm::Var(var)
    }

    pub fn elem(var: VarRef, index: usize) -> Self {
        CpTerm::Elem(var, index)
    }

    pub fn int(n: i64) -> Self {
        CpTerm::IntLit(n)
    }

    pub fn bool(b: bool) -> Self {
        CpTerm::BoolLit(b)
    }

    pub fn count(var: VarRef, value: i64) -> Self {
        CpTerm::Count(var, value)
    }

    pub fn add(self, other: CpTerm) -> Self {
        CpTerm::Add(Box::new(self), Box::new(other))
    }

    pub fn eq(self, other: CpTerm) -> Self {
        CpTerm::Eq(Box::new(self), Box::new(other))
    }

    pub fn ne(self, other: CpTerm) -> Self {
        CpTerm::Ne(Box::new(self), Box::new(other))
    }

    pub fn lt(self, other: CpTerm) -> Self {
        CpTerm::Lt(Box::new(self), Box::new(other))
    }

    pub fn gt(self, other: CpTerm) -> Self {
        CpTerm::Gt(Box::new(self), Box::new(other))
    }

    pub fn and(terms: Vec<CpTerm>) -> Self {
        CpTerm::And(terms)
    }

    pub fn or(terms: Vec<CpTerm>) -> Self {
        CpTerm::Or(terms)
    }

    /// Visit every variable reference in the term.
    pub fn for_each_var_mut(&mut self, f: &mut impl FnMut(&mut VarRef)) {
        match self {
            CpTerm::Var(v) | CpTerm::Elem(v, _) | CpTerm::Count(v, _) => f(v),
            CpTerm::IntLit(_) | CpTerm::BoolLit(_) => {}
            CpTerm::Add(lhs, rhs)
            | CpTerm::Eq(lhs, rhs)
            | CpTerm::Ne(lhs, rhs)
            | CpTerm::Lt(lhs, rhs)
            | CpTerm::Gt(lhs, rhs) => {
                lhs.for_each_var_mut(f);
                rhs.for_each_var_mut(f);
            }
            CpTerm::And(terms) | CpTerm::Or(terms) => {
                for term in terms {
                    term.for_each_var_mut(f);
                }
            }
        }
    }

    /// Read-only counterpart of [`CpTerm::for_each_var_mut`].
    pub fn for_each_var(&self, f: &mut impl FnMut(&VarRef)) {
        match self {
            CpTerm::Var(v) | CpTerm::Elem(v, _) | CpTerm::Count(v, _) => f(v),
            CpTerm::IntLit(_) | CpTerm::BoolLit(_) => {}
            CpTerm::Add(lhs, rhs)
            | CpTerm::Eq(lhs, rhs)
            | CpTerm::Ne(lhs, rhs)
            | CpTerm::Lt(lhs, rhs)
            | CpTerm::Gt(lhs, rhs) => {
                lhs.for_each_var(f);
                rhs.for_each_var(f);
            }
            CpTerm::And(terms) | CpTerm::Or(terms) => {
                for term in terms {
                    term.for_each_var(f);
                }
            }
        }
    }

    /// All variable references, in left-to-right order.
    pub fn vars(&self) -> Vec<VarRef> {
        let mut out = Vec::new();
        self.for_each_var(&mut |v| out.push(v.clone()));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_collapses_repeated_markers() {
        let v = VarRef::parse("inverse_inverse_xor_0_0");
        assert_eq!(v, VarRef::inverse("xor_0_0"));
        assert_eq!(v.to_string(), "inverse_xor_0_0");
        assert_eq!(VarRef::parse("key"), VarRef::forward("key"));
    }

    #[test]
    fn mark_inverse_never_double_marks() {
        let mut v = VarRef::forward("inverse_rot_1_1");
        v.mark_inverse();
        assert_eq!(v.to_string(), "inverse_rot_1_1");
        v.mark_inverse();
        assert_eq!(v.to_string(), "inverse_rot_1_1");
    }

    #[test]
    fn vars_are_listed_left_to_right() {
        let term = CpTerm::elem(VarRef::forward("a"), 0)
            .add(CpTerm::elem(VarRef::inverse("b"), 1))
            .eq(CpTerm::int(1));
        assert_eq!(
            term.vars(),
            vec![VarRef::forward("a"), VarRef::inverse("b")]
        );
    }
}
