//! Arena-allocated terms with hash-consed [`TermId`] references.
//!
//! Terms are opaque handles from the enumerator's point of view: the engine
//! only relies on a term's kind tag, its sort, its children and its depth.
//! Structurally equal terms are interned to the same id, so `TermId` equality
//! is syntactic identity.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Reference to an interned term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(pub u32);

/// Reference to a declared sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortId(pub u32);

/// Syntactic kind tag of a term.
///
/// The set of kinds is fixed so that bag-of-kinds histograms have a stable
/// dense layout (see [`crate::features`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TermKind {
    /// Boolean constant `true`.
    True,
    /// Boolean constant `false`.
    False,
    /// Integer literal.
    IntConst,
    /// Free (ground) variable or constant symbol.
    Var,
    /// Variable bound by a quantifier.
    BoundVar,
    /// The bound-variable list of a quantifier.
    VarList,
    /// Universal quantifier.
    Forall,
    /// Boolean negation.
    Not,
    /// N-ary conjunction.
    And,
    /// N-ary disjunction.
    Or,
    /// Implication.
    Implies,
    /// If-then-else.
    Ite,
    /// Equality.
    Eq,
    /// Strict less-than.
    Lt,
    /// Less-or-equal.
    Leq,
    /// N-ary addition.
    Add,
    /// Binary subtraction.
    Sub,
    /// N-ary multiplication.
    Mul,
    /// Arithmetic negation.
    Neg,
    /// Uninterpreted function application.
    Apply,
    /// Array select.
    Select,
    /// Array store.
    Store,
}

impl TermKind {
    /// Number of distinct kinds.
    pub const COUNT: usize = 22;

    /// All kinds in histogram order.
    pub const ALL: [TermKind; TermKind::COUNT] = [
        TermKind::True,
        TermKind::False,
        TermKind::IntConst,
        TermKind::Var,
        TermKind::BoundVar,
        TermKind::VarList,
        TermKind::Forall,
        TermKind::Not,
        TermKind::And,
        TermKind::Or,
        TermKind::Implies,
        TermKind::Ite,
        TermKind::Eq,
        TermKind::Lt,
        TermKind::Leq,
        TermKind::Add,
        TermKind::Sub,
        TermKind::Mul,
        TermKind::Neg,
        TermKind::Apply,
        TermKind::Select,
        TermKind::Store,
    ];

    /// Dense index of this kind, used as a histogram slot.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lower-case name used in feature-slot labels.
    pub const fn name(self) -> &'static str {
        match self {
            TermKind::True => "true",
            TermKind::False => "false",
            TermKind::IntConst => "int_const",
            TermKind::Var => "var",
            TermKind::BoundVar => "bound_var",
            TermKind::VarList => "var_list",
            TermKind::Forall => "forall",
            TermKind::Not => "not",
            TermKind::And => "and",
            TermKind::Or => "or",
            TermKind::Implies => "implies",
            TermKind::Ite => "ite",
            TermKind::Eq => "eq",
            TermKind::Lt => "lt",
            TermKind::Leq => "leq",
            TermKind::Add => "add",
            TermKind::Sub => "sub",
            TermKind::Mul => "mul",
            TermKind::Neg => "neg",
            TermKind::Apply => "apply",
            TermKind::Select => "select",
            TermKind::Store => "store",
        }
    }
}

/// An interned term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Term {
    /// Kind tag.
    pub kind: TermKind,
    /// Sort of the term.
    pub sort: SortId,
    /// Child terms, empty for leaves.
    pub children: SmallVec<[TermId; 4]>,
    /// Symbol name for variables and function applications.
    pub symbol: Option<Box<str>>,
    /// Literal value for integer constants.
    pub value: Option<i64>,
    /// Syntactic depth: 0 for leaves, 1 + max child depth otherwise.
    pub depth: u32,
}

/// The sort table of a [`TermManager`].
#[derive(Debug)]
pub struct Sorts {
    /// The builtin Boolean sort.
    pub bool_sort: SortId,
    /// The builtin integer sort.
    pub int_sort: SortId,
    names: Vec<String>,
}

impl Sorts {
    fn new() -> Self {
        Self {
            bool_sort: SortId(0),
            int_sort: SortId(1),
            names: vec!["Bool".to_string(), "Int".to_string()],
        }
    }

    /// Declare a fresh uninterpreted sort.
    pub fn declare(&mut self, name: impl Into<String>) -> SortId {
        let id = SortId(self.names.len() as u32);
        self.names.push(name.into());
        id
    }

    /// Name of a sort.
    pub fn name(&self, sort: SortId) -> &str {
        &self.names[sort.0 as usize]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TermKey {
    kind: TermKind,
    sort: SortId,
    children: SmallVec<[TermId; 4]>,
    symbol: Option<Box<str>>,
    value: Option<i64>,
}

/// Term arena with hash-consing.
#[derive(Debug)]
pub struct TermManager {
    terms: Vec<Term>,
    table: FxHashMap<TermKey, TermId>,
    /// Sort table.
    pub sorts: Sorts,
}

impl TermManager {
    /// Create an empty term manager with the builtin sorts.
    pub fn new() -> Self {
        Self {
            terms: Vec::new(),
            table: FxHashMap::default(),
            sorts: Sorts::new(),
        }
    }

    fn intern(
        &mut self,
        kind: TermKind,
        sort: SortId,
        children: SmallVec<[TermId; 4]>,
        symbol: Option<Box<str>>,
        value: Option<i64>,
    ) -> TermId {
        let key = TermKey {
            kind,
            sort,
            children,
            symbol,
            value,
        };
        if let Some(&id) = self.table.get(&key) {
            return id;
        }
        let depth = key
            .children
            .iter()
            .map(|&c| self.terms[c.0 as usize].depth + 1)
            .max()
            .unwrap_or(0);
        let id = TermId(self.terms.len() as u32);
        self.terms.push(Term {
            kind: key.kind,
            sort: key.sort,
            children: key.children.clone(),
            symbol: key.symbol.clone(),
            value: key.value,
            depth,
        });
        self.table.insert(key, id);
        id
    }

    /// Look up a term by id.
    pub fn get(&self, id: TermId) -> &Term {
        &self.terms[id.0 as usize]
    }

    /// Kind tag of a term.
    pub fn kind(&self, id: TermId) -> TermKind {
        self.get(id).kind
    }

    /// Sort of a term.
    pub fn sort_of(&self, id: TermId) -> SortId {
        self.get(id).sort
    }

    /// Children of a term.
    pub fn children(&self, id: TermId) -> &[TermId] {
        &self.get(id).children
    }

    /// Syntactic depth of a term.
    pub fn depth(&self, id: TermId) -> u32 {
        self.get(id).depth
    }

    /// Number of interned terms.
    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    /// Boolean constant `true`.
    pub fn mk_true(&mut self) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern(TermKind::True, sort, SmallVec::new(), None, None)
    }

    /// Boolean constant `false`.
    pub fn mk_false(&mut self) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern(TermKind::False, sort, SmallVec::new(), None, None)
    }

    /// Integer literal.
    pub fn mk_int(&mut self, value: i64) -> TermId {
        let sort = self.sorts.int_sort;
        self.intern(TermKind::IntConst, sort, SmallVec::new(), None, Some(value))
    }

    /// Free variable / constant symbol.
    pub fn mk_var(&mut self, name: impl Into<Box<str>>, sort: SortId) -> TermId {
        self.intern(TermKind::Var, sort, SmallVec::new(), Some(name.into()), None)
    }

    /// Quantifier-bound variable.
    pub fn mk_bound_var(&mut self, name: impl Into<Box<str>>, sort: SortId) -> TermId {
        self.intern(
            TermKind::BoundVar,
            sort,
            SmallVec::new(),
            Some(name.into()),
            None,
        )
    }

    /// Boolean negation.
    pub fn mk_not(&mut self, t: TermId) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern(TermKind::Not, sort, SmallVec::from_slice(&[t]), None, None)
    }

    /// N-ary conjunction.
    pub fn mk_and(&mut self, args: Vec<TermId>) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern(TermKind::And, sort, SmallVec::from_vec(args), None, None)
    }

    /// N-ary disjunction.
    pub fn mk_or(&mut self, args: Vec<TermId>) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern(TermKind::Or, sort, SmallVec::from_vec(args), None, None)
    }

    /// Implication.
    pub fn mk_implies(&mut self, lhs: TermId, rhs: TermId) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern(
            TermKind::Implies,
            sort,
            SmallVec::from_slice(&[lhs, rhs]),
            None,
            None,
        )
    }

    /// Equality.
    pub fn mk_eq(&mut self, lhs: TermId, rhs: TermId) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern(
            TermKind::Eq,
            sort,
            SmallVec::from_slice(&[lhs, rhs]),
            None,
            None,
        )
    }

    /// Strict less-than.
    pub fn mk_lt(&mut self, lhs: TermId, rhs: TermId) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern(
            TermKind::Lt,
            sort,
            SmallVec::from_slice(&[lhs, rhs]),
            None,
            None,
        )
    }

    /// Less-or-equal.
    pub fn mk_leq(&mut self, lhs: TermId, rhs: TermId) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern(
            TermKind::Leq,
            sort,
            SmallVec::from_slice(&[lhs, rhs]),
            None,
            None,
        )
    }

    /// N-ary addition.
    pub fn mk_add(&mut self, args: Vec<TermId>) -> TermId {
        let sort = self.sorts.int_sort;
        self.intern(TermKind::Add, sort, SmallVec::from_vec(args), None, None)
    }

    /// N-ary multiplication.
    pub fn mk_mul(&mut self, args: Vec<TermId>) -> TermId {
        let sort = self.sorts.int_sort;
        self.intern(TermKind::Mul, sort, SmallVec::from_vec(args), None, None)
    }

    /// Arithmetic negation.
    pub fn mk_neg(&mut self, t: TermId) -> TermId {
        let sort = self.sorts.int_sort;
        self.intern(TermKind::Neg, sort, SmallVec::from_slice(&[t]), None, None)
    }

    /// Uninterpreted function application.
    pub fn mk_apply(
        &mut self,
        name: impl Into<Box<str>>,
        sort: SortId,
        args: Vec<TermId>,
    ) -> TermId {
        self.intern(
            TermKind::Apply,
            sort,
            SmallVec::from_vec(args),
            Some(name.into()),
            None,
        )
    }

    /// Universal quantifier over `bound_vars` with the given body.
    ///
    /// # Panics
    ///
    /// Panics if `bound_vars` is empty or contains a non-bound-variable term.
    pub fn mk_forall(&mut self, bound_vars: Vec<TermId>, body: TermId) -> TermId {
        assert!(!bound_vars.is_empty(), "quantifier without bound variables");
        assert!(
            bound_vars
                .iter()
                .all(|&v| self.kind(v) == TermKind::BoundVar),
            "quantifier variable list must contain bound variables"
        );
        let sort = self.sorts.bool_sort;
        let var_list = self.intern(
            TermKind::VarList,
            sort,
            SmallVec::from_vec(bound_vars),
            None,
            None,
        );
        self.intern(
            TermKind::Forall,
            sort,
            SmallVec::from_slice(&[var_list, body]),
            None,
            None,
        )
    }

    /// Bound variables of a quantifier, in declaration order.
    ///
    /// # Panics
    ///
    /// Panics if `quantifier` is not a [`TermKind::Forall`] term.
    pub fn bound_vars(&self, quantifier: TermId) -> &[TermId] {
        let q = self.get(quantifier);
        assert_eq!(q.kind, TermKind::Forall, "not a quantifier");
        self.children(q.children[0])
    }

    /// Number of bound variables of a quantifier.
    pub fn num_bound_vars(&self, quantifier: TermId) -> usize {
        self.bound_vars(quantifier).len()
    }

    /// Body of a quantifier.
    pub fn body(&self, quantifier: TermId) -> TermId {
        let q = self.get(quantifier);
        assert_eq!(q.kind, TermKind::Forall, "not a quantifier");
        q.children[1]
    }
}

impl Default for TermManager {
    fn default() -> Self {
        Self::new()
    }
}
