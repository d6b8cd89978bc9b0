//! Sorts (types) of terms.

use lasso::Spur;
use rustc_hash::FxHashMap;

/// Sort identifier, an index into the [`SortManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SortId(pub u32);

/// Kind of a sort.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SortKind {
    /// Booleans.
    Bool,
    /// Mathematical integers.
    Int,
    /// Bit-vectors of the given width.
    BitVec(u32),
    /// IEEE floating point with `eb` exponent bits and `sb` significand bits (hidden bit included).
    FloatingPoint {
        /// Exponent width.
        eb: u32,
        /// Significand width, including the hidden bit.
        sb: u32,
    },
    /// Uninterpreted sort.
    Uninterpreted(Spur),
}

/// A sort.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sort {
    /// The kind.
    pub kind: SortKind,
}

impl Sort {
    /// Bit-vector width, if this is a bit-vector sort.
    #[must_use]
    pub fn bitvec_width(&self) -> Option<u32> {
        match self.kind {
            SortKind::BitVec(w) => Some(w),
            _ => None,
        }
    }

    /// `(eb, sb)` if this is a floating-point sort.
    #[must_use]
    pub fn fp_format(&self) -> Option<(u32, u32)> {
        match self.kind {
            SortKind::FloatingPoint { eb, sb } => Some((eb, sb)),
            _ => None,
        }
    }

    /// Is this the Boolean sort?
    #[must_use]
    pub fn is_bool(&self) -> bool {
        matches!(self.kind, SortKind::Bool)
    }
}

/// Interning table for sorts.
#[derive(Debug, Clone)]
pub struct SortManager {
    sorts: Vec<Sort>,
    cache: FxHashMap<SortKind, SortId>,
    /// The Boolean sort.
    pub bool_sort: SortId,
    /// The integer sort.
    pub int_sort: SortId,
}

impl SortManager {
    /// Create a manager with the builtin sorts registered.
    #[must_use]
    pub fn new() -> Self {
        let mut manager = Self {
            sorts: Vec::new(),
            cache: FxHashMap::default(),
            bool_sort: SortId(0),
            int_sort: SortId(0),
        };
        manager.bool_sort = manager.intern(SortKind::Bool);
        manager.int_sort = manager.intern(SortKind::Int);
        manager
    }

    /// Intern a sort kind.
    pub fn intern(&mut self, kind: SortKind) -> SortId {
        if let Some(&id) = self.cache.get(&kind) {
            return id;
        }
        let id = SortId(self.sorts.len() as u32);
        self.sorts.push(Sort { kind: kind.clone() });
        self.cache.insert(kind, id);
        id
    }

    /// Bit-vector sort of the given width.
    pub fn bitvec(&mut self, width: u32) -> SortId {
        assert!(width > 0, "bit-vector width must be positive");
        self.intern(SortKind::BitVec(width))
    }

    /// Floating-point sort.
    pub fn float(&mut self, eb: u32, sb: u32) -> SortId {
        assert!(eb >= 2 && sb >= 2, "invalid floating-point format ({eb}, {sb})");
        self.intern(SortKind::FloatingPoint { eb, sb })
    }

    /// Look up a sort.
    #[must_use]
    pub fn get(&self, id: SortId) -> Option<&Sort> {
        self.sorts.get(id.0 as usize)
    }

    /// Number of interned sorts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sorts.len()
    }

    /// Never true: the builtin sorts are always present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sorts.is_empty()
    }
}

impl Default for SortManager {
    fn default() -> Self {
        Self::new()
    }
}
