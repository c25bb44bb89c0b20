//! Effect-set algebra.
//!
//! An `EffectSet` is an order-irrelevant, deduplicating set of effect
//! descriptors attached to a task. It is validated at two points: attaching
//! handlers is only accepted if the task's set contains every handled effect
//! type, and driving a task to completion is only accepted when its set is
//! empty. The checks run at composition/drive time, so a violation is caught
//! while the program tree is being built, never mid-run.

use crate::effect::{Effect, EffectId};

/// A set of effect descriptors, deduplicated, insertion order irrelevant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EffectSet {
    ids: Vec<EffectId>,
}

impl EffectSet {
    pub fn empty() -> Self {
        EffectSet { ids: Vec::new() }
    }

    pub fn of<E: Effect>() -> Self {
        let mut set = EffectSet::empty();
        set.insert(EffectId::of::<E>());
        set
    }

    /// Add one descriptor; duplicates are ignored.
    pub fn insert(&mut self, id: EffectId) {
        if !self.contains(id) {
            self.ids.push(id);
        }
    }

    pub fn contains(&self, id: EffectId) -> bool {
        self.ids.contains(&id)
    }

    pub fn contains_type<E: Effect>(&self) -> bool {
        self.contains(EffectId::of::<E>())
    }

    /// Subset test: every descriptor of `other` is in `self`.
    pub fn contains_all(&self, other: &EffectSet) -> bool {
        other.ids.iter().all(|id| self.contains(*id))
    }

    /// Set union, deduplicating.
    pub fn union(&self, other: &EffectSet) -> EffectSet {
        let mut out = self.clone();
        for id in &other.ids {
            out.insert(*id);
        }
        out
    }

    /// Set difference.
    pub fn subtract(&self, other: &EffectSet) -> EffectSet {
        EffectSet {
            ids: self
                .ids
                .iter()
                .copied()
                .filter(|id| !other.contains(*id))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = EffectId> + '_ {
        self.ids.iter().copied()
    }
}

impl FromIterator<EffectId> for EffectSet {
    fn from_iter<I: IntoIterator<Item = EffectId>>(iter: I) -> Self {
        let mut set = EffectSet::empty();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

impl std::fmt::Display for EffectSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (i, id) in self.ids.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{id}")?;
        }
        f.write_str("}")
    }
}

/// Build an [`EffectSet`] from a list of effect types.
///
/// ```
/// use effx::{effects, Effect, EffectSet};
///
/// struct Get;
/// impl Effect for Get { type Resume = i64; }
/// struct Put(i64);
/// impl Effect for Put { type Resume = i64; }
///
/// let set = effects![Get, Put];
/// assert_eq!(set.len(), 2);
/// ```
#[macro_export]
macro_rules! effects {
    () => { $crate::EffectSet::empty() };
    ($($effect:ty),+ $(,)?) => {{
        let mut set = $crate::EffectSet::empty();
        $(set.insert($crate::EffectId::of::<$effect>());)+
        set
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    struct A;
    impl Effect for A {
        type Resume = ();
    }

    struct B;
    impl Effect for B {
        type Resume = ();
    }

    struct C;
    impl Effect for C {
        type Resume = ();
    }

    #[test]
    fn test_empty_set() {
        let set = EffectSet::empty();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn test_insert_deduplicates() {
        let mut set = EffectSet::of::<A>();
        set.insert(EffectId::of::<A>());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_membership() {
        let set = effects![A, B];
        assert!(set.contains_type::<A>());
        assert!(set.contains_type::<B>());
        assert!(!set.contains_type::<C>());
    }

    #[test]
    fn test_subset() {
        let big = effects![A, B, C];
        let small = effects![A, C];
        assert!(big.contains_all(&small));
        assert!(!small.contains_all(&big));
        assert!(small.contains_all(&EffectSet::empty()));
    }

    #[test]
    fn test_union_deduplicates() {
        let left = effects![A, B];
        let right = effects![B, C];
        let joined = left.union(&right);
        assert_eq!(joined.len(), 3);
    }

    #[test]
    fn test_subtract() {
        let set = effects![A, B, C];
        let rest = set.subtract(&effects![B]);
        assert_eq!(rest.len(), 2);
        assert!(!rest.contains_type::<B>());
        assert!(rest.contains_type::<A>());
        assert!(rest.contains_type::<C>());
    }

    #[test]
    fn test_order_irrelevant_equality_via_subsets() {
        let ab = effects![A, B];
        let ba = effects![B, A];
        assert!(ab.contains_all(&ba) && ba.contains_all(&ab));
    }

    #[test]
    fn test_display() {
        let set = effects![A];
        let shown = set.to_string();
        assert!(shown.starts_with('{') && shown.ends_with('}'));
        assert!(shown.contains("A"));
    }
}
