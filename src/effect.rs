//! Effect declarations and stable per-type identity.
//!
//! An effect type is an ordinary value type with an associated resume type.
//! Identity comparisons use a per-type descriptor built on `TypeId` rather
//! than any link-time address trick, so the contract holds across
//! compilation units: `EffectId::of::<E>() == EffectId::of::<E>()` always,
//! and distinct effect types never compare equal.

use std::any::TypeId;

use crate::value::Value;

/// A declared effect: a payload type plus the type its resumption yields.
pub trait Effect: 'static {
    /// What the performance expression evaluates to once resumed.
    type Resume: 'static;

    fn name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Stable runtime descriptor for an effect type.
#[derive(Clone, Copy, Debug)]
pub struct EffectId {
    type_id: TypeId,
    name: &'static str,
}

impl EffectId {
    pub fn of<E: Effect>() -> Self {
        EffectId {
            type_id: TypeId::of::<E>(),
            name: E::name(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for EffectId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for EffectId {}

impl std::hash::Hash for EffectId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl std::fmt::Display for EffectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// A performed effect in flight: identity plus the type-erased payload.
///
/// Created at the performance site and passed to the matching handler, which
/// downcasts it back to the concrete effect type.
#[derive(Debug)]
pub struct EffectInstance {
    id: EffectId,
    payload: Value,
}

impl EffectInstance {
    pub fn of<E: Effect>(effect: E) -> Self {
        EffectInstance {
            id: EffectId::of::<E>(),
            payload: Value::new(effect),
        }
    }

    pub fn id(&self) -> EffectId {
        self.id
    }

    pub fn is<E: Effect>(&self) -> bool {
        self.id == EffectId::of::<E>()
    }

    /// Move the payload out, or hand the instance back on identity mismatch.
    pub fn downcast<E: Effect>(self) -> Result<E, EffectInstance> {
        let id = self.id;
        self.payload
            .downcast::<E>()
            .map_err(|payload| EffectInstance { id, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Get;
    impl Effect for Get {
        type Resume = i64;
    }

    #[derive(Debug)]
    struct Put(i64);
    impl Effect for Put {
        type Resume = i64;
    }

    #[test]
    fn test_effect_id_reflexive() {
        assert_eq!(EffectId::of::<Get>(), EffectId::of::<Get>());
    }

    #[test]
    fn test_effect_id_distinguishes_types() {
        assert_ne!(EffectId::of::<Get>(), EffectId::of::<Put>());
    }

    #[test]
    fn test_effect_id_name() {
        assert!(EffectId::of::<Get>().name().ends_with("Get"));
    }

    #[test]
    fn test_instance_downcast() {
        let inst = EffectInstance::of(Put(7));
        assert!(inst.is::<Put>());
        assert!(!inst.is::<Get>());
        let put = inst.downcast::<Put>().unwrap();
        assert_eq!(put.0, 7);
    }

    #[test]
    fn test_instance_downcast_mismatch_keeps_instance() {
        let inst = EffectInstance::of(Put(7));
        let inst = inst.downcast::<Get>().unwrap_err();
        assert_eq!(inst.id(), EffectId::of::<Put>());
    }
}
