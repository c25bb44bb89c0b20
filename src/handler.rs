//! Handlers and ordered handler lists.
//!
//! A handler maps one effect type to a handling computation. A list is
//! installed on a region frame at composition time and searched linearly, in
//! install order, whenever an effect dispatch walks past that frame.
//! Searching never mutates the list; invoking a match produces a fresh
//! handler-body task each time.

use std::marker::PhantomData;

use crate::effect::{Effect, EffectId, EffectInstance};
use crate::error::RunError;
use crate::prog::RawTask;
use crate::resumer::{RawResumer, Resumer};
use crate::set::EffectSet;
use crate::task::Task;

type HandlerFn = Box<dyn FnMut(EffectInstance, RawResumer) -> Result<RawTask, RunError>>;

pub(crate) struct HandlerEntry {
    id: EffectId,
    body_effects: EffectSet,
    invoke: HandlerFn,
}

/// A handler for one effect type, producing a body task of value type `T`.
///
/// `T` ties the handler to the handled task's value type at compile time:
/// `Task::<T>::with` only accepts `Handler<T>`, which is how a normal return
/// from the handler body can complete the whole handled region.
pub struct Handler<T> {
    entry: HandlerEntry,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> Handler<T> {
    /// Build a handler for `E` from a closure over the effect instance and
    /// its resumer. The body's effect set defaults to empty; declare more
    /// with [`Handler::requiring`].
    pub fn of<E, F>(mut body: F) -> Handler<T>
    where
        E: Effect,
        F: FnMut(E, Resumer<E>) -> Task<T> + 'static,
    {
        let id = EffectId::of::<E>();
        let invoke: HandlerFn = Box::new(move |instance, resumer| {
            let effect = instance.downcast::<E>().map_err(|instance| {
                RunError::EffectPayload {
                    expected: id,
                    found: instance.id(),
                }
            })?;
            Ok(body(effect, Resumer::new(resumer)).into_raw())
        });
        Handler {
            entry: HandlerEntry {
                id,
                body_effects: EffectSet::empty(),
                invoke,
            },
            _marker: PhantomData,
        }
    }

    /// Declare effects the handler body may itself perform. These flow into
    /// the derived effect set of any task this handler is attached to.
    pub fn requiring(mut self, effects: EffectSet) -> Self {
        self.entry.body_effects = self.entry.body_effects.union(&effects);
        self
    }

    /// The effect type this handler serves.
    pub fn effect(&self) -> EffectId {
        self.entry.id
    }

    /// The declared effect set of the handler's bodies.
    pub fn body_effects(&self) -> &EffectSet {
        &self.entry.body_effects
    }

    pub(crate) fn into_entry(self) -> HandlerEntry {
        self.entry
    }
}

impl<T> std::fmt::Debug for Handler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handler")
            .field("effect", &self.entry.id)
            .field("body_effects", &self.entry.body_effects)
            .finish()
    }
}

/// Ordered, heterogeneous collection of handler entries.
pub(crate) struct HandlerList {
    entries: Vec<HandlerEntry>,
}

impl HandlerList {
    pub fn new(entries: Vec<HandlerEntry>) -> Self {
        HandlerList { entries }
    }

    /// Linear search in install order; first match wins. Never mutates.
    pub fn find(&self, id: EffectId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    /// Invoke the entry at `idx`, producing a fresh handler-body task.
    ///
    /// The body's declared effect set is validated against the handler's
    /// declaration; a body requiring more than declared is fatal.
    pub fn invoke(
        &mut self,
        idx: usize,
        instance: EffectInstance,
        resumer: RawResumer,
    ) -> Result<RawTask, RunError> {
        let entry = &mut self.entries[idx];
        let body = (entry.invoke)(instance, resumer)?;
        if !entry.body_effects.contains_all(&body.effects) {
            return Err(RunError::UndeclaredEffects {
                effect: entry.id,
                undeclared: body.effects.subtract(&entry.body_effects),
            });
        }
        Ok(body)
    }

    /// Union of the effect types served by this list.
    pub fn handled_effects(&self) -> EffectSet {
        self.entries.iter().map(|entry| entry.id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ResumerId;

    struct Ping;
    impl Effect for Ping {
        type Resume = i64;
    }

    struct Pong;
    impl Effect for Pong {
        type Resume = i64;
    }

    fn raw_resumer() -> RawResumer {
        RawResumer {
            id: ResumerId::fresh(),
        }
    }

    #[test]
    fn test_find_first_match_in_install_order() {
        let a = Handler::<i64>::of(|_: Ping, _| Task::value(1)).into_entry();
        let b = Handler::<i64>::of(|_: Pong, _| Task::value(2)).into_entry();
        let list = HandlerList::new(vec![a, b]);

        assert_eq!(list.find(EffectId::of::<Ping>()), Some(0));
        assert_eq!(list.find(EffectId::of::<Pong>()), Some(1));
        assert_eq!(list.find(EffectId::of::<Ping>()), Some(0));
    }

    #[test]
    fn test_find_no_match() {
        let a = Handler::<i64>::of(|_: Ping, _| Task::value(1)).into_entry();
        let list = HandlerList::new(vec![a]);
        assert!(list.find(EffectId::of::<Pong>()).is_none());
    }

    #[test]
    fn test_invoke_produces_body_task() {
        let entry = Handler::<i64>::of(|eff: Ping, _| {
            let _ = eff;
            Task::value(9)
        })
        .into_entry();
        let mut list = HandlerList::new(vec![entry]);

        let body = list
            .invoke(0, EffectInstance::of(Ping), raw_resumer())
            .unwrap();
        assert!(body.effects.is_empty());
    }

    #[test]
    fn test_invoke_rejects_undeclared_body_effects() {
        let entry = Handler::<i64>::of(|_: Ping, _| {
            Task::value(0).requiring(crate::effects![Pong])
        })
        .into_entry();
        let mut list = HandlerList::new(vec![entry]);

        let err = list
            .invoke(0, EffectInstance::of(Ping), raw_resumer())
            .unwrap_err();
        assert!(matches!(err, RunError::UndeclaredEffects { .. }));
    }

    #[test]
    fn test_declared_body_effects_accepted() {
        let entry = Handler::<i64>::of(|_: Ping, _| {
            Task::value(0).requiring(crate::effects![Pong])
        })
        .requiring(crate::effects![Pong])
        .into_entry();
        let mut list = HandlerList::new(vec![entry]);

        assert!(list
            .invoke(0, EffectInstance::of(Ping), raw_resumer())
            .is_ok());
    }

    #[test]
    fn test_handled_effects_union() {
        let a = Handler::<i64>::of(|_: Ping, _| Task::value(1)).into_entry();
        let b = Handler::<i64>::of(|_: Pong, _| Task::value(2)).into_entry();
        let list = HandlerList::new(vec![a, b]);

        let handled = list.handled_effects();
        assert!(handled.contains_type::<Ping>());
        assert!(handled.contains_type::<Pong>());
        assert_eq!(handled.len(), 2);
    }
}
