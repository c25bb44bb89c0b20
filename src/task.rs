//! Tasks: the public computation abstraction.
//!
//! A `Task<T>` is a suspended computation producing a `T`, carrying the set
//! of effects it may still perform. Tasks are inert values: they are built by
//! the combinators here, can be moved freely, and only execute when driven.
//! `.with` attaches handlers and recomputes the effect set; driving is only
//! accepted once the set is empty.

use std::marker::PhantomData;

use crate::effect::{Effect, EffectId};
use crate::error::{ComposeError, RunError};
use crate::handler::{Handler, HandlerList};
use crate::machine::Machine;
use crate::prog::{Prog, RawTask};
use crate::set::EffectSet;
use crate::value::Value;

/// A suspendable computation producing a `T`.
pub struct Task<T> {
    raw: RawTask,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> Task<T> {
    /// A completed computation. Requires no effects.
    pub fn value(value: T) -> Task<T> {
        Task::from_raw(RawTask::pure(Value::new(value)))
    }

    /// Defer construction of the body until the task runs. The usual way to
    /// express recursive computations without building the whole tree up
    /// front. Effects the body performs must still be declared with
    /// [`Task::requiring`].
    pub fn defer<F>(body: F) -> Task<T>
    where
        F: FnOnce() -> Task<T> + 'static,
    {
        Task::from_raw(RawTask {
            prog: Prog::Bind {
                source: Box::new(Prog::Pure(Value::unit())),
                binder: Box::new(move |_| Ok(body().into_raw())),
            },
            effects: EffectSet::empty(),
        })
    }

    /// Sequence: run `self`, feed its value to `next`, run the result.
    ///
    /// The declared set carries over from `self`; effects performed by the
    /// continuation are declared with an enclosing [`Task::requiring`] call,
    /// usually once per task-producing function.
    pub fn then<U, F>(self, next: F) -> Task<U>
    where
        U: 'static,
        F: FnOnce(T) -> Task<U> + 'static,
    {
        let effects = self.raw.effects.clone();
        Task::from_raw(RawTask {
            prog: Prog::Bind {
                source: Box::new(self.raw.prog),
                binder: Box::new(move |value| {
                    let input = value.downcast::<T>().map_err(|value| RunError::ValueType {
                        expected: std::any::type_name::<T>(),
                        found: value.type_name(),
                    })?;
                    Ok(next(input).into_raw())
                }),
            },
            effects,
        })
    }

    /// Map the produced value.
    pub fn map<U, F>(self, f: F) -> Task<U>
    where
        U: 'static,
        F: FnOnce(T) -> U + 'static,
    {
        self.then(|value| Task::value(f(value)))
    }

    /// Declare additional effects this task may perform.
    pub fn requiring(mut self, effects: EffectSet) -> Task<T> {
        self.raw.effects = self.raw.effects.union(&effects);
        self
    }

    /// The set of effects this task may still perform.
    pub fn effects(&self) -> &EffectSet {
        &self.raw.effects
    }

    /// Attach handlers, producing a handled task whose effect set is
    /// `(S − handled) ∪ (handler body sets)`.
    ///
    /// Rejected if a handler serves an effect the task does not require, or
    /// if two handlers in the attachment serve the same effect. Handler value
    /// types are pinned to `T` by the signature.
    pub fn with(self, handlers: Vec<Handler<T>>) -> Result<HandledTask<T>, ComposeError> {
        let mut handled = EffectSet::empty();
        let mut body_effects = EffectSet::empty();
        for handler in &handlers {
            let effect = handler.effect();
            if handled.contains(effect) {
                return Err(ComposeError::DuplicateHandler { effect });
            }
            if !self.raw.effects.contains(effect) {
                return Err(ComposeError::NotRequired { effect });
            }
            handled.insert(effect);
            body_effects = body_effects.union(handler.body_effects());
        }

        let derived = self.raw.effects.subtract(&handled).union(&body_effects);
        let list = HandlerList::new(handlers.into_iter().map(Handler::into_entry).collect());
        Ok(HandledTask {
            inner: Task::from_raw(RawTask {
                prog: Prog::Handled {
                    body: Box::new(self.raw.prog),
                    handlers: list,
                },
                effects: derived,
            }),
        })
    }

    /// Drive to completion. Only accepted when the effect set is empty;
    /// synchronous, returns the produced value exactly once.
    pub fn run(self) -> Result<T, RunError> {
        if !self.raw.effects.is_empty() {
            return Err(RunError::ResidualEffects {
                effects: self.raw.effects,
            });
        }
        let mut machine = Machine::new(self.raw);
        let value = machine.run_to_completion()?;
        value.downcast::<T>().map_err(|value| RunError::ValueType {
            expected: std::any::type_name::<T>(),
            found: value.type_name(),
        })
    }

    pub(crate) fn from_raw(raw: RawTask) -> Task<T> {
        Task {
            raw,
            _marker: PhantomData,
        }
    }

    pub(crate) fn into_raw(self) -> RawTask {
        self.raw
    }
}

impl<T> std::fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("effects", &self.raw.effects)
            .field("prog", &self.raw.prog)
            .finish()
    }
}

/// A task with a handler list attached and its effect set recomputed.
#[derive(Debug)]
pub struct HandledTask<T> {
    inner: Task<T>,
}

impl<T: 'static> HandledTask<T> {
    /// The derived effect set.
    pub fn effects(&self) -> &EffectSet {
        self.inner.effects()
    }

    /// Await from an enclosing task: a handled task is itself a task.
    pub fn into_task(self) -> Task<T> {
        self.inner
    }

    /// Attach further handlers around this one.
    pub fn with(self, handlers: Vec<Handler<T>>) -> Result<HandledTask<T>, ComposeError> {
        self.inner.with(handlers)
    }

    /// Drive to completion; requires an empty derived set.
    pub fn run(self) -> Result<T, RunError> {
        self.inner.run()
    }
}

/// Perform an effect: a task that suspends until a handler supplies the
/// resume value, then evaluates to it. Declares exactly `{E}`.
pub fn perform<E: Effect>(effect: E) -> Task<E::Resume> {
    Task::from_raw(RawTask {
        prog: Prog::Perform(crate::effect::EffectInstance::of(effect)),
        effects: EffectSet::of::<E>(),
    })
}
