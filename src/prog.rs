//! Program primitives: the suspension protocol in tree form.
//!
//! A computation is an explicit program tree rather than a native coroutine;
//! the machine interprets it with an explicit frame stack, so suspension and
//! resumption are ordinary data movements.

use crate::effect::EffectInstance;
use crate::error::RunError;
use crate::handler::HandlerList;
use crate::resumer::RawResumer;
use crate::set::EffectSet;
use crate::value::Value;

/// Continuation of a `Bind`: consumes the source's value, produces the next
/// task. Fallible so typed boundaries can reject mismatched values.
pub(crate) type Binder = Box<dyn FnOnce(Value) -> Result<RawTask, RunError>>;

pub(crate) enum Prog {
    /// Immediately completes with a value.
    Pure(Value),
    /// Evaluate `source`, feed its value to `binder`, continue with the result.
    Bind { source: Box<Prog>, binder: Binder },
    /// Suspend and search the frame chain for a handler.
    Perform(EffectInstance),
    /// Run `body` in a fresh region frame with `handlers` installed.
    Handled {
        body: Box<Prog>,
        handlers: HandlerList,
    },
    /// Hand `value` back to a suspended performance site (handler bodies only).
    Resume { resumer: RawResumer, value: Value },
}

/// An untyped suspended computation: a program plus its declared effect set.
#[derive(Debug)]
pub(crate) struct RawTask {
    pub prog: Prog,
    pub effects: EffectSet,
}

impl RawTask {
    pub fn pure(value: Value) -> Self {
        RawTask {
            prog: Prog::Pure(value),
            effects: EffectSet::empty(),
        }
    }
}

impl std::fmt::Debug for Prog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Prog::Pure(value) => f.debug_tuple("Pure").field(value).finish(),
            Prog::Bind { source, .. } => f.debug_struct("Bind").field("source", source).finish(),
            Prog::Perform(inst) => f.debug_tuple("Perform").field(inst).finish(),
            Prog::Handled { body, handlers } => f
                .debug_struct("Handled")
                .field("body", body)
                .field("handlers", &handlers.len())
                .finish(),
            Prog::Resume { resumer, .. } => f.debug_tuple("Resume").field(resumer).finish(),
        }
    }
}
