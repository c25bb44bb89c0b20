//! One-shot resumption capabilities.
//!
//! A resumer is bound to a single performance site. Applying it consumes it,
//! so at-most-once resumption is enforced by ownership; the machine keeps a
//! live-suspension table as the backstop for resumers that outlive their
//! region (those fail with `StaleResumer`).

use std::marker::PhantomData;

use crate::effect::Effect;
use crate::ids::ResumerId;
use crate::prog::{Prog, RawTask};
use crate::set::EffectSet;
use crate::task::Task;
use crate::value::Value;

/// Untyped one-shot capability token minted per dispatch.
#[derive(Debug)]
pub(crate) struct RawResumer {
    pub id: ResumerId,
}

/// Single-use capability to continue the computation that performed `E`.
///
/// Produced by the machine and passed to the matching handler together with
/// the effect instance. `resume` consumes the resumer.
pub struct Resumer<E: Effect> {
    raw: RawResumer,
    _marker: PhantomData<fn(E)>,
}

impl<E: Effect> Resumer<E> {
    pub(crate) fn new(raw: RawResumer) -> Self {
        Resumer {
            raw,
            _marker: PhantomData,
        }
    }

    /// Continue the suspended performance site with `value`.
    ///
    /// The performance expression there evaluates to `value`. The task this
    /// returns suspends the handler body until the handled region completes;
    /// it then evaluates to the region's final value, which the handler body
    /// may inspect or simply return.
    pub fn resume<T: 'static>(self, value: E::Resume) -> Task<T> {
        Task::from_raw(RawTask {
            prog: Prog::Resume {
                resumer: self.raw,
                value: Value::new(value),
            },
            effects: EffectSet::empty(),
        })
    }
}

impl<E: Effect> std::fmt::Debug for Resumer<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resumer")
            .field("id", &self.raw.id)
            .field("effect", &E::name())
            .finish()
    }
}
