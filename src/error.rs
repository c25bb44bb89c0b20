//! Error types for composition and for the machine.
//!
//! Composition violations are caught when handlers are attached and never
//! reach the run loop. Runtime violations are not locally recoverable; they
//! abort the run and surface as a single error to the outermost driver.

use thiserror::Error;

use crate::effect::EffectId;
use crate::set::EffectSet;

/// Rejected at `with` time, before any frame exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    /// The task's effect set does not require the handled effect.
    #[error("handler for `{effect}` is not required by the task")]
    NotRequired { effect: EffectId },

    /// Two handlers for the same effect type within one attachment.
    #[error("duplicate handler for `{effect}` in one attachment")]
    DuplicateHandler { effect: EffectId },
}

/// Fatal runtime failures, observed only by the outermost driver.
#[derive(Debug, Error)]
pub enum RunError {
    /// Driving was attempted while the effect set is non-empty.
    #[error("task still requires effects {effects}")]
    ResidualEffects { effects: EffectSet },

    /// An effect was performed with no matching handler anywhere in the
    /// frame chain. Indicates a wrong effect declaration somewhere.
    #[error("unhandled effect `{effect}`")]
    UnhandledEffect { effect: EffectId },

    /// A handler body materialized with effects outside its declaration.
    #[error("handler for `{effect}` requires undeclared effects {undeclared}")]
    UndeclaredEffects {
        effect: EffectId,
        undeclared: EffectSet,
    },

    /// A resumer was applied after its handled region already completed.
    #[error("resumer {id} is stale: its region already completed")]
    StaleResumer { id: u64 },

    /// An effect payload failed to downcast inside a handler.
    #[error("effect payload mismatch: handler for `{expected}` received `{found}`")]
    EffectPayload {
        expected: EffectId,
        found: EffectId,
    },

    /// A value failed to downcast at a typed boundary.
    #[error("value type mismatch: expected `{expected}`, found `{found}`")]
    ValueType {
        expected: &'static str,
        found: &'static str,
    },

    /// Internal frame-chain invariant breakage.
    #[error("broken frame chain: {message}")]
    BrokenFrameChain { message: String },
}

impl RunError {
    pub fn unhandled_effect(effect: EffectId) -> Self {
        RunError::UnhandledEffect { effect }
    }

    pub fn stale_resumer(id: crate::ids::ResumerId) -> Self {
        RunError::StaleResumer { id: id.raw() }
    }

    pub fn broken_frame_chain(message: impl Into<String>) -> Self {
        RunError::BrokenFrameChain {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::Effect;

    struct Oops;
    impl Effect for Oops {
        type Resume = ();
    }

    #[test]
    fn test_compose_error_display() {
        let err = ComposeError::NotRequired {
            effect: EffectId::of::<Oops>(),
        };
        assert!(err.to_string().contains("not required"));
    }

    #[test]
    fn test_run_error_display() {
        let err = RunError::unhandled_effect(EffectId::of::<Oops>());
        assert!(err.to_string().contains("unhandled effect"));

        let err = RunError::broken_frame_chain("no caller");
        assert!(err.to_string().contains("no caller"));
    }
}
