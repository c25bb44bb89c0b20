//! The dispatch state machine: a mode-based step loop over the frame arena.
//!
//! Evaluation alternates between two modes: `Eval` interprets the next
//! program node in the current frame, `Deliver` feeds a value to the current
//! frame's innermost pending binder, completing the frame when none remain.
//! Effect dispatch, handler invocation, resumption, and region teardown all
//! happen between these two modes; there is no other control transfer.

use std::collections::HashMap;

use tracing::trace;

use crate::arena::FrameArena;
use crate::effect::EffectInstance;
use crate::error::RunError;
use crate::frame::Frame;
use crate::ids::{DispatchId, FrameId, ResumerId};
use crate::prog::{Prog, RawTask};
use crate::resumer::RawResumer;
use crate::value::Value;

enum Mode {
    Eval(Prog),
    Deliver(Value),
}

#[derive(Debug)]
pub(crate) enum StepEvent {
    Continue,
    Done(Value),
}

/// A pending suspension: which frame performed the effect and which region
/// root held the matching handler. Keyed by resumer id; consumed on resume.
struct Suspension {
    performer: FrameId,
    region: FrameId,
    dispatch: DispatchId,
}

pub(crate) struct Machine {
    arena: FrameArena,
    suspensions: HashMap<ResumerId, Suspension>,
    current: FrameId,
    mode: Mode,
}

impl Machine {
    pub fn new(task: RawTask) -> Self {
        let mut arena = FrameArena::new();
        let root = arena.alloc(Frame::root());
        Machine {
            arena,
            suspensions: HashMap::new(),
            current: root,
            mode: Mode::Eval(task.prog),
        }
    }

    pub fn run_to_completion(&mut self) -> Result<Value, RunError> {
        loop {
            match self.step()? {
                StepEvent::Continue => {}
                StepEvent::Done(value) => return Ok(value),
            }
        }
    }

    pub fn step(&mut self) -> Result<StepEvent, RunError> {
        let mode = std::mem::replace(&mut self.mode, Mode::Deliver(Value::unit()));
        match mode {
            Mode::Eval(prog) => self.step_eval(prog),
            Mode::Deliver(value) => self.step_deliver(value),
        }
    }

    fn step_eval(&mut self, prog: Prog) -> Result<StepEvent, RunError> {
        match prog {
            Prog::Pure(value) => {
                self.mode = Mode::Deliver(value);
                Ok(StepEvent::Continue)
            }
            Prog::Bind { source, binder } => {
                self.current_frame_mut()?.push_pending(binder);
                self.mode = Mode::Eval(*source);
                Ok(StepEvent::Continue)
            }
            Prog::Perform(instance) => self.dispatch(instance),
            Prog::Handled { body, handlers } => {
                let handled = handlers.handled_effects();
                let region = self.arena.alloc(Frame::region(self.current, handlers));
                trace!(
                    region = region.index(),
                    caller = self.current.index(),
                    %handled,
                    "install handled region"
                );
                self.current = region;
                self.mode = Mode::Eval(*body);
                Ok(StepEvent::Continue)
            }
            Prog::Resume { resumer, value } => self.apply_resume(resumer, value),
        }
    }

    fn step_deliver(&mut self, value: Value) -> Result<StepEvent, RunError> {
        let frame = self.current_frame_mut()?;
        if let Some(binder) = frame.pop_pending() {
            let next = binder(value)?;
            self.mode = Mode::Eval(next.prog);
            return Ok(StepEvent::Continue);
        }

        // Frame complete: release it and route the value to its continuation.
        let done = self
            .arena
            .free(self.current)
            .ok_or_else(|| RunError::broken_frame_chain("completed frame already freed"))?;
        trace!(frame = self.current.index(), "frame complete");

        if let Some(resumer_id) = done.resumer {
            if let Some(suspension) = self.suspensions.remove(&resumer_id) {
                // The handler finished without ever resuming: the rest of the
                // handled region is discarded, not run.
                trace!(
                    dispatch = suspension.dispatch.raw(),
                    "handler returned without resuming; discarding region"
                );
                self.teardown_chain(suspension.performer, suspension.region);
            }
        }

        match done.caller {
            Some(caller) => {
                self.current = caller;
                self.mode = Mode::Deliver(value);
                Ok(StepEvent::Continue)
            }
            None => {
                if !self.arena.is_empty() {
                    trace!(live = self.arena.len(), "frames still live at completion");
                }
                Ok(StepEvent::Done(value))
            }
        }
    }

    /// Handler discovery and invocation for one performed effect.
    ///
    /// Walks outward from the current frame through caller links; the first
    /// frame whose handler list serves the effect's identity wins, which is
    /// exactly the dynamically nearest enclosing attachment. Handler-body
    /// frames are created with the region's caller as their continuation, so
    /// the walk from inside a handler naturally starts at its installation
    /// point rather than inside the region it handles.
    fn dispatch(&mut self, instance: EffectInstance) -> Result<StepEvent, RunError> {
        let dispatch = DispatchId::fresh();
        let effect = instance.id();

        let mut probe = Some(self.current);
        let mut found = None;
        while let Some(frame_id) = probe {
            let frame = self
                .arena
                .get(frame_id)
                .ok_or_else(|| RunError::broken_frame_chain("dispatch walked into freed frame"))?;
            if let Some(handlers) = &frame.handlers {
                if let Some(idx) = handlers.find(effect) {
                    found = Some((frame_id, idx));
                    break;
                }
            }
            probe = frame.caller;
        }

        let Some((region, idx)) = found else {
            trace!(dispatch = dispatch.raw(), %effect, "no handler in chain");
            return Err(RunError::unhandled_effect(effect));
        };
        trace!(
            dispatch = dispatch.raw(),
            %effect,
            performer = self.current.index(),
            region = region.index(),
            "dispatch matched"
        );

        let resumer_id = ResumerId::fresh();
        self.suspensions.insert(
            resumer_id,
            Suspension {
                performer: self.current,
                region,
                dispatch,
            },
        );

        let frame = self
            .arena
            .get_mut(region)
            .ok_or_else(|| RunError::broken_frame_chain("matched region frame missing"))?;
        let region_caller = frame.caller;
        let handlers = frame
            .handlers
            .as_mut()
            .ok_or_else(|| RunError::broken_frame_chain("matched frame lost its handlers"))?;
        let body = handlers.invoke(idx, instance, RawResumer { id: resumer_id })?;

        let handler_frame = self
            .arena
            .alloc(Frame::handler_body(region_caller, resumer_id));
        self.current = handler_frame;
        self.mode = Mode::Eval(body.prog);
        Ok(StepEvent::Continue)
    }

    /// One-shot resumption: hand `value` back to the performance site.
    ///
    /// The current frame (the handler side) takes over as the region's
    /// continuation, so when the resumed computation completes its value
    /// flows back to just after the resume point in the handler body.
    fn apply_resume(&mut self, resumer: RawResumer, value: Value) -> Result<StepEvent, RunError> {
        let Some(suspension) = self.suspensions.remove(&resumer.id) else {
            return Err(RunError::stale_resumer(resumer.id));
        };
        trace!(
            dispatch = suspension.dispatch.raw(),
            performer = suspension.performer.index(),
            "resume"
        );

        let region = self
            .arena
            .get_mut(suspension.region)
            .ok_or_else(|| RunError::broken_frame_chain("resumed region frame missing"))?;
        region.caller = Some(self.current);

        self.current = suspension.performer;
        self.mode = Mode::Deliver(value);
        Ok(StepEvent::Continue)
    }

    /// Destroy a suspended chain from the performer up to and including the
    /// region root, without running any of it. Frames that still hold an
    /// unconsumed resumer drag their own suspended sub-chains down with them.
    fn teardown_chain(&mut self, from: FrameId, upto: FrameId) {
        let mut cursor = Some(from);
        while let Some(frame_id) = cursor {
            let Some(frame) = self.arena.free(frame_id) else {
                break;
            };
            trace!(frame = frame_id.index(), "teardown");
            if let Some(resumer_id) = frame.resumer {
                if let Some(suspension) = self.suspensions.remove(&resumer_id) {
                    self.teardown_chain(suspension.performer, suspension.region);
                }
            }
            if frame_id == upto {
                break;
            }
            cursor = frame.caller;
        }
    }

    fn current_frame_mut(&mut self) -> Result<&mut Frame, RunError> {
        self.arena
            .get_mut(self.current)
            .ok_or_else(|| RunError::broken_frame_chain("current frame missing"))
    }

    #[cfg(test)]
    pub fn live_frames(&self) -> usize {
        self.arena.len()
    }

    #[cfg(test)]
    pub fn live_suspensions(&self) -> usize {
        self.suspensions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::Effect;
    use crate::handler::Handler;
    use crate::task::{perform, Task};

    struct Ask;
    impl Effect for Ask {
        type Resume = i64;
    }

    struct Abort;
    impl Effect for Abort {
        type Resume = ();
    }

    fn handled(body: Task<i64>, handler: Handler<i64>) -> RawTask {
        body.with(vec![handler]).unwrap().into_task().into_raw()
    }

    #[test]
    fn test_pure_task_completes_in_root_frame() {
        let mut machine = Machine::new(Task::value(5i64).into_raw());
        let value = machine.run_to_completion().unwrap();
        assert_eq!(value.downcast::<i64>().unwrap(), 5);
        assert_eq!(machine.live_frames(), 0);
    }

    #[test]
    fn test_resumed_dispatch_releases_all_frames() {
        let body = perform(Ask).requiring(crate::effects![Ask]);
        let handler = Handler::of(|_: Ask, k| k.resume(11));
        let mut machine = Machine::new(handled(body, handler));

        let value = machine.run_to_completion().unwrap();
        assert_eq!(value.downcast::<i64>().unwrap(), 11);
        assert_eq!(machine.live_frames(), 0);
        assert_eq!(machine.live_suspensions(), 0);
    }

    #[test]
    fn test_discarded_region_is_torn_down() {
        let body = perform(Abort)
            .then(|_| Task::value(0i64))
            .requiring(crate::effects![Abort]);
        let handler = Handler::of(|_: Abort, _k| Task::value(42i64));
        let mut machine = Machine::new(handled(body, handler));

        let value = machine.run_to_completion().unwrap();
        assert_eq!(value.downcast::<i64>().unwrap(), 42);
        assert_eq!(machine.live_frames(), 0);
        assert_eq!(machine.live_suspensions(), 0);
    }

    #[test]
    fn test_unhandled_effect_is_fatal() {
        let task = perform(Ask).requiring(crate::effects![Ask]);
        let mut machine = Machine::new(task.into_raw());
        let err = machine.run_to_completion().unwrap_err();
        assert!(matches!(err, RunError::UnhandledEffect { .. }));
    }
}
