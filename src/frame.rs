//! Frames: the owned runtime state of one suspended or running computation.
//!
//! A frame holds a LIFO stack of pending continuation binders, a non-owning
//! back-reference to the frame that receives its value on completion, and,
//! for region roots, the installed handler list. Handler-body frames record
//! the resumer they were handed so an unconsumed one can be detected when the
//! frame completes.

use crate::handler::HandlerList;
use crate::ids::{FrameId, ResumerId};
use crate::prog::Binder;

pub(crate) struct Frame {
    /// Continuation: the frame to deliver into when this one completes.
    pub caller: Option<FrameId>,
    /// Pending binders, innermost last.
    pending: Vec<Binder>,
    /// Present on region roots created by `.with` attachment.
    pub handlers: Option<HandlerList>,
    /// The resumer handed to the handler that spawned this frame; `Some` is
    /// what marks a frame as a handler body.
    pub resumer: Option<ResumerId>,
}

impl Frame {
    /// The outermost frame of a drive; completing it finishes the run.
    pub fn root() -> Self {
        Frame {
            caller: None,
            pending: Vec::new(),
            handlers: None,
            resumer: None,
        }
    }

    /// A handled region's root, with its handler list installed.
    pub fn region(caller: FrameId, handlers: HandlerList) -> Self {
        Frame {
            caller: Some(caller),
            pending: Vec::new(),
            handlers: Some(handlers),
            resumer: None,
        }
    }

    /// A handler body. Its caller is the region's caller, so a normal return
    /// completes the whole handled region.
    pub fn handler_body(caller: Option<FrameId>, resumer: ResumerId) -> Self {
        Frame {
            caller,
            pending: Vec::new(),
            handlers: None,
            resumer: Some(resumer),
        }
    }

    pub fn push_pending(&mut self, binder: Binder) {
        self.pending.push(binder);
    }

    pub fn pop_pending(&mut self) -> Option<Binder> {
        self.pending.pop()
    }

    /// A frame with no pending binders completes on the next delivery.
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("caller", &self.caller)
            .field("pending", &self.pending_count())
            .field("complete", &self.is_complete())
            .field("handlers", &self.handlers.as_ref().map(|h| h.len()))
            .field("resumer", &self.resumer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prog::RawTask;
    use crate::value::Value;

    #[test]
    fn test_root_frame_is_complete() {
        let frame = Frame::root();
        assert!(frame.is_complete());
        assert!(frame.caller.is_none());
        assert!(frame.resumer.is_none());
    }

    #[test]
    fn test_pending_lifo_order() {
        let mut frame = Frame::root();
        frame.push_pending(Box::new(|_| Ok(RawTask::pure(Value::new(1i64)))));
        frame.push_pending(Box::new(|_| Ok(RawTask::pure(Value::new(2i64)))));
        assert_eq!(frame.pending_count(), 2);
        assert!(!frame.is_complete());

        let last = frame.pop_pending().unwrap();
        let task = last(Value::unit()).unwrap();
        match task.prog {
            crate::prog::Prog::Pure(v) => assert_eq!(v.downcast::<i64>().unwrap(), 2),
            _ => panic!("expected Pure"),
        }
        assert_eq!(frame.pending_count(), 1);
    }

    #[test]
    fn test_handler_body_records_resumer() {
        let rid = ResumerId::fresh();
        let frame = Frame::handler_body(None, rid);
        assert_eq!(frame.resumer, Some(rid));
        assert!(Frame::root().resumer.is_none());
    }

    #[test]
    fn test_region_frame_carries_handlers() {
        let frame = Frame::region(FrameId::from_index(0), HandlerList::new(Vec::new()));
        assert!(frame.handlers.is_some());
        assert_eq!(frame.caller, Some(FrameId::from_index(0)));
    }
}
