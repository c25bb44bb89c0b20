//! Frame arena with free list for efficient allocation.

use crate::frame::Frame;
use crate::ids::FrameId;

pub(crate) struct FrameArena {
    frames: Vec<Option<Frame>>,
    free_list: Vec<FrameId>,
}

impl FrameArena {
    pub fn new() -> Self {
        FrameArena {
            frames: Vec::new(),
            free_list: Vec::new(),
        }
    }

    pub fn alloc(&mut self, frame: Frame) -> FrameId {
        if let Some(id) = self.free_list.pop() {
            self.frames[id.index()] = Some(frame);
            id
        } else {
            let id = FrameId::from_index(self.frames.len());
            self.frames.push(Some(frame));
            id
        }
    }

    /// Release a slot, returning the frame so callers can cascade teardown
    /// through any suspended sub-chains it still references.
    pub fn free(&mut self, id: FrameId) -> Option<Frame> {
        let slot = self.frames.get_mut(id.index())?;
        let frame = slot.take();
        if frame.is_some() {
            self.free_list.push(id);
        }
        frame
    }

    pub fn get(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(id.index()).and_then(|slot| slot.as_ref())
    }

    pub fn get_mut(&mut self, id: FrameId) -> Option<&mut Frame> {
        self.frames.get_mut(id.index()).and_then(|slot| slot.as_mut())
    }

    pub fn len(&self) -> usize {
        self.frames.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FrameArena {
    fn default() -> Self {
        Self::new()
    }
}
