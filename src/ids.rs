//! Core identifier types for the runtime.
//!
//! All IDs are lightweight Copy types using the newtype pattern for type safety.

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for frames (arena index).
///
/// Frames are stored in a slab and referenced by index for efficiency.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct FrameId(pub u32);

/// Unique identifier for resumers (one-shot tracking).
///
/// Each suspension mints a fresh ResumerId so the machine can enforce
/// at-most-once resumption even across region teardown.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ResumerId(pub u64);

/// Unique identifier for effect dispatches.
///
/// Only used to correlate trace events over the lifetime of one dispatch.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DispatchId(pub u64);

// Global counters for ID generation
static RESUMER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);
static DISPATCH_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

impl FrameId {
    pub fn from_index(index: usize) -> Self {
        FrameId(index as u32)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl ResumerId {
    /// Create a fresh unique ResumerId.
    pub fn fresh() -> Self {
        ResumerId(RESUMER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl DispatchId {
    /// Create a fresh unique DispatchId.
    pub fn fresh() -> Self {
        DispatchId(DISPATCH_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}
