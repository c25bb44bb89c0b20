//! effx: a single-threaded runtime for algebraic effect handlers.
//!
//! Computations are [`Task`]s: inert, movable values that only execute when
//! driven. A task performs effects with [`perform`]; handlers are attached
//! with [`Task::with`] and discovered dynamically, nearest attachment first.
//! Handlers receive a one-shot [`Resumer`]; resuming continues the suspended
//! computation, while returning normally completes the whole handled region.
//!
//! # Architecture
//!
//! - **Free program tree**: tasks build a [`prog`] tree, never run eagerly
//! - **Mode-based step machine**: alternates evaluate / deliver over frames
//! - **Frame arena**: slab with free list, frames linked by caller ids
//! - **Runtime effect sets**: validated at attachment and at drive time
//!
//! ```
//! use effx::{effects, perform, Effect, Handler, Task};
//!
//! struct Ask;
//! impl Effect for Ask {
//!     type Resume = i64;
//! }
//!
//! let task = perform(Ask).map(|x| x * 2).requiring(effects![Ask]);
//! let handled = task.with(vec![Handler::of(|_: Ask, k| k.resume(21))]).unwrap();
//! assert_eq!(handled.run().unwrap(), 42);
//! ```

mod arena;
pub mod effect;
pub mod error;
mod frame;
pub mod handler;
pub mod ids;
mod machine;
mod prog;
pub mod resumer;
pub mod set;
pub mod task;
pub mod value;

// Re-exports for convenience
pub use effect::{Effect, EffectId, EffectInstance};
pub use error::{ComposeError, RunError};
pub use handler::Handler;
pub use resumer::Resumer;
pub use set::EffectSet;
pub use task::{perform, HandledTask, Task};
pub use value::Value;
