//! Deterministic primitives shared by the goad simulation kernel: a seeded
//! PRNG, fixed-capacity arena/pool allocators, a memory budget, a bounded
//! event queue, and the virtual-user state machine.
//!
//! Nothing in this crate touches wall-clock time, iterates an unordered
//! container, or holds process-global state; every type here is constructed
//! fresh per run and carries its own state.

#![deny(unsafe_code)]

pub mod arena;
pub mod error;
pub mod event_queue;
pub mod memory_budget;
pub mod pool;
pub mod prng;
pub mod vu;

pub use arena::{Arena, ArenaHandle};
pub use event_queue::EventQueue;
pub use memory_budget::MemoryBudget;
pub use pool::{Handle as PoolHandle, Pool};
pub use prng::Prng;
pub use vu::{Vu, VuState};
