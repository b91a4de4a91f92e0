//! Allocation helpers for frequently created and destroyed simulation
//! objects.

mod pool;

pub use pool::SlotPool;
