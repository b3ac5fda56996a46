//! # Kernel synchronization primitives
//!
//! A spin lock for short, bounded critical sections. There are no
//! suspension points and no queuing; contended cores busy-wait. Suitable
//! for protecting small shared structures such as the frame table, where
//! the critical section is a bounded scan-and-mutate sequence.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod spin_lock;

pub use spin_lock::{SpinLock, SpinLockGuard};
