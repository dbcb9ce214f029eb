//! Filesystem helpers.

mod atomic;

pub use atomic::write_atomic;
