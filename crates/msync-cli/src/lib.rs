//! msync-cli library surface: the single sync pass shared by the `msync`
//! binary and the cross-crate scenario tests.

pub mod pass;
