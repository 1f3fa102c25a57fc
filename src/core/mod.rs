//! Core feed logic – ordering, filtering, pagination, proximity loading,
//! autoscroll, and the record store contract.
//!
//! Nothing in this module depends on any TUI or rendering crate.
//! Time is always passed in, so every state machine here can be driven by
//! tests without a clock.

pub mod ad;
pub mod feed;
pub mod filter;
pub mod monitor;
pub mod navigator;
pub mod ordering;
pub mod session;
pub mod store;
pub mod trigger;
pub mod viewport;
pub mod window;
