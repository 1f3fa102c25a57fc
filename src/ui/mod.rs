//! UI / rendering layer: everything that touches Ratatui widgets.
//!
//! This layer takes the *core* data structures and turns them into cells on
//! the terminal.  No store I/O happens here.

pub mod dashboard;
pub mod feed_grid;
pub mod header;
pub mod layout;
pub mod popup;
pub mod spinner;
pub mod theme;
