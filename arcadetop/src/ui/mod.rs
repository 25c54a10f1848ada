//! UI module root: exposes drawing functions for individual panels.

pub mod charts;
pub mod games;
pub mod header;
pub mod led;
pub mod scores;
pub mod system;
pub mod theme;
pub mod util;
