//! Library surface for arcadetop: the feed connector, telemetry history, and
//! the pieces the dashboard binary is built from.

pub mod api;
pub mod app;
pub mod connector;
pub mod error;
pub mod history;
pub mod led;
pub mod logging;
pub mod profiles;
pub mod settings;
pub mod stats;
pub mod store;
pub mod types;
pub mod ui;
pub mod ws;
