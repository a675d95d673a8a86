//! Core rwd library (event model, transcript reducer, session client, config).

pub mod config;
pub mod events;
pub mod live;
pub mod log;
pub mod logging;
pub mod session;
pub mod transcript;
