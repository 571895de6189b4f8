//! Utility helpers for the console layer

pub mod logging;
