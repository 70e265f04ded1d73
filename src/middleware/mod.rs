//! Middleware module
//!
//! Contains request logging applied to every route

pub mod logging;
