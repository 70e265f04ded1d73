//! Data models module
//!
//! Defines log analysis values, HTTP bodies and the chat completion wire format

pub mod api;
pub mod log;
pub mod openai;
