//! Transport contract constants.
//!
//! String constants for API routes shared by the HTTP server and the HTTP
//! client. Keep these string-only with no framework-specific types.

pub mod http;
