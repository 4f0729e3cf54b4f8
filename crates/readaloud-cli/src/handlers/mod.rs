//! Command handlers, one module per subcommand.

pub mod say;
pub mod serve;
pub mod voices;
