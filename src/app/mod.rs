//! Binary-side glue: argument handling, terminal setup and exit codes.

pub(crate) mod config_runtime;
pub(crate) mod exit_handler;
pub(crate) mod runtime;
pub(crate) mod terminal;
