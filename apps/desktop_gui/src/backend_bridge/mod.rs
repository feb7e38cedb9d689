pub mod commands;
pub mod runtime;
