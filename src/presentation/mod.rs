//! Console presentation for the command-line front end.

pub mod views;
