#![warn(clippy::panic)]
#![warn(clippy::expect_used)]

#[macro_use]
extern crate log;

pub mod builder;
pub mod config;
pub mod errors;
pub mod graph;
pub mod resolver;
pub mod types;
pub mod util;
