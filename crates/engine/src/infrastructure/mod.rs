//! Infrastructure layer - external dependency implementations.
//!
//! - `ports` - the trait seams (rules engine, clock)
//! - `chess_rules` - rules engine adapter over the `chess` crate
//! - `clock` - system clock
//! - `config` - environment configuration

pub mod chess_rules;
pub mod clock;
pub mod config;
pub mod ports;
