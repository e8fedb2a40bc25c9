// pitchside/src/lib.rs

pub mod adapters;
pub mod aggregation;
pub mod auth;
pub mod domain;
pub mod persistence;
pub mod polls;
pub mod ports;
pub mod quota;

#[cfg(test)]
mod testing;
