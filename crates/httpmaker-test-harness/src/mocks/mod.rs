//! Mock servers for exercising real transports.

pub mod network;

pub use network::*;
