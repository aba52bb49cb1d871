//! OSC transport.
//!
//! Encodes the small OSC 1.0 subset the watch needs and sends it as
//! fire-and-forget UDP datagrams.

pub mod client;
pub mod packet;

pub use client::{OscSender, UdpOscClient};
pub use packet::{OscArg, OscMessage};
