//! UDP sender for OSC messages.

use super::packet::{OscArg, OscMessage};
use crate::error::{Result, WatchError};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

/// Anything that can deliver an OSC message.
///
/// Delivery is fire-and-forget: no acknowledgment, no retry.
pub trait OscSender: Send {
    fn send(&mut self, address: &str, args: &[OscArg]) -> Result<()>;
}

/// Sends OSC datagrams to a fixed endpoint
pub struct UdpOscClient {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpOscClient {
    /// Resolve `host:port` and bind an ephemeral local socket.
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        let target = (host, port)
            .to_socket_addrs()
            .map_err(|e| WatchError::config(format!("Cannot resolve host '{}': {}", host, e)))?
            .next()
            .ok_or_else(|| WatchError::config(format!("No address found for host '{}'", host)))?;

        let bind_addr: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(bind_addr)?;

        log::debug!("OSC client bound to {} -> {}", socket.local_addr()?, target);

        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl OscSender for UdpOscClient {
    fn send(&mut self, address: &str, args: &[OscArg]) -> Result<()> {
        let packet = OscMessage::new(address, args.to_vec()).encode();
        self.socket
            .send_to(&packet, self.target)
            .map_err(|e| WatchError::transport(format!("send to {} failed: {}", self.target, e)))?;
        Ok(())
    }
}
