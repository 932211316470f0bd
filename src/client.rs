//! Message-bus client: TCP for the identity handshake and outbound commands,
//! UDP for the inbound telemetry/command stream.
//!
//! Frames on TCP carry a u32 big-endian length prefix followed by a JSON
//! payload. UDP datagrams carry one JSON [`BusMessage`] each; datagram
//! boundaries do the framing.

use crate::error::{MoverError, Result};
use crate::types::{BusMessage, Command, VehicleIdentity};
use serde::Serialize;
use std::io::{Read, Write};
use std::net::{TcpStream, UdpSocket};
use std::time::Duration;

/// Default receive buffer size (64KB)
const DEFAULT_BUFFER_SIZE: usize = 65536;

/// Frames sent to the bus over TCP.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Outbound<'a> {
    /// Ask the bus who we are and where we start.
    IdentityRequest,
    /// A command for the autopilot channel.
    Command(&'a Command),
}

/// TCP/UDP client for the message bus
pub struct BusClient {
    stream: TcpStream,
    udp_socket: UdpSocket,
    buffer: Vec<u8>,
}

impl BusClient {
    /// Connect with timeout (uses the same port for TCP commands and UDP
    /// inbound stream; different protocols, they coexist).
    pub fn connect_timeout(addr: &str, timeout: Duration) -> Result<Self> {
        let sock_addr: std::net::SocketAddr = addr
            .parse()
            .map_err(|e| MoverError::Config(format!("Invalid address: {}", e)))?;

        let stream = TcpStream::connect_timeout(&sock_addr, timeout)?;
        stream.set_read_timeout(Some(timeout))?;

        // Bind UDP socket to receive the inbound stream from the bus
        let udp_bind_addr = format!("0.0.0.0:{}", sock_addr.port());
        let udp_socket = UdpSocket::bind(&udp_bind_addr).map_err(|e| {
            MoverError::Config(format!("Failed to bind UDP to {}: {}", udp_bind_addr, e))
        })?;
        udp_socket.set_nonblocking(true)?;

        tracing::info!("UDP socket bound to port {} for bus stream", sock_addr.port());

        Ok(Self {
            stream,
            udp_socket,
            buffer: vec![0u8; DEFAULT_BUFFER_SIZE],
        })
    }

    /// Ask the bus for this vehicle's identity and initial position.
    /// A failure here is fatal to startup; the run loop never starts.
    pub fn resolve_identity(&mut self) -> Result<VehicleIdentity> {
        write_frame(&mut self.stream, &Outbound::IdentityRequest)?;

        let payload = read_frame(&mut self.stream, &mut self.buffer)?;
        let identity: VehicleIdentity = serde_json::from_slice(payload)?;
        Ok(identity)
    }

    /// Split into the dispatch thread's inbound feed and the control
    /// thread's outbound command link.
    pub fn split(self) -> (BusFeed, CommandLink) {
        (
            BusFeed {
                udp_socket: self.udp_socket,
                buffer: self.buffer,
            },
            CommandLink {
                stream: self.stream,
            },
        )
    }
}

/// Inbound half: non-blocking UDP message stream.
pub struct BusFeed {
    udp_socket: UdpSocket,
    buffer: Vec<u8>,
}

impl BusFeed {
    /// Receive one bus message (non-blocking). `Ok(None)` when the socket
    /// has nothing for us right now.
    pub fn recv(&mut self) -> Result<Option<BusMessage>> {
        match self.udp_socket.recv(&mut self.buffer) {
            Ok(len) => {
                let msg: BusMessage = serde_json::from_slice(&self.buffer[..len])?;
                Ok(Some(msg))
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(MoverError::Connection(e)),
        }
    }
}

/// Outbound half: the single command channel to the autopilot side of the
/// bus. At most one command goes out per active control tick.
pub struct CommandLink {
    stream: TcpStream,
}

impl CommandLink {
    /// Publish one command.
    pub fn publish(&mut self, cmd: &Command) -> Result<()> {
        write_frame(&mut self.stream, &Outbound::Command(cmd))
    }
}

/// Write one length-prefixed JSON frame.
fn write_frame<T: Serialize>(stream: &mut TcpStream, msg: &T) -> Result<()> {
    let encoded = serde_json::to_vec(msg)?;
    let len = encoded.len() as u32;

    // Write length prefix (big-endian)
    stream.write_all(&len.to_be_bytes())?;
    // Write payload
    stream.write_all(&encoded)?;
    stream.flush()?;

    Ok(())
}

/// Read one length-prefixed frame into `buffer`, returning the payload.
fn read_frame<'a>(stream: &mut TcpStream, buffer: &'a mut [u8]) -> Result<&'a [u8]> {
    let mut prefix = [0u8; 4];
    stream.read_exact(&mut prefix)?;
    let len = u32::from_be_bytes(prefix) as usize;

    if len > buffer.len() {
        return Err(MoverError::Protocol(format!(
            "Frame of {} bytes exceeds buffer",
            len
        )));
    }

    stream.read_exact(&mut buffer[..len])?;
    Ok(&buffer[..len])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbound_frames_are_tagged() {
        let json = serde_json::to_string(&Outbound::IdentityRequest).unwrap();
        assert_eq!(json, r#"{"type":"identity_request"}"#);

        let cmd = Command::empty_goal(4);
        let json = serde_json::to_string(&Outbound::Command(&cmd)).unwrap();
        assert!(json.contains(r#""type":"command""#));
        assert!(json.contains(r#""target_id":4"#));
    }
}
