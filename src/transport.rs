use std::fmt;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::{Duration, Instant};

use tokio::net::UdpSocket;
use tokio::time::timeout as await_timeout;

use crate::error::{Error, Result};
use crate::packet;

/// Largest reply read from a single datagram.
pub const MAX_REPLY_LEN: usize = 4096;

/// Default port of a Digital Paint server.
pub const DEFAULT_PORT: u16 = 27910;

/// Host and port of the server a client talks to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerEndpoint {
  host: String,
  port: u16,
}

impl ServerEndpoint {
  pub fn new(host: impl Into<String>, port: u16) -> Self {
    Self {
      host: host.into(),
      port,
    }
  }

  pub fn host(&self) -> &str {
    &self.host
  }

  pub fn port(&self) -> u16 {
    self.port
  }
}

impl fmt::Display for ServerEndpoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.host, self.port)
  }
}

/// A UDP socket connected to one server with a bounded round-trip time.
///
/// Each request is one datagram out and one datagram back. Nothing is
/// retried: a lost packet surfaces as [`Error::Timeout`].
#[derive(Debug)]
pub struct Transport {
  socket: UdpSocket,
  peer: SocketAddr,
  timeout: Duration,
  latency: Duration,
}

impl Transport {
  /// Resolve the endpoint and connect an ephemeral UDP socket to it.
  pub async fn open(endpoint: &ServerEndpoint, timeout: Duration) -> Result<Self> {
    let peer = tokio::net::lookup_host((endpoint.host(), endpoint.port()))
      .await
      .map_err(Error::PortUnreachable)?
      .next()
      .ok_or_else(|| {
        Error::PortUnreachable(io::Error::new(
          io::ErrorKind::InvalidInput,
          format!("no addresses found for {endpoint}"),
        ))
      })?;

    let local: SocketAddr = if peer.is_ipv6() {
      (Ipv6Addr::UNSPECIFIED, 0).into()
    } else {
      (Ipv4Addr::UNSPECIFIED, 0).into()
    };

    let socket = UdpSocket::bind(local).await.map_err(Error::PortUnreachable)?;
    socket.connect(peer).await.map_err(Error::PortUnreachable)?;
    tracing::debug!(%peer, "udp channel open");

    Ok(Self {
      socket,
      peer,
      timeout,
      latency: Duration::ZERO,
    })
  }

  pub fn peer(&self) -> SocketAddr {
    self.peer
  }

  pub fn timeout(&self) -> Duration {
    self.timeout
  }

  pub fn set_timeout(&mut self, timeout: Duration) {
    self.timeout = timeout;
  }

  /// Wall-clock time the last [`Transport::receive`] waited.
  pub fn latency(&self) -> Duration {
    self.latency
  }

  /// Send one raw datagram.
  pub async fn send(&mut self, bytes: &[u8]) -> Result<()> {
    self.discard_stale();
    self
      .socket
      .send(bytes)
      .await
      .map_err(Error::PortUnreachable)?;
    Ok(())
  }

  /// Wait for one datagram of at most `max_len` bytes.
  ///
  /// A reply that shows up after the timeout elapsed is still a timeout.
  pub async fn receive(&mut self, max_len: usize) -> Result<Vec<u8>> {
    let mut buffer = vec![0u8; max_len];
    let started = Instant::now();
    let outcome = await_timeout(self.timeout, self.socket.recv(&mut buffer)).await;
    self.latency = started.elapsed();

    match outcome {
      Err(_) => Err(Error::Timeout(self.timeout)),
      Ok(Err(err)) => Err(Error::PortUnreachable(err)),
      Ok(Ok(_)) if self.latency > self.timeout => Err(Error::Timeout(self.timeout)),
      Ok(Ok(len)) => {
        buffer.truncate(len);
        tracing::trace!(bytes = len, latency = ?self.latency, "<-- datagram");
        Ok(buffer)
      }
    }
  }

  /// Send `command` as a control packet and return the decoded reply text.
  ///
  /// `log_repr` replaces the command in logs, used to keep passwords out.
  pub async fn request(&mut self, command: &str, log_repr: Option<&str>) -> Result<String> {
    tracing::debug!("--> {}", log_repr.unwrap_or(command));
    self.send(&packet::encode(command)).await?;
    let reply = self.receive(MAX_REPLY_LEN).await?;
    Ok(packet::decode_print(&reply))
  }

  /// Drop datagrams already queued on the socket, typically late answers to
  /// a request that timed out.
  fn discard_stale(&self) {
    let mut scratch = [0u8; MAX_REPLY_LEN];
    loop {
      match self.socket.try_recv(&mut scratch) {
        Ok(len) => tracing::debug!(bytes = len, "discarded stale datagram"),
        Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
        Err(err) => {
          tracing::trace!(error = %err, "pending socket error cleared");
          break;
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  async fn silent_peer() -> (UdpSocket, ServerEndpoint) {
    let peer = UdpSocket::bind("127.0.0.1:0").await.expect("bind peer");
    let port = peer.local_addr().expect("peer addr").port();
    (peer, ServerEndpoint::new("127.0.0.1", port))
  }

  #[test]
  fn endpoint_displays_host_and_port() {
    assert_eq!(ServerEndpoint::new("10.0.0.1", 27910).to_string(), "10.0.0.1:27910");
  }

  #[tokio::test]
  async fn receive_times_out_without_reply() {
    let (_peer, endpoint) = silent_peer().await;
    let mut transport = Transport::open(&endpoint, Duration::from_millis(50))
      .await
      .expect("open");

    transport.send(b"ping").await.expect("send");
    let err = transport.receive(64).await.unwrap_err();

    assert!(matches!(err, Error::Timeout(_)));
    assert!(transport.latency() >= Duration::from_millis(50));
  }

  #[tokio::test]
  async fn receive_returns_datagram_and_records_latency() {
    let (peer, endpoint) = silent_peer().await;
    let mut transport = Transport::open(&endpoint, Duration::from_secs(2))
      .await
      .expect("open");

    transport.send(b"hello").await.expect("send");
    let mut buf = [0u8; 16];
    let (len, from) = peer.recv_from(&mut buf).await.expect("peer recv");
    assert_eq!(&buf[..len], b"hello");
    peer.send_to(b"world", from).await.expect("peer send");

    assert_eq!(transport.receive(64).await.expect("receive"), b"world");
    assert!(transport.latency() < Duration::from_secs(2));
  }

  #[tokio::test]
  async fn stale_reply_is_discarded_before_next_request() {
    let (peer, endpoint) = silent_peer().await;
    let mut transport = Transport::open(&endpoint, Duration::from_secs(2))
      .await
      .expect("open");

    transport.send(b"first").await.expect("send");
    let mut buf = [0u8; 16];
    let (_, from) = peer.recv_from(&mut buf).await.expect("peer recv");
    peer.send_to(b"late", from).await.expect("peer send");
    // let the late datagram land and the socket register readiness
    tokio::time::sleep(Duration::from_millis(50)).await;
    transport
      .socket
      .readable()
      .await
      .expect("readable");

    transport.send(b"second").await.expect("send");
    peer.recv_from(&mut buf).await.expect("peer recv");
    peer.send_to(b"fresh", from).await.expect("peer send");

    assert_eq!(transport.receive(64).await.expect("receive"), b"fresh");
  }
}
