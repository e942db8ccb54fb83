use std::collections::BTreeMap;
use std::time::Duration;

use rand::Rng;

use crate::error::Result;
use crate::rcon::RconSession;
use crate::server_list::ServerList;
use crate::status::{PlayerSummary, StatusCache, StatusSnapshot, Team};
use crate::transport::{MAX_REPLY_LEN, ServerEndpoint, Transport};

/// Default round-trip timeout, matching what the game's own tools use.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Substrings that identify a Digital Paint `status` reply.
const PROTOCOL_MARKERS: [&str; 2] = ["DPPB2", "Digital Paint"];

/// Name announced by the password probe.
const PROBE_NAME: &str = "dpquery PW test";

/// Outcome of [`Client::is_online`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
  /// Replied with a Digital Paint status.
  Online,
  /// No reply, or the port is closed.
  Offline,
  /// Something answered, but not in this game's dialect.
  Unrecognized,
}

/// Query and remote-console client for a single server.
///
/// All operations take `&mut self`: one request is in flight at a time and
/// each is a single datagram exchange bounded by the timeout.
#[derive(Debug)]
pub struct Client {
  endpoint: ServerEndpoint,
  transport: Transport,
  rcon: RconSession,
  status: StatusCache,
  server_list: ServerList,
}

impl Client {
  /// Open a UDP channel to `host:port`.
  pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
    let endpoint = ServerEndpoint::new(host, port);
    let transport = Transport::open(&endpoint, timeout).await?;

    Ok(Self {
      endpoint,
      transport,
      rcon: RconSession::default(),
      status: StatusCache::new(),
      server_list: ServerList::default(),
    })
  }

  /// Builder-style variant of [`Client::set_password`].
  #[must_use]
  pub fn with_password(mut self, password: impl Into<String>) -> Self {
    self.set_password(password);
    self
  }

  /// Use a different master server list URL.
  #[must_use]
  pub fn with_server_list_url(mut self, url: impl Into<String>) -> Self {
    self.server_list = ServerList::new(url);
    self
  }

  pub fn endpoint(&self) -> &ServerEndpoint {
    &self.endpoint
  }

  /// Set the RCON password; an empty string clears it.
  pub fn set_password(&mut self, password: impl Into<String>) {
    self.rcon.set_password(password);
  }

  pub fn clear_password(&mut self) {
    self.rcon.clear_password();
  }

  pub fn has_password(&self) -> bool {
    self.rcon.has_password()
  }

  pub fn timeout(&self) -> Duration {
    self.transport.timeout()
  }

  pub fn set_timeout(&mut self, timeout: Duration) {
    self.transport.set_timeout(timeout);
  }

  /// How long the most recent reply took to arrive.
  pub fn last_latency(&self) -> Duration {
    self.transport.latency()
  }

  /// Run a raw console command and return the server's reply text.
  pub async fn rcon(&mut self, command: &str) -> Result<String> {
    self.rcon.execute(&mut self.transport, command).await
  }

  /// Re-query `status` when nothing is cached or `force` is set.
  pub async fn refresh_status(&mut self, force: bool) -> Result<&StatusSnapshot> {
    self.status.refresh(&mut self.transport, force).await
  }

  /// Drop the cached status so the next reader queries the server.
  pub fn invalidate_status(&mut self) {
    self.status.invalidate();
  }

  /// Cached status, fetched on first use.
  pub async fn status_info(&mut self) -> Result<&StatusSnapshot> {
    self.refresh_status(false).await
  }

  pub async fn build(&mut self) -> Result<u32> {
    Ok(self.status_info().await?.build())
  }

  pub async fn players(&mut self) -> Result<&[PlayerSummary]> {
    Ok(self.status_info().await?.players())
  }

  pub async fn server_name(&mut self) -> Result<Option<&str>> {
    Ok(self.status_info().await?.server_name())
  }

  pub async fn map(&mut self) -> Result<Option<&str>> {
    Ok(self.status_info().await?.map())
  }

  pub async fn scores(&mut self) -> Result<BTreeMap<Team, i32>> {
    Ok(self.status_info().await?.scores())
  }

  /// Probe with `status`. Connection failures become
  /// [`Reachability::Offline`] rather than an error.
  pub async fn is_online(&mut self) -> Reachability {
    match self.transport.request("status", None).await {
      Ok(reply) if PROTOCOL_MARKERS.iter().any(|marker| reply.contains(marker)) => {
        Reachability::Online
      }
      Ok(_) => Reachability::Unrecognized,
      Err(err) => {
        tracing::debug!(error = %err, "status probe failed");
        Reachability::Offline
      }
    }
  }

  /// Whether the server answers a `ping` at all within the timeout.
  ///
  /// The round-trip time is available from [`Client::last_latency`]
  /// afterwards.
  pub async fn ping(&mut self) -> bool {
    let sent = self.transport.send(&crate::packet::encode("ping")).await;
    match sent {
      Ok(()) => match self.transport.receive(MAX_REPLY_LEN).await {
        Ok(_) => true,
        Err(err) => {
          tracing::debug!(error = %err, "ping unanswered");
          false
        }
      },
      Err(err) => {
        tracing::debug!(error = %err, "ping not sent");
        false
      }
    }
  }

  /// Whether the server requires a join password.
  ///
  /// Requests a challenge and then a connect with a build number no server
  /// accepts. Only an explicit `Bad Password` answer yields `true`; every
  /// other reply, including a server that lets the probe in, yields `false`.
  pub async fn has_password_set(&mut self) -> Result<bool> {
    let reply = self.transport.request("getchallenge", None).await?;
    let challenge = reply.split(' ').nth(1).unwrap_or_default().trim().to_string();

    let qport: u16 = rand::thread_rng().gen_range(1025..50000);
    let connect =
      format!("connect 34 {qport} {challenge} \"\\build\\-999\\name\\{PROBE_NAME}\"");
    let reply = self.transport.request(&connect, None).await?;

    if reply.contains("Bad Password") {
      return Ok(true);
    }
    if reply.trim() == "client_connect" {
      tracing::warn!(server = %self.endpoint, "password probe was let in; it will time out server side");
    }
    Ok(false)
  }

  /// Whether this server is on the master server list. The list is
  /// downloaded once and reused until `force` is set.
  pub async fn is_on_server_list(&mut self, force: bool) -> Result<bool> {
    self.server_list.contains(&self.endpoint, force).await
  }
}
