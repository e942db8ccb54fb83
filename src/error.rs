use std::io;
use std::time::Duration;

/// Failures surfaced by the query and RCON client.
///
/// The set is closed so callers can match every case. [`Error::Timeout`] and
/// [`Error::PortUnreachable`] together form the connection-failure family,
/// see [`Error::is_connection_error`].
#[derive(thiserror::Error, Debug)]
pub enum Error {
  /// No reply arrived within the configured round-trip timeout.
  #[error("no reply from server within {} ms", .0.as_millis())]
  Timeout(Duration),
  /// The socket reported the destination as unreachable, or could not be
  /// set up for it at all.
  #[error("server port unreachable: {0}")]
  PortUnreachable(#[source] io::Error),
  /// An RCON operation was requested without a configured password.
  #[error("no RCON password configured")]
  RconPasswordUnset,
  /// The server answered `Bad rcon_password.`.
  #[error("server rejected the RCON password")]
  BadRconPassword,
  /// The master server list could not be downloaded.
  #[error("server list unavailable: {0}")]
  ServerListUnavailable(#[source] reqwest::Error),
}

impl Error {
  /// True for transport failures (`Timeout` or `PortUnreachable`).
  pub fn is_connection_error(&self) -> bool {
    matches!(self, Self::Timeout(_) | Self::PortUnreachable(_))
  }
}

pub type Result<T> = std::result::Result<T, Error>;
