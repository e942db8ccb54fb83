use std::fmt;

use crate::error::{Error, Result};
use crate::transport::Transport;

/// Reply sent when the password in an `rcon` packet is wrong.
const BAD_PASSWORD_REPLY: &str = "Bad rcon_password.";

/// Password-gated remote console.
///
/// There is no login step: every packet repeats the password, so a session
/// is nothing more than the configured secret.
#[derive(Clone, Default)]
pub struct RconSession {
  password: Option<String>,
}

impl RconSession {
  pub fn new(password: Option<String>) -> Self {
    Self {
      password: password.filter(|password| !password.is_empty()),
    }
  }

  pub fn has_password(&self) -> bool {
    self.password.is_some()
  }

  /// Set the password; an empty string clears it.
  pub fn set_password(&mut self, password: impl Into<String>) {
    let password = password.into();
    self.password = (!password.is_empty()).then_some(password);
  }

  pub fn clear_password(&mut self) {
    self.password = None;
  }

  /// Run one console command and return the raw reply.
  ///
  /// Fails with [`Error::RconPasswordUnset`] before any I/O when no password
  /// is configured.
  pub async fn execute(
    &self,
    transport: &mut Transport,
    command: &str,
  ) -> Result<String> {
    let password = self.password.as_deref().ok_or(Error::RconPasswordUnset)?;

    let packet = format!("rcon \"{password}\" {command}");
    let log_repr = format!("rcon <redacted> {command}");
    let reply = transport.request(&packet, Some(&log_repr)).await?;

    if reply.trim() == BAD_PASSWORD_REPLY {
      tracing::debug!(command, "rcon password rejected");
      return Err(Error::BadRconPassword);
    }

    Ok(reply)
  }
}

impl fmt::Debug for RconSession {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RconSession")
      .field("password", &self.password.as_ref().map(|_| "<redacted>"))
      .finish()
  }
}
