use crate::{Cli, run};
use owo_colors::OwoColorize;

/// How a command that ran to completion ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  Success,
  /// The server refused the request, or a check came back negative.
  Refused,
}

impl Outcome {
  pub fn exit_code(self) -> i32 {
    match self {
      Outcome::Success => 0,
      Outcome::Refused => 2,
    }
  }
}

impl From<bool> for Outcome {
  fn from(ok: bool) -> Self {
    if ok { Outcome::Success } else { Outcome::Refused }
  }
}

/// Runs one dpquery invocation and turns its outcome into an exit code.
pub struct Runtime {
  cli: Cli,
}

impl Runtime {
  #[must_use]
  pub fn new(cli: Cli) -> Self {
    Self { cli }
  }

  /// Errors are printed with their full cause chain and exit with `1`.
  pub async fn execute(self) -> i32 {
    match run(self.cli).await {
      Ok(outcome) => outcome.exit_code(),
      Err(err) => {
        log_error_chain(&err);
        1
      }
    }
  }
}

fn log_error_chain(err: &anyhow::Error) {
  eprintln!("{} {}", "error:".red().bold(), err.to_string().red().bold());

  for cause in err.chain().skip(1) {
    eprintln!("  {} {}", "↳".red(), cause);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn refusals_exit_with_two() {
    assert_eq!(Outcome::from(true).exit_code(), 0);
    assert_eq!(Outcome::from(false), Outcome::Refused);
    assert_eq!(Outcome::Refused.exit_code(), 2);
  }
}
