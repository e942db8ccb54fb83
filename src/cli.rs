use clap::{ArgAction, Parser, Subcommand};

use crate::server_list::DEFAULT_SERVER_LIST_URL;
use crate::transport::DEFAULT_PORT;

/// Command-line arguments for dpquery.
#[derive(Parser, Debug, Clone)]
#[command(
  author,
  version,
  about = "Query and administer Digital Paint servers over UDP"
)]
pub struct Cli {
  /// Hostname or IP address of the game server.
  #[arg(long, env = "DPQUERY_HOST", default_value = "127.0.0.1")]
  pub host: String,

  /// UDP port of the game server.
  #[arg(
    long,
    env = "DPQUERY_PORT",
    default_value_t = DEFAULT_PORT,
    value_parser = clap::value_parser!(u16).range(1..)
  )]
  pub port: u16,

  /// RCON password, required by administrative commands.
  #[arg(long, env = "DPQUERY_PASSWORD", hide_env_values = true)]
  pub password: Option<String>,

  /// Round-trip timeout in milliseconds.
  #[arg(
    long,
    env = "DPQUERY_TIMEOUT_MS",
    default_value_t = 3_000,
    value_name = "MILLISECONDS"
  )]
  pub timeout_ms: u64,

  /// Master server list consulted by `listed`.
  #[arg(long, env = "DPQUERY_SERVER_LIST_URL", default_value = DEFAULT_SERVER_LIST_URL)]
  pub server_list_url: String,

  /// Increase logging verbosity (repeat for TRACE).
  #[arg(short, long, action = ArgAction::Count, global = true)]
  pub verbose: u8,

  /// Disable ANSI color output.
  #[arg(long, global = true)]
  pub plain: bool,

  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
  /// Check whether a Digital Paint server answers on the endpoint.
  Online,
  /// Check whether anything answers a ping.
  Ping,
  /// Check whether the server requires a join password.
  PasswordCheck,
  /// Show server variables, scores and the player list.
  Status,
  /// List players.
  Players {
    /// Include address, client id and connection state (needs RCON).
    #[arg(long)]
    extended: bool,
  },
  /// Show the map rotation with vote points.
  Maps,
  /// List bots.
  Bots,
  /// List banned hostmasks.
  Bans,
  /// Dump the userinfo of a client.
  User { client_id: u32 },
  /// Read a console variable.
  Get { name: String },
  /// Write a console variable.
  Set {
    name: String,
    value: String,
    /// Publish the variable in the status reply.
    #[arg(long)]
    server: bool,
  },
  /// Ban a hostmask.
  Ban {
    mask: String,
    /// Do not write the ban list to disk afterwards.
    #[arg(long)]
    no_write: bool,
  },
  /// Lift a hostmask ban.
  Unban {
    mask: String,
    /// Do not write the ban list to disk afterwards.
    #[arg(long)]
    no_write: bool,
  },
  /// Kick a client by id.
  Kick { client_id: u32 },
  /// Check whether the server appears on the master server list.
  Listed,
  /// Run a raw console command, or open a prompt when none is given.
  Rcon {
    #[arg(value_name = "COMMAND", trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
  },
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_defaults_and_subcommand() {
    let cli = Cli::try_parse_from(["dpquery", "status"]).expect("parse");
    assert_eq!(cli.port, DEFAULT_PORT);
    assert_eq!(cli.timeout_ms, 3_000);
    assert_eq!(cli.command, Command::Status);
  }

  #[test]
  fn rcon_collects_trailing_words() {
    let cli = Cli::try_parse_from([
      "dpquery", "--password", "pw", "rcon", "sv", "newmap", "-x",
    ])
    .expect("parse");
    assert_eq!(
      cli.command,
      Command::Rcon {
        command: vec!["sv".into(), "newmap".into(), "-x".into()],
      }
    );
  }

  #[test]
  fn port_zero_is_rejected() {
    assert!(Cli::try_parse_from(["dpquery", "--port", "0", "ping"]).is_err());
  }
}
