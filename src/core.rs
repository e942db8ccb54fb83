use std::io::{self, IsTerminal};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
  cli::{Cli, Command},
  client::{Client, Reachability},
  logging,
  runtime::Outcome,
  ui,
  util::command,
};

/// Run a single dpquery invocation.
pub async fn run(cli: Cli) -> Result<Outcome> {
  let use_color_stdout = !cli.plain && io::stdout().is_terminal();
  let use_color_logs = !cli.plain && io::stderr().is_terminal();

  logging::init(cli.verbose, use_color_logs);

  let mut client =
    Client::connect(&cli.host, cli.port, Duration::from_millis(cli.timeout_ms))
      .await
      .with_context(|| {
        format!("failed to open UDP channel to {}:{}", cli.host, cli.port)
      })?
      .with_server_list_url(&cli.server_list_url);

  if let Some(password) = cli.password.as_deref() {
    client.set_password(password);
  }

  tracing::debug!(
    server = %client.endpoint(),
    rcon = client.has_password(),
    timeout_ms = cli.timeout_ms,
    "client ready"
  );

  dispatch(&cli.command, &mut client, use_color_stdout).await
}

async fn dispatch(
  command: &Command,
  client: &mut Client,
  use_color: bool,
) -> Result<Outcome> {
  match command {
    Command::Online => {
      let reachability = client.is_online().await;
      ui::render_reachability(reachability, use_color);
      Ok(Outcome::from(reachability == Reachability::Online))
    }
    Command::Ping => {
      let alive = client.ping().await;
      let label = if alive {
        format!("reply in {} ms", client.last_latency().as_millis())
      } else {
        "no reply".to_owned()
      };
      ui::render_outcome(&label, alive, use_color);
      Ok(Outcome::from(alive))
    }
    Command::PasswordCheck => {
      let protected = client
        .has_password_set()
        .await
        .context("password probe failed")?;
      ui::render_outcome("join password required", protected, use_color);
      Ok(Outcome::Success)
    }
    Command::Status => {
      let snapshot = client.status_info().await.context("status query failed")?;
      ui::render_status(snapshot, use_color);
      Ok(Outcome::Success)
    }
    Command::Players { extended: false } => {
      let players = client.players().await.context("status query failed")?;
      ui::render_players(players, use_color);
      Ok(Outcome::Success)
    }
    Command::Players { extended: true } => {
      let players = client
        .extended_players()
        .await
        .context("failed to list players")?;
      ui::render_extended_players(&players, use_color);
      Ok(Outcome::Success)
    }
    Command::Maps => {
      let maps = client
        .map_rotation()
        .await
        .context("failed to read map rotation")?;
      ui::render_maps(&maps, use_color);
      Ok(Outcome::Success)
    }
    Command::Bots => {
      let bots = client.bots().await.context("failed to list bots")?;
      ui::render_list(&bots, "no bots");
      Ok(Outcome::Success)
    }
    Command::Bans => {
      let bans = client.bans().await.context("failed to read ban list")?;
      ui::render_list(&bans, "no bans");
      Ok(Outcome::Success)
    }
    Command::User { client_id } => {
      let info = client
        .user_info(*client_id)
        .await
        .with_context(|| format!("failed to dump user {client_id}"))?;
      ui::render_pairs(&info);
      Ok(Outcome::Success)
    }
    Command::Get { name } => {
      let value = client
        .variable(name)
        .await
        .with_context(|| format!("failed to read `{name}`"))?;
      match value {
        Some(value) => {
          println!("{value}");
          Ok(Outcome::Success)
        }
        None => {
          ui::render_outcome(&format!("`{name}` is not set"), false, use_color);
          Ok(Outcome::Refused)
        }
      }
    }
    Command::Set {
      name,
      value,
      server,
    } => {
      let done = client
        .set_variable(name, value, *server)
        .await
        .with_context(|| format!("failed to set `{name}`"))?;
      ui::render_outcome(&format!("set {name}"), done, use_color);
      Ok(Outcome::from(done))
    }
    Command::Ban { mask, no_write } => {
      let done = client
        .ban(mask, !no_write)
        .await
        .with_context(|| format!("failed to ban {mask}"))?;
      ui::render_outcome(&format!("ban {mask}"), done, use_color);
      Ok(Outcome::from(done))
    }
    Command::Unban { mask, no_write } => {
      let done = client
        .unban(mask, !no_write)
        .await
        .with_context(|| format!("failed to unban {mask}"))?;
      ui::render_outcome(&format!("unban {mask}"), done, use_color);
      Ok(Outcome::from(done))
    }
    Command::Kick { client_id } => {
      let done = client
        .kick(*client_id)
        .await
        .with_context(|| format!("failed to kick {client_id}"))?;
      ui::render_outcome(&format!("kick {client_id}"), done, use_color);
      Ok(Outcome::from(done))
    }
    Command::Listed => {
      let listed = client
        .is_on_server_list(false)
        .await
        .context("server list lookup failed")?;
      ui::render_outcome("on the master server list", listed, use_color);
      Ok(Outcome::from(listed))
    }
    Command::Rcon { command } if command.is_empty() => {
      run_interactive(client, use_color).await
    }
    Command::Rcon { command } => run_one_shot(command, client, use_color).await,
  }
}

async fn run_one_shot(
  words: &[String],
  client: &mut Client,
  use_color: bool,
) -> Result<Outcome> {
  let command_text = words.join(" ");
  let command = command::sanitize(&command_text).ok_or_else(|| {
    anyhow!("command was empty after trimming whitespace")
  })?;

  let reply = client
    .rcon(&command)
    .await
    .with_context(|| format!("rcon `{command}` failed"))?;
  ui::render_reply(&command, &reply, use_color);
  Ok(Outcome::Success)
}

async fn run_interactive(
  client: &mut Client,
  use_color: bool,
) -> Result<Outcome> {
  if !client.has_password() {
    return Err(anyhow!(
      "the console prompt needs an RCON password; supply --password or set RCON_PASSWORD"
    ));
  }

  let mut stdin = BufReader::new(tokio::io::stdin());
  let mut stdout = tokio::io::stdout();
  let mut input = String::new();

  loop {
    ui::render_prompt(&mut stdout, use_color)
      .await
      .context("failed to render prompt")?;

    input.clear();
    let bytes_read = stdin
      .read_line(&mut input)
      .await
      .context("failed to read line from stdin")?;

    if bytes_read == 0 {
      println!();
      tracing::info!("stdin closed; leaving console");
      break;
    }

    if command::is_exit_command(&input) {
      break;
    }

    let Some(command) = command::sanitize(&input) else {
      continue;
    };

    // a lost datagram should not end the session
    match client.rcon(&command).await {
      Ok(reply) => ui::render_reply(&command, &reply, use_color),
      Err(err) if err.is_connection_error() => {
        tracing::warn!(error = %err, "no reply; the command may or may not have run");
      }
      Err(err) => return Err(err).context("console command failed"),
    }
  }

  Ok(Outcome::Success)
}
