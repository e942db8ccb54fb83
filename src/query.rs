//! Remote-console operations built on [`Client::rcon`].
//!
//! Server-side rejections (full server, unknown bot, protected variable)
//! come back as `Ok(false)` with a warning logged; only transport and
//! authentication failures are errors.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use crate::client::Client;
use crate::error::{Error, Result};
use crate::status::{Ping, Team};

/// One line of `sv maplist`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapRotationEntry {
  pub points: u32,
  pub map: String,
  /// Voted in by players rather than part of the configured rotation.
  pub user_added: bool,
}

/// A player row from the console `status` listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedPlayerRecord {
  pub client_id: u32,
  pub score: i32,
  pub ping: Ping,
  pub name: String,
  /// Milliseconds since the last packet from this client.
  pub idle: u32,
  pub ip: Ipv4Addr,
  pub port: u16,
  pub qport: u16,
  /// Team from the public status list; `None` when no name matched.
  pub team: Option<Team>,
}

impl ExtendedPlayerRecord {
  pub fn is_connecting(&self) -> bool {
    self.ping == Ping::Connecting
  }

  pub fn is_zombie(&self) -> bool {
    self.ping == Ping::Zombie
  }
}

impl Client {
  /// Current map rotation with vote points.
  pub async fn map_rotation(&mut self) -> Result<Vec<MapRotationEntry>> {
    let reply = self.rcon("sv maplist").await?;
    Ok(reply.lines().filter_map(parse_map_line).collect())
  }

  /// Names of the bots on the server.
  pub async fn bots(&mut self) -> Result<Vec<String>> {
    let reply = self.rcon("sv listuserip").await?;
    Ok(reply.lines().filter_map(parse_bot_line).map(String::from).collect())
  }

  /// Add a bot, named by the server when `name` is `None`.
  pub async fn add_bot(&mut self, name: Option<&str>) -> Result<bool> {
    let reply = self.rcon(&format!("sv addbot {}", name.unwrap_or_default())).await?;
    Ok(accept_unless(
      "add bot",
      &reply,
      reply.trim().ends_with("increase Maxclients."),
    ))
  }

  /// Remove one bot, or all of them when `name` is `None`.
  pub async fn remove_bot(&mut self, name: Option<&str>) -> Result<bool> {
    let reply = self.rcon(&format!("sv removebot {}", bot_target(name))).await?;
    Ok(accept_unless(
      "remove bot",
      &reply,
      !reply.trim().ends_with("disconnected."),
    ))
  }

  /// Issue `sv botcommand` to one bot, or all of them.
  pub async fn bot_command(&mut self, name: Option<&str>) -> Result<bool> {
    let reply = self.rcon(&format!("sv botcommand {}", bot_target(name))).await?;
    Ok(accept_unless(
      "command bot",
      &reply,
      reply.trim().ends_with("not found"),
    ))
  }

  /// Console player listing, without team information.
  pub async fn rcon_players(&mut self) -> Result<Vec<ExtendedPlayerRecord>> {
    let reply = self.rcon("status").await?;
    Ok(reply.lines().filter_map(parse_player_line).collect())
  }

  /// Console player listing merged by name with teams from a freshly
  /// refreshed public status.
  pub async fn extended_players(&mut self) -> Result<Vec<ExtendedPlayerRecord>> {
    // no datagrams at all without a password
    if !self.has_password() {
      return Err(Error::RconPasswordUnset);
    }

    let teams: HashMap<String, Team> = self
      .refresh_status(true)
      .await?
      .players()
      .iter()
      .map(|player| (player.name.clone(), player.team))
      .collect();

    let mut players = self.rcon_players().await?;
    for player in &mut players {
      player.team = teams.get(&player.name).copied();
    }
    Ok(players)
  }

  /// Userinfo a client sent when connecting (`dumpuser`).
  pub async fn user_info(&mut self, client_id: u32) -> Result<HashMap<String, String>> {
    let reply = self.rcon(&format!("dumpuser {client_id}")).await?;
    Ok(parse_user_dump(&reply))
  }

  /// Value of a console variable, `None` if the server did not report one.
  pub async fn variable(&mut self, name: &str) -> Result<Option<String>> {
    let reply = self.rcon(name).await?;
    Ok(parse_variable(&reply).map(String::from))
  }

  /// Set a console variable. `server_flag` publishes it in the status
  /// reply.
  pub async fn set_variable(
    &mut self,
    name: &str,
    value: &str,
    server_flag: bool,
  ) -> Result<bool> {
    let flag = if server_flag { " s" } else { "" };
    let reply = self.rcon(&format!("set {name} \"{value}\"{flag}")).await?;
    Ok(accept_unless(
      "set variable",
      &reply,
      reply.contains("is write protected."),
    ))
  }

  pub async fn unset_variable(&mut self, name: &str) -> Result<bool> {
    let reply = self.rcon(&format!("unset {name}")).await?;
    Ok(accept_unless(
      "unset variable",
      &reply,
      reply.contains("is write protected."),
    ))
  }

  /// Ban a hostmask; on success optionally write the ban list to disk.
  pub async fn ban(&mut self, mask: &str, write: bool) -> Result<bool> {
    let reply = self.rcon(&format!("sv addip \"{mask}\"")).await?;
    if !accept_unless("add ip", &reply, !reply.trim().is_empty()) {
      return Ok(false);
    }
    if write {
      self.write_bans().await?;
    }
    Ok(true)
  }

  /// Lift a hostmask ban; on success optionally write the ban list.
  pub async fn unban(&mut self, mask: &str, write: bool) -> Result<bool> {
    let reply = self.rcon(&format!("sv removeip \"{mask}\"")).await?;
    if !accept_unless("remove ip", &reply, !reply.trim().is_empty()) {
      return Ok(false);
    }
    if write {
      self.write_bans().await?;
    }
    Ok(true)
  }

  /// Banned hostmasks.
  pub async fn bans(&mut self) -> Result<Vec<String>> {
    let reply = self.rcon("sv listip").await?;
    Ok(parse_ban_list(&reply))
  }

  /// Persist the ban list (`sv writeip`).
  pub async fn write_bans(&mut self) -> Result<bool> {
    let reply = self.rcon("sv writeip").await?;
    Ok(accept_unless(
      "write ban list",
      &reply,
      !reply.trim().starts_with("Writing"),
    ))
  }

  pub async fn kick(&mut self, client_id: u32) -> Result<bool> {
    let reply = self.rcon(&format!("kick {client_id}")).await?;
    let trimmed = reply.trim();
    Ok(accept_unless(
      "kick",
      &reply,
      trimmed.starts_with("Bad client slot") || trimmed.contains("is not active"),
    ))
  }

  /// Change map, optionally switching the game mode too.
  pub async fn new_map(&mut self, map: &str, mode: Option<&str>) -> Result<bool> {
    let command = match mode.filter(|mode| !mode.is_empty()) {
      Some(mode) => format!("sv newmap {map} {mode}"),
      None => format!("sv newmap {map}"),
    };
    let reply = self.rcon(&command).await?;
    Ok(accept_unless("change map", &reply, !reply.trim().is_empty()))
  }

  pub async fn remove_temp_bans(&mut self) -> Result<()> {
    self.rcon("sv removetbans").await.map(drop)
  }

  /// Ask the server to announce itself to the master list.
  pub async fn heartbeat(&mut self) -> Result<()> {
    self.rcon("sv heartbeat").await.map(drop)
  }

  /// Stop the game while leaving the process up; nobody can join.
  pub async fn kill_server(&mut self) -> Result<()> {
    self.rcon("killserver").await.map(drop)
  }

  /// Shut the server process down.
  pub async fn quit(&mut self) -> Result<()> {
    self.rcon("quit").await.map(drop)
  }
}

fn bot_target(name: Option<&str>) -> &str {
  name.filter(|name| !name.is_empty()).unwrap_or("all")
}

/// `true` unless `rejected`, in which case the reply is logged.
fn accept_unless(action: &str, reply: &str, rejected: bool) -> bool {
  if rejected {
    tracing::warn!(action, reply = reply.trim(), "server refused command");
  }
  !rejected
}

/// `12 pbcup` or `(3 midnight)`.
fn parse_map_line(line: &str) -> Option<MapRotationEntry> {
  let line = line.trim();
  let (parenthesized, rest) = match line.strip_prefix('(') {
    Some(rest) => (true, rest),
    None => (false, line),
  };
  let (points, map) = rest.split_once(' ')?;
  if points.is_empty() || !points.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  let map = map.strip_suffix(')').unwrap_or(map);

  Some(MapRotationEntry {
    points: points.parse().ok()?,
    map: map.to_string(),
    user_added: !parenthesized,
  })
}

/// ` name []`
fn parse_bot_line(line: &str) -> Option<&str> {
  line.trim_end().strip_prefix(' ')?.strip_suffix(" []")
}

/// `<id> <score> <ping> <name> <idle> <a.b.c.d>:<port> <qport>`; the name
/// may contain spaces.
fn parse_player_line(line: &str) -> Option<ExtendedPlayerRecord> {
  let line = line.trim();

  let (client_id, rest) = split_field(line)?;
  let (score, rest) = split_field(rest)?;
  let (ping, rest) = split_field(rest)?;

  let (rest, qport) = rsplit_field(rest)?;
  let (rest, address) = rsplit_field(rest)?;
  let (name, idle) = rsplit_field(rest)?;
  let name = name.trim();
  if name.is_empty() {
    return None;
  }

  let (ip, port) = address.split_once(':')?;

  Some(ExtendedPlayerRecord {
    client_id: parse_digits(client_id)?,
    score: parse_digits(score)?,
    ping: Ping::parse(ping),
    name: name.to_string(),
    idle: parse_digits(idle)?,
    ip: ip.parse().ok()?,
    port: parse_digits(port)?,
    qport: parse_digits(qport)?,
    team: None,
  })
}

/// Leading field and the remainder after its separating spaces.
fn split_field(s: &str) -> Option<(&str, &str)> {
  let (field, rest) = s.split_once(' ')?;
  Some((field, rest.trim_start_matches(' ')))
}

/// Remainder before the separating spaces and the trailing field.
fn rsplit_field(s: &str) -> Option<(&str, &str)> {
  let (rest, field) = s.rsplit_once(' ')?;
  Some((rest.trim_end_matches(' '), field))
}

fn parse_digits<T: std::str::FromStr>(field: &str) -> Option<T> {
  if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  field.parse().ok()
}

/// `dumpuser` output: two header lines, then `key    value` rows.
fn parse_user_dump(reply: &str) -> HashMap<String, String> {
  reply
    .split('\n')
    .skip(2)
    .filter_map(|line| {
      let (key, value) = line.split_once(' ')?;
      let value = value.trim();
      (!value.is_empty()).then(|| (key.trim().to_string(), value.to_string()))
    })
    .collect()
}

/// `"name" is "value"`
fn parse_variable(reply: &str) -> Option<&str> {
  let rest = reply.trim_end_matches(['\r', '\n']).strip_prefix('"')?;
  let (name, value) = rest.split_once("\" is \"")?;
  if name.is_empty() || name.contains('"') {
    return None;
  }
  value.strip_suffix('"').filter(|value| !value.contains('\n'))
}

/// `sv listip` output: a header, then padded dotted quads like
/// `192.168.  1.  1`.
fn parse_ban_list(reply: &str) -> Vec<String> {
  reply
    .split('\n')
    .skip(1)
    .map(str::trim)
    .filter(|line| is_padded_quad(line))
    .map(|line| line.replace(' ', ""))
    .collect()
}

fn is_padded_quad(line: &str) -> bool {
  let octets: Vec<&str> = line.split('.').collect();
  octets.len() == 4
    && octets.iter().all(|octet| {
      let digits = octet.trim_start_matches(' ');
      octet.len() <= 3
        && !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
    })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn map_rotation_lines() {
    let reply = "Map rotation:\n12 pbcup\n(3 midnight)\n  0 river \nbogus line\n";
    let maps: Vec<MapRotationEntry> = reply.lines().filter_map(parse_map_line).collect();

    assert_eq!(
      maps,
      [
        MapRotationEntry {
          points: 12,
          map: "pbcup".to_string(),
          user_added: true,
        },
        MapRotationEntry {
          points: 3,
          map: "midnight".to_string(),
          user_added: false,
        },
        MapRotationEntry {
          points: 0,
          map: "river".to_string(),
          user_added: true,
        },
      ]
    );
  }

  #[test]
  fn bot_lines() {
    let reply = "Bots:\n Rusty []\n Bolt Thrower []  \nJoe [1.2.3.4]\n []\n";
    let bots: Vec<&str> = reply.lines().filter_map(parse_bot_line).collect();
    assert_eq!(bots, ["Rusty", "Bolt Thrower"]);
  }

  #[test]
  fn player_line_with_spaced_name() {
    let line = "  3    12   87 Big Joe          150 192.168.1.20:27901 31337";
    let player = parse_player_line(line).expect("row");

    assert_eq!(player.client_id, 3);
    assert_eq!(player.score, 12);
    assert_eq!(player.ping, Ping::Millis(87));
    assert_eq!(player.name, "Big Joe");
    assert_eq!(player.idle, 150);
    assert_eq!(player.ip, Ipv4Addr::new(192, 168, 1, 20));
    assert_eq!(player.port, 27901);
    assert_eq!(player.qport, 31337);
    assert!(!player.is_connecting());
  }

  #[test]
  fn player_line_states() {
    let connecting =
      parse_player_line("0 0 CNCT newbie 0 10.0.0.5:27901 1234").expect("row");
    assert!(connecting.is_connecting());
    assert_eq!(connecting.ping.millis(), None);

    let zombie = parse_player_line("1 4 ZMBI ghost 9000 10.0.0.6:27901 99").expect("row");
    assert!(zombie.is_zombie());
  }

  #[test]
  fn player_header_and_malformed_rows_are_skipped() {
    for line in [
      "map              : pbcup",
      "num score ping name            lastmsg address               qport ",
      "--- ----- ---- --------------- ------- --------------------- ------",
      "0 0 50 name 10 not-an-ip:27901 1",
      "0 0 50 10 10.0.0.1:27901 1",
      "",
    ] {
      assert_eq!(parse_player_line(line), None, "{line:?}");
    }
  }

  #[test]
  fn user_dump_skips_header_and_empty_values() {
    let reply = "userinfo\n--------\nname         JoeJoe\nbuild        18\nhand\nskin         male/pb2b\n";
    let info = parse_user_dump(reply);

    assert_eq!(info.len(), 3);
    assert_eq!(info["name"], "JoeJoe");
    assert_eq!(info["build"], "18");
    assert_eq!(info["skin"], "male/pb2b");
  }

  #[test]
  fn variable_reply() {
    assert_eq!(parse_variable("\"hostname\" is \"My Server\"\n"), Some("My Server"));
    assert_eq!(parse_variable("\"password\" is \"\""), Some(""));
    assert_eq!(parse_variable("Unknown command \"foo\""), None);
    assert_eq!(parse_variable("\"a\" is \"b\"\nx\""), None);
  }

  #[test]
  fn ban_list_strips_padding() {
    let reply = "Filter list:\n192.168.  1.  1\n 10.  0.  0.  0\nnot a ban\n1.2.3\n";
    assert_eq!(parse_ban_list(reply), ["192.168.1.1", "10.0.0.0"]);
  }

  #[test]
  fn ban_list_ignores_header_even_if_it_looks_like_a_ban() {
    assert_eq!(parse_ban_list("1.2.3.4\n5.6.7.8"), ["5.6.7.8"]);
  }

  #[test]
  fn bot_target_defaults_to_all() {
    assert_eq!(bot_target(None), "all");
    assert_eq!(bot_target(Some("")), "all");
    assert_eq!(bot_target(Some("Rusty")), "Rusty");
  }
}
