use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::error::Result;
use crate::transport::Transport;

/// Known game code versions and the protocol build that shipped them.
const KNOWN_BUILDS: &[(&str, u32)] = &[
  ("1.901", 18),
  ("1.900", 17),
  ("1.831", 17),
  ("1.83", 16),
  ("1.82", 15),
  ("1.81", 14),
  ("1.802", 12),
  ("1.774", 10),
  ("1.771", 10),
  ("1.77", 7),
];

/// Team a player is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Team {
  Red,
  Blue,
  Yellow,
  Purple,
  Observer,
}

impl Team {
  /// Teams that own a roster key in the status reply, in lookup order.
  const ROSTER_KEYS: [(Team, &'static str); 4] = [
    (Team::Red, "pr"),
    (Team::Blue, "pb"),
    (Team::Yellow, "py"),
    (Team::Purple, "pp"),
  ];

  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Red => "red",
      Self::Blue => "blue",
      Self::Yellow => "yellow",
      Self::Purple => "purple",
      Self::Observer => "observer",
    }
  }
}

impl fmt::Display for Team {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.pad(self.as_str())
  }
}

/// Error returned when a team name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTeamError {
  input: String,
}

impl ParseTeamError {
  pub fn input(&self) -> &str {
    &self.input
  }
}

impl fmt::Display for ParseTeamError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "unknown team `{}`", self.input)
  }
}

impl std::error::Error for ParseTeamError {}

impl FromStr for Team {
  type Err = ParseTeamError;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s.trim().to_ascii_uppercase().as_str() {
      "RED" => Ok(Self::Red),
      "BLUE" => Ok(Self::Blue),
      "YELLOW" => Ok(Self::Yellow),
      "PURPLE" => Ok(Self::Purple),
      "OBSERVER" => Ok(Self::Observer),
      _ => Err(ParseTeamError {
        input: s.to_string(),
      }),
    }
  }
}

/// Round-trip time reported for a player, or the state shown instead of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ping {
  Millis(u32),
  /// `CNCT`: still connecting.
  Connecting,
  /// `ZMBI`: disconnected, slot not yet freed.
  Zombie,
  /// Any other non-numeric token.
  Unknown,
}

impl Ping {
  pub fn parse(token: &str) -> Self {
    match token {
      "CNCT" => Self::Connecting,
      "ZMBI" => Self::Zombie,
      other => other.parse().map_or(Self::Unknown, Self::Millis),
    }
  }

  pub fn millis(self) -> Option<u32> {
    match self {
      Self::Millis(ms) => Some(ms),
      _ => None,
    }
  }
}

impl fmt::Display for Ping {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Millis(ms) => f.pad(&ms.to_string()),
      Self::Connecting => f.pad("CNCT"),
      Self::Zombie => f.pad("ZMBI"),
      Self::Unknown => f.pad("?"),
    }
  }
}

/// One row of the public `status` player list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSummary {
  /// Raw name, still carrying markup bytes.
  pub name: String,
  pub score: i32,
  pub ping: Ping,
  pub team: Team,
}

/// Parsed reply to the unauthenticated `status` query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
  info: HashMap<String, String>,
  players: Vec<PlayerSummary>,
}

impl StatusSnapshot {
  /// Parse a `status` reply.
  ///
  /// ```text
  /// \TimeLeft\14:32\pr\!0\mapname\arenaball\_scores\Red:0 Blue:0
  /// 0 204 "JoeJoe"
  /// ```
  pub fn parse(reply: &str) -> Self {
    let mut lines = reply.split('\n');
    let header = lines.next().unwrap_or_default();

    let mut info = HashMap::new();
    let mut tokens = header.split('\\').skip(1);
    while let Some(key) = tokens.next() {
      let value = tokens.next().unwrap_or_default();
      info.insert(key.to_string(), value.trim().to_string());
    }

    let mut players = Vec::new();
    for line in lines {
      let mut fields = line.trim().splitn(3, ' ');
      let (Some(score), Some(ping), Some(name)) =
        (fields.next(), fields.next(), fields.next())
      else {
        continue;
      };
      if name.is_empty() {
        continue;
      }

      let team = team_for_index(&info, players.len());
      players.push(PlayerSummary {
        name: unquote(name).to_string(),
        score: score.parse().unwrap_or_default(),
        ping: Ping::parse(ping),
        team,
      });
    }

    Self { info, players }
  }

  /// All server variables from the header line.
  pub fn info(&self) -> &HashMap<String, String> {
    &self.info
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.info.get(key).map(String::as_str)
  }

  pub fn players(&self) -> &[PlayerSummary] {
    &self.players
  }

  pub fn server_name(&self) -> Option<&str> {
    self.get("hostname")
  }

  pub fn map(&self) -> Option<&str> {
    self.get("mapname")
  }

  pub fn time_left(&self) -> Option<&str> {
    self.get("TimeLeft")
  }

  pub fn max_clients(&self) -> Option<u32> {
    self.get("maxclients").and_then(|value| value.parse().ok())
  }

  /// Whether the server advertises a join password (`needpass`).
  pub fn needs_password(&self) -> bool {
    self
      .get("needpass")
      .and_then(|value| value.parse::<i32>().ok())
      .is_some_and(|flag| flag != 0)
  }

  /// Team scores from `_scores`, e.g. `Red:3 Blue:1`.
  pub fn scores(&self) -> BTreeMap<Team, i32> {
    self
      .get("_scores")
      .unwrap_or_default()
      .split_whitespace()
      .filter_map(|entry| {
        let (team, points) = entry.split_once(':')?;
        Some((team.parse().ok()?, points.parse().ok()?))
      })
      .collect()
  }

  /// Protocol build of the server, 0 when it cannot be determined.
  pub fn build(&self) -> u32 {
    if let Some(build) = self.get("version").and_then(trailing_build) {
      return build;
    }

    self
      .get("gameversion")
      .and_then(game_code_version)
      .and_then(|version| {
        KNOWN_BUILDS
          .iter()
          .find(|(known, _)| *known == version)
          .map(|(_, build)| *build)
      })
      .unwrap_or(0)
  }
}

/// Caches the last [`StatusSnapshot`] until the caller asks for a new one.
#[derive(Debug, Default)]
pub struct StatusCache {
  snapshot: Option<StatusSnapshot>,
}

impl StatusCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Query `status` unless a snapshot is cached and `force` is false.
  ///
  /// When a forced refresh fails the previous snapshot stays cached.
  pub async fn refresh(
    &mut self,
    transport: &mut Transport,
    force: bool,
  ) -> Result<&StatusSnapshot> {
    let snapshot = match self.snapshot.take() {
      Some(cached) if !force => cached,
      previous => match transport.request("status", None).await {
        Ok(reply) => {
          let snapshot = StatusSnapshot::parse(&reply);
          tracing::debug!(
            variables = snapshot.info.len(),
            players = snapshot.players.len(),
            "status cache refreshed"
          );
          snapshot
        }
        Err(err) => {
          self.snapshot = previous;
          return Err(err);
        }
      },
    };

    Ok(self.snapshot.insert(snapshot))
  }

  /// The cached snapshot, without touching the network.
  pub fn current(&self) -> Option<&StatusSnapshot> {
    self.snapshot.as_ref()
  }

  pub fn invalidate(&mut self) {
    self.snapshot = None;
  }
}

fn team_for_index(info: &HashMap<String, String>, index: usize) -> Team {
  let index = index.to_string();
  Team::ROSTER_KEYS
    .iter()
    .find(|(_, key)| {
      info
        .get(*key)
        .is_some_and(|list| list.split('!').any(|slot| slot == index))
    })
    .map_or(Team::Observer, |(team, _)| *team)
}

fn unquote(name: &str) -> &str {
  name
    .strip_prefix('"')
    .and_then(|inner| inner.strip_suffix('"'))
    .unwrap_or(name)
}

/// `... (18)` at the end of the version string.
fn trailing_build(version: &str) -> Option<u32> {
  let inner = version.trim().strip_suffix(')')?;
  let (_, digits) = inner.rsplit_once('(')?;
  if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  digits.parse().ok()
}

/// First `v<digits and dots>` run in the game version string.
fn game_code_version(gameversion: &str) -> Option<&str> {
  gameversion.match_indices('v').find_map(|(at, _)| {
    let rest = &gameversion[at + 1..];
    let len = rest
      .find(|c: char| !(c.is_ascii_digit() || c == '.'))
      .unwrap_or(rest.len());
    (len > 0).then(|| &rest[..len])
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLE: &str = "\\TimeLeft\\14:32\\pr\\!0\\mapname\\arenaball\\_scores\\Red:0 Blue:0\n0 204 \"JoeJoe\"";

  fn with_info(pairs: &[(&str, &str)]) -> StatusSnapshot {
    let header: String = pairs
      .iter()
      .map(|(key, value)| format!("\\{key}\\{value}"))
      .collect();
    StatusSnapshot::parse(&header)
  }

  #[test]
  fn parses_sample_reply() {
    let snapshot = StatusSnapshot::parse(SAMPLE);

    assert_eq!(snapshot.map(), Some("arenaball"));
    assert_eq!(snapshot.time_left(), Some("14:32"));
    assert_eq!(
      snapshot.scores(),
      BTreeMap::from([(Team::Red, 0), (Team::Blue, 0)])
    );
    assert_eq!(
      snapshot.players(),
      [PlayerSummary {
        name: "JoeJoe".to_string(),
        score: 0,
        ping: Ping::Millis(204),
        team: Team::Red,
      }]
    );
  }

  #[test]
  fn header_values_are_trimmed_and_dangling_key_kept() {
    let snapshot = StatusSnapshot::parse("\\hostname\\ My Server \\dangling");
    assert_eq!(snapshot.server_name(), Some("My Server"));
    assert_eq!(snapshot.get("dangling"), Some(""));
  }

  #[test]
  fn team_assignment_follows_roster_lists() {
    let reply = "\\pr\\0!2!\\pb\\1!\n\
                 1 50 \"a\"\n\
                 2 50 \"b\"\n\
                 3 50 \"c\"\n\
                 4 50 \"d\"\n";
    let teams: Vec<Team> = StatusSnapshot::parse(reply)
      .players()
      .iter()
      .map(|player| player.team)
      .collect();

    assert_eq!(teams, [Team::Red, Team::Blue, Team::Red, Team::Observer]);
  }

  #[test]
  fn red_takes_precedence_over_later_teams() {
    let snapshot = StatusSnapshot::parse("\\pb\\!0\\pr\\!0\n0 0 \"x\"");
    assert_eq!(snapshot.players()[0].team, Team::Red);
  }

  #[test]
  fn short_rows_are_skipped_without_consuming_an_index() {
    let reply = "\\pb\\!1\n\n5 10\n1 20 \"first\"\n2 30 \"second\"";
    let players = StatusSnapshot::parse(reply).players().to_vec();

    assert_eq!(players.len(), 2);
    assert_eq!(players[0].team, Team::Observer);
    assert_eq!(players[1].name, "second");
    assert_eq!(players[1].team, Team::Blue);
  }

  #[test]
  fn names_keep_spaces_inside_quotes() {
    let snapshot = StatusSnapshot::parse("\\x\\y\n-3 CNCT \"Big Joe\"");
    let player = &snapshot.players()[0];
    assert_eq!(player.name, "Big Joe");
    assert_eq!(player.score, -3);
    assert_eq!(player.ping, Ping::Connecting);
  }

  #[test]
  fn build_prefers_version_suffix() {
    let snapshot = with_info(&[
      ("version", "DPPB2 v1.0 (18) "),
      ("gameversion", "DPPB2 v1.83"),
    ]);
    assert_eq!(snapshot.build(), 18);
  }

  #[test]
  fn build_falls_back_to_game_code_table() {
    let snapshot = with_info(&[("version", "q2 3.20"), ("gameversion", "DPPB2 v1.83 Linux")]);
    assert_eq!(snapshot.build(), 16);

    let snapshot = with_info(&[("gameversion", "v1.901")]);
    assert_eq!(snapshot.build(), 18);
  }

  #[test]
  fn build_is_zero_when_unknown() {
    assert_eq!(with_info(&[("gameversion", "v9.99")]).build(), 0);
    assert_eq!(with_info(&[("version", "custom ()")]).build(), 0);
    assert_eq!(StatusSnapshot::default().build(), 0);
  }

  #[test]
  fn scores_cover_all_teams_and_skip_garbage() {
    let snapshot = with_info(&[(
      "_scores",
      "Red:3 BLUE:1 yellow:-2 Purple:7 Green:4 junk",
    )]);
    assert_eq!(
      snapshot.scores(),
      BTreeMap::from([
        (Team::Red, 3),
        (Team::Blue, 1),
        (Team::Yellow, -2),
        (Team::Purple, 7),
      ])
    );
  }

  #[test]
  fn password_flag_and_max_clients() {
    let snapshot = with_info(&[("needpass", "1"), ("maxclients", "16")]);
    assert!(snapshot.needs_password());
    assert_eq!(snapshot.max_clients(), Some(16));
    assert!(!StatusSnapshot::default().needs_password());
  }

  #[test]
  fn ping_tokens() {
    assert_eq!(Ping::parse("75"), Ping::Millis(75));
    assert_eq!(Ping::parse("ZMBI"), Ping::Zombie);
    assert_eq!(Ping::parse("???"), Ping::Unknown);
    assert_eq!(Ping::Millis(75).millis(), Some(75));
    assert_eq!(Ping::Connecting.millis(), None);
  }

  #[test]
  fn team_names_parse_case_insensitively() {
    assert_eq!("ReD".parse::<Team>(), Ok(Team::Red));
    let err = "green".parse::<Team>().unwrap_err();
    assert_eq!(err.input(), "green");
    assert_eq!(err.to_string(), "unknown team `green`");
  }
}
