use std::collections::HashMap;

use owo_colors::OwoColorize;
use tokio::io::{self, AsyncWriteExt, Stdout};

use crate::client::Reachability;
use crate::markup;
use crate::query::{ExtendedPlayerRecord, MapRotationEntry};
use crate::status::{PlayerSummary, StatusSnapshot, Team};

/// Render the interactive prompt prefix to the provided stdout handle.
pub async fn render_prompt(
  stdout: &mut Stdout,
  use_color: bool,
) -> io::Result<()> {
  let prompt = if use_color {
    format!("{} ", "rcon>".bright_magenta().bold())
  } else {
    "rcon> ".to_owned()
  };

  stdout.write_all(prompt.as_bytes()).await?;
  stdout.flush().await
}

/// Print a console reply line by line.
pub fn render_reply(command: &str, reply: &str, use_color: bool) {
  if use_color {
    println!("{} {}", "⇢".bright_cyan(), command.bold());
  } else {
    println!("> {command}");
  }

  for line in reply.lines() {
    if use_color {
      println!("  {}", line.cyan());
    } else {
      println!("  {line}");
    }
  }

  println!();
}

/// Server name, map, time left, scores and players.
pub fn render_status(snapshot: &StatusSnapshot, use_color: bool) {
  let name = markup::clean(snapshot.server_name().unwrap_or("(unnamed)"));
  if use_color {
    println!("{}", name.bold());
  } else {
    println!("{name}");
  }

  let fields = [
    ("map", snapshot.map().map(str::to_owned)),
    ("time left", snapshot.time_left().map(str::to_owned)),
    ("build", Some(snapshot.build().to_string())),
    ("max clients", snapshot.max_clients().map(|n| n.to_string())),
    (
      "password",
      Some(if snapshot.needs_password() { "yes" } else { "no" }.to_owned()),
    ),
  ];
  for (label, value) in fields {
    let value = value.unwrap_or_else(|| "-".to_owned());
    if use_color {
      println!("  {:<12} {}", label.dimmed(), value);
    } else {
      println!("  {label:<12} {value}");
    }
  }

  let scores = snapshot.scores();
  if !scores.is_empty() {
    let line: Vec<String> = scores
      .iter()
      .map(|(team, points)| paint_team(*team, &format!("{team}: {points}"), use_color))
      .collect();
    println!("  {:<12} {}", "scores", line.join("  "));
  }

  println!();
  render_players(snapshot.players(), use_color);
}

pub fn render_players(players: &[PlayerSummary], use_color: bool) {
  if players.is_empty() {
    println!("nobody");
    return;
  }

  println!("{:<9} {:>5} {:>5}  name", "team", "score", "ping");
  for player in players {
    println!(
      "{} {:>5} {:>5}  {}",
      paint_team(player.team, &format!("{:<9}", player.team), use_color),
      player.score,
      player.ping,
      markup::clean(&player.name)
    );
  }
}

pub fn render_extended_players(
  players: &[ExtendedPlayerRecord],
  use_color: bool,
) {
  if players.is_empty() {
    println!("nobody");
    return;
  }

  println!(
    "{:>3} {:<9} {:>5} {:>5} {:>7} {:<21} {:>5}  name",
    "id", "team", "score", "ping", "idle", "address", "qport"
  );
  for player in players {
    let team = player
      .team
      .map_or_else(|| format!("{:<9}", "-"), |team| format!("{team:<9}"));
    let team = match player.team {
      Some(t) => paint_team(t, &team, use_color),
      None => team,
    };
    println!(
      "{:>3} {} {:>5} {:>5} {:>7} {:<21} {:>5}  {}",
      player.client_id,
      team,
      player.score,
      player.ping,
      player.idle,
      format!("{}:{}", player.ip, player.port),
      player.qport,
      markup::clean(&player.name)
    );
  }
}

pub fn render_maps(maps: &[MapRotationEntry], use_color: bool) {
  for entry in maps {
    let origin = if entry.user_added { "voted" } else { "rotation" };
    if use_color {
      println!("{:>4}  {}  {}", entry.points, entry.map.bold(), origin.dimmed());
    } else {
      println!("{:>4}  {}  {}", entry.points, entry.map, origin);
    }
  }
}

/// One item per line, or a placeholder when empty.
pub fn render_list(items: &[String], empty: &str) {
  if items.is_empty() {
    println!("{empty}");
  }
  for item in items {
    println!("{}", markup::clean(item));
  }
}

pub fn render_pairs(pairs: &HashMap<String, String>) {
  let mut sorted: Vec<_> = pairs.iter().collect();
  sorted.sort();
  for (key, value) in sorted {
    println!("{key:<16} {value}");
  }
}

pub fn render_reachability(reachability: Reachability, use_color: bool) {
  let (label, detail) = match reachability {
    Reachability::Online => ("online", "Digital Paint server answered"),
    Reachability::Offline => ("offline", "no reply"),
    Reachability::Unrecognized => ("unknown", "something answered, but not a Digital Paint server"),
  };

  if !use_color {
    println!("{label}: {detail}");
    return;
  }
  match reachability {
    Reachability::Online => println!("{} {}", label.green().bold(), detail),
    Reachability::Offline => println!("{} {}", label.red().bold(), detail),
    Reachability::Unrecognized => println!("{} {}", label.yellow().bold(), detail),
  }
}

/// `✔`/`✖` line for yes/no outcomes.
pub fn render_outcome(label: &str, ok: bool, use_color: bool) {
  match (ok, use_color) {
    (true, true) => println!("{} {label}", "✔".green().bold()),
    (false, true) => println!("{} {label}", "✖".red().bold()),
    (true, false) => println!("yes {label}"),
    (false, false) => println!("no {label}"),
  }
}

fn paint_team(team: Team, text: &str, use_color: bool) -> String {
  if !use_color {
    return text.to_owned();
  }
  match team {
    Team::Red => text.red().to_string(),
    Team::Blue => text.blue().to_string(),
    Team::Yellow => text.yellow().to_string(),
    Team::Purple => text.magenta().to_string(),
    Team::Observer => text.dimmed().to_string(),
  }
}
