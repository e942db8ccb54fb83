use clap::Parser;
use dpquery::{Cli, Runtime};
use std::{
  env,
  ffi::{OsStr, OsString},
};

const PRIMARY_PREFIX: &str = "DPQUERY_";
const ALIAS_PREFIX: &str = "RCON_";

fn set_env_var(key: &str, value: &OsStr) {
  // SAFETY: runs first thing on the single runtime thread, before anything
  // else reads the environment; key and value come from the environment.
  unsafe {
    env::set_var(key, value);
  }
}

/// Let `RCON_PASSWORD` and friends stand in for the `DPQUERY_` variables
/// (and the other way round) unless both are set.
fn mirror_env_aliases() {
  let snapshot: Vec<(OsString, OsString)> = env::vars_os().collect();

  for (key, value) in snapshot {
    let Some(key_str) = key.to_str() else {
      continue;
    };

    let counterpart = if let Some(suffix) = key_str.strip_prefix(PRIMARY_PREFIX) {
      format!("{ALIAS_PREFIX}{suffix}")
    } else if let Some(suffix) = key_str.strip_prefix(ALIAS_PREFIX) {
      format!("{PRIMARY_PREFIX}{suffix}")
    } else {
      continue;
    };

    if env::var_os(&counterpart).is_none() {
      set_env_var(&counterpart, value.as_os_str());
    }
  }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
  mirror_env_aliases();

  let cli = Cli::parse();
  let exit_code = Runtime::new(cli).execute().await;
  std::process::exit(exit_code);
}
