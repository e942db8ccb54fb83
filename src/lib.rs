//! Client for the Digital Paint: Paintball 2 UDP query and remote-console
//! protocol.
//!
//! ```no_run
//! # async fn demo() -> dpquery::Result<()> {
//! use std::time::Duration;
//!
//! let mut client = dpquery::Client::connect("203.0.113.7", 27910, Duration::from_secs(3))
//!   .await?
//!   .with_password("secret");
//!
//! println!("map: {:?}", client.map().await?);
//! for ban in client.bans().await? {
//!   println!("banned: {ban}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod client;
pub mod core;
pub mod error;
pub mod logging;
pub mod markup;
pub mod packet;
pub mod query;
pub mod rcon;
pub mod runtime;
pub mod server_list;
pub mod status;
pub mod transport;
pub mod ui;
pub mod util;

pub use cli::{Cli, Command};
pub use client::{Client, DEFAULT_TIMEOUT, Reachability};
pub use core::run;
pub use error::{Error, Result};
pub use markup::HtmlOptions;
pub use query::{ExtendedPlayerRecord, MapRotationEntry};
pub use rcon::RconSession;
pub use runtime::{Outcome, Runtime};
pub use server_list::ServerList;
pub use status::{Ping, PlayerSummary, StatusCache, StatusSnapshot, Team};
pub use transport::{DEFAULT_PORT, ServerEndpoint, Transport};
pub use util::command;
