use tracing_subscriber::EnvFilter;

/// Install the `tracing` subscriber for the dpquery binary.
///
/// `verbosity` comes from the CLI `-v/--verbose` flag:
///   * `0` → WARN for dependencies, INFO for dpquery
///   * `1` → DEBUG (every datagram sent, RCON password redacted)
///   * `2+` → TRACE (received datagram sizes and latency)
///
/// `RUST_LOG` overrides the computed filter.
pub fn init(verbosity: u8, use_color: bool) {
  let level = match verbosity {
    0 => tracing::Level::INFO,
    1 => tracing::Level::DEBUG,
    _ => tracing::Level::TRACE,
  };

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    EnvFilter::new(format!("warn,dpquery={}", level.as_str().to_lowercase()))
  });

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .with_level(true)
    .with_ansi(use_color)
    .compact()
    .init();
}
