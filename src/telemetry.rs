use anyhow::Result;
use anyhow::anyhow;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

/// Used when `RUST_LOG` is unset: our own events at info, teloxide only when
/// something goes wrong.
const DEFAULT_FILTER: &str = "info,teloxide=warn";

pub fn init() -> Result<()> {
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
  fmt()
    .with_env_filter(env_filter)
    .with_target(true)
    .try_init()
    .map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
}
