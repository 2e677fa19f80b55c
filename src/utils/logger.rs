// Logger initialization

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter for a verbosity level; `RUST_LOG` overrides it.
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "nhanhoc_client=info,nhanhoc=info",
        1 => "nhanhoc_client=debug,nhanhoc=debug",
        _ => "nhanhoc_client=trace,nhanhoc=trace,reqwest=debug",
    }
}

pub fn init_logger(verbosity: u8) {
    // try_init so a second call (tests, embedding) is not fatal
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbosity).into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
