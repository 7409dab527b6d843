use tracing_subscriber::EnvFilter;

/// Log targets enabled by the `-v` flag; everything else stays quiet.
const CRATE_TARGETS: &[&str] = &["lifting_flow", "lifting_trace"];

fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Filter directives for our own targets at the level chosen by `-v`.
fn directives(verbosity: u8) -> String {
    let level = level_for(verbosity);
    CRATE_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber.
///
/// Without `-v` only warnings are shown. One `-v` adds session summaries,
/// two add chain construction and access-pattern progress, and three or more
/// enable per-slot read and compute events. A `RUST_LOG` value replaces this
/// filter entirely. Output goes to stderr; stdout is reserved for the record.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directives(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
