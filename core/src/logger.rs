use std::env;

use tracing::{debug, level_filters::LevelFilter};
use tracing_subscriber::{
    fmt::format::{Format, Writer},
    EnvFilter,
};

/// Crates that log every statement or request at info and drown the load progress.
const QUIET_TARGETS: &[&str] = &["tokio_postgres=warn", "hyper=warn", "reqwest=warn"];

struct CustomTimer;

impl tracing_subscriber::fmt::time::FormatTime for CustomTimer {
    fn format_time(&self, writer: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Local::now();
        write!(writer, "{} - {}", now.format("%d %B"), now.format("%H:%M:%S%.6f"))
    }
}

fn directive_target(directive: &str) -> &str {
    directive.split(['=', '[']).next().unwrap_or_default().trim()
}

/// Quiet targets come first and are left out when `env_directives` mention the same target, so
/// an operator can still turn them up.
fn build_filter(log_level: LevelFilter, env_directives: Option<&str>) -> EnvFilter {
    let env_directives = env_directives.unwrap_or_default();
    let mentioned: Vec<&str> = env_directives.split(',').map(directive_target).collect();

    let mut directives: Vec<&str> = QUIET_TARGETS
        .iter()
        .copied()
        .filter(|quiet| {
            let target = directive_target(quiet);
            !mentioned.iter().any(|m| *m == target || m.starts_with(&format!("{}::", target)))
        })
        .collect();
    directives.extend(env_directives.split(',').filter(|d| !d.trim().is_empty()));

    EnvFilter::builder().with_default_directive(log_level.into()).parse_lossy(directives.join(","))
}

/// `RUST_LOG` directives refine `log_level`, which is used for anything they do not mention.
pub fn setup_logger(log_level: LevelFilter) {
    let format = Format::default().with_timer(CustomTimer).with_level(true).with_target(false);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(build_filter(log_level, env::var(EnvFilter::DEFAULT_ENV).ok().as_deref()))
        .event_format(format)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        debug!("Logger has already been set up, continuing...");
    }
}

pub fn setup_info_logger() {
    setup_logger(LevelFilter::INFO);
}
