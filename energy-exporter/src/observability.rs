use tracing_subscriber::EnvFilter;

pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("energy_exporter=info".parse().unwrap_or_else(|_| "info".parse().unwrap()));

    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}
