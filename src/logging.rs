use log::LevelFilter;

/// Initializes `env_logger`.
///
/// `filter` wins over `RUST_LOG`, which wins over the `info` default.
pub fn init_logging(filter: Option<&str>) {
    let mut builder = env_logger::Builder::new();

    match filter.map(str::to_owned).or_else(|| std::env::var("RUST_LOG").ok()) {
        Some(filter) => builder.parse_filters(&filter),
        None => builder.filter_level(LevelFilter::Info),
    };

    // try_init keeps a logger that is already installed
    if builder.try_init().is_ok() {
        log::debug!("logging initialized");
    }
}
