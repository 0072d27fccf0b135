#![forbid(unsafe_code)]

//! Shared environment constants used across scenarist crates (library, driver,
//! and test helpers).

/// Environment variable naming the snapshot cache directory.
///
/// # Examples
///
/// ```
/// use scenario_env::CACHE_DIR_ENV;
/// assert_eq!(CACHE_DIR_ENV, "SCENARIO_CACHE_DIR");
/// ```
pub const CACHE_DIR_ENV: &str = "SCENARIO_CACHE_DIR";

/// Environment variable overriding the snapshot lock timeout, in seconds.
pub const LOCK_TIMEOUT_ENV: &str = "SCENARIO_LOCK_TIMEOUT";

/// Cache directory used when neither the CLI nor the environment names one.
pub const DEFAULT_CACHE_DIR: &str = ".scenario-cache";

/// Lock timeout in seconds used when neither the CLI nor the environment sets
/// one.
pub const DEFAULT_LOCK_TIMEOUT_SECS: &str = "30";
