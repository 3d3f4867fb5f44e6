//! Compile-time build metadata exposed to the CLI.

/// Semver package version from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// VCS commit hash captured at build time.
pub const GIT_COMMIT: &str = env!("MUNDI_BUILD_GIT_HASH");

/// Version block used by `mundi --version`.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ncommit: ",
    env!("MUNDI_BUILD_GIT_HASH")
);

/// Concise metadata shown in the startup banner.
pub fn startup_metadata_line() -> String {
    format!("v{VERSION} ({GIT_COMMIT})")
}
