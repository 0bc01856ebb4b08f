//! Build metadata embedded by `build.rs` via vergen.

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git branch at build time, or "unknown" outside a checkout.
pub const GIT_BRANCH: &str = match option_env!("VERGEN_GIT_BRANCH") {
    Some(branch) => branch,
    None => "unknown",
};

/// Git commit SHA at build time, or "unknown" outside a checkout.
pub const GIT_SHA: &str = match option_env!("VERGEN_GIT_SHA") {
    Some(sha) => sha,
    None => "unknown",
};

/// Whether the working tree was dirty at build time.
pub fn git_dirty() -> bool {
    option_env!("VERGEN_GIT_DIRTY") == Some("true")
}

/// Version string logged by mimird at start-up:
/// `{version}+{branch}.{sha7}`, with `.dirty` appended for dirty trees.
pub fn version_string() -> String {
    let sha: String = GIT_SHA.chars().take(7).collect();
    let dirty_suffix = if git_dirty() { ".dirty" } else { "" };
    format!("{PKG_VERSION}+{GIT_BRANCH}.{sha}{dirty_suffix}")
}
