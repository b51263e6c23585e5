//! Version and build metadata (commit SHA, build date, rustc version).

/// Full version string: "cctop {version} ({commit} {date}) rustc {rustc_version}".
pub fn version() -> String {
    format!(
        "cctop {} ({} {}) rustc {}",
        package_version(),
        build_commit(),
        build_date(),
        rustc_version()
    )
}

pub fn package_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub fn build_commit() -> &'static str {
    option_env!("CCTOP_COMMIT_SHA").unwrap_or("unknown")
}

pub fn build_date() -> &'static str {
    option_env!("CCTOP_BUILD_DATE").unwrap_or("unknown")
}

pub fn rustc_version() -> &'static str {
    option_env!("CCTOP_RUSTC_VERSION").unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_contains_package_version() {
        assert!(version().contains(package_version()));
    }
}
