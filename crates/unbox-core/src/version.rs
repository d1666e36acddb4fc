//! Version comparison for CLI and box compatibility

use semver::Version;

/// Compare the CLI version against the minimum version a box declares
/// Returns a warning message if the CLI is older than the box expects
pub fn check_compatibility(cli_version: &str, box_version: &str) -> Option<String> {
    let cli_ver = Version::parse(cli_version).ok()?;

    let cleaned = box_version.strip_prefix('v').unwrap_or(box_version);
    let box_ver = Version::parse(cleaned).ok()?;

    if cli_ver < box_ver {
        Some(format!(
            "This box was designed for unbox {} or newer.\n\
             You are running version {}.\n\
             Consider updating: cargo install unbox-cli --force",
            box_version, cli_version
        ))
    } else {
        None
    }
}
