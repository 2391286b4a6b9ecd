//! Fixed names and fallbacks that are not exposed via TOML configuration

/// Directory name under the user's config and data directories
pub const APP_DIR: &str = "pkgsig";

pub const CONFIG_FILE: &str = "config.toml";

/// Keyring location when no data directory can be determined
pub const FALLBACK_KEYS_DIR: &str = "/var/lib/pkgsig/keys";

/// Smallest key source worth parsing
pub const MIN_SOURCE_BYTES: usize = 64;

/// Port used for `hkp://` keyserver URLs
pub const HKP_PORT: u16 = 11371;
