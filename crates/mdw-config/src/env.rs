/// Overrides [`crate::DEFAULT_METADATA_URL`] (useful against a local emulator).
pub const ENV_METADATA_URL: &str = "MDW_METADATA_URL";

/// Load `.env.local` if present (dev convenience).
///
/// Silent if the file does not exist; production injects env vars directly.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
}

/// Metadata base URL from [`ENV_METADATA_URL`]. Blank values are ignored.
pub fn metadata_url_from_env() -> Option<String> {
    std::env::var(ENV_METADATA_URL)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
