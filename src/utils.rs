// Small helpers shared across modules

use uuid::Uuid;

/// Resolve an asset path returned by the API into a full URL.
///
/// Absolute URLs pass through, relative paths are joined onto the API
/// origin, and an empty path stays empty.
pub fn resolve_asset_url(base_url: &str, path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }

    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Short id used to correlate log lines of one client call
pub fn request_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}
