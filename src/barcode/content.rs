fn has_web_scheme(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Loose check used to offer an "open" action for a scanned value.
pub fn is_url(value: &str) -> bool {
    has_web_scheme(value) || value.contains('.')
}

/// URL to open for a scanned value; bare hosts get an https scheme.
pub fn open_url(value: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    if has_web_scheme(value) {
        Some(value.to_string())
    } else {
        Some(format!("https://{}", value))
    }
}
