//! Remote URL normalization for repositories created by the workflow.

/// Normalize an operator-supplied remote URL.
///
/// Returns `None` for blank input. Inputs without a scheme get `https://`;
/// http(s) URLs without a `.git` suffix get one appended. SCP-style
/// (`git@host:path`) and other schemes are left untouched.
pub fn normalize_remote_url(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut url = if trimmed.contains("://") || trimmed.starts_with("git@") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let is_http = url.starts_with("http://") || url.starts_with("https://");
    if is_http && !url.ends_with(".git") {
        url = url.trim_end_matches('/').to_string();
        url.push_str(".git");
    }

    Some(url)
}
