//! Browser-like request headers. The stats API drops or stalls requests that
//! do not look like they come from its own web front end.

pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36";

pub(crate) fn stats_headers() -> reqwest::header::HeaderMap {
    use reqwest::header::{HeaderMap, HeaderValue};

    let mut headers = HeaderMap::new();
    for (name, value) in [
        ("accept", "application/json, text/plain, */*"),
        ("accept-language", "en-US,en;q=0.9"),
        ("connection", "keep-alive"),
        ("referer", "https://stats.nba.com/"),
        ("origin", "https://stats.nba.com"),
        ("pragma", "no-cache"),
        ("cache-control", "no-cache"),
    ] {
        headers.insert(name, HeaderValue::from_static(value));
    }
    headers
}
