//! Loading proxy endpoint lists.

use crate::error::Error;

use url::Url;

/// Fetch and parse a list of proxy endpoints from a URL or file path.
pub async fn fetch_endpoints(source: &str) -> Result<Vec<Url>, Error> {
    let content = if source.starts_with("http") {
        let client = reqwest::Client::new();
        client.get(source).send().await?.text().await?
    } else {
        std::fs::read_to_string(source)?
    };
    Ok(parse_endpoint_list(&content))
}

/// Parse proxy endpoints out of a text listing, one per line.
///
/// Lines already carrying a scheme are taken as-is; bare `IP:PORT` lines
/// are treated as SOCKS5 entries. Comments, blanks and unparseable lines
/// are skipped.
pub fn parse_endpoint_list(content: &str) -> Vec<Url> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            if line.contains("://") {
                Url::parse(line).ok()
            } else if line.contains(':') {
                Url::parse(&format!("socks5://{}", line)).ok()
            } else {
                None
            }
        })
        .collect()
}
