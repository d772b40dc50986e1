//! Fetching source text from a web page.
//!
//! Reduces a URL to plain text for the extraction backends: script, style
//! and chrome blocks are dropped, remaining tags stripped, whitespace
//! collapsed. OCR and clipboard capture stay outside this crate; anything
//! that produces text feeds the same pipeline.

use std::time::Duration;

use tracing::info;

use crate::ExtractionError;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/91.0.4472.124 Safari/537.36";
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Elements whose entire content is noise for place extraction.
const SKIP_BLOCKS: &[&str] = &["script", "style", "header", "footer", "nav"];

/// Download a page and return its visible text.
pub async fn fetch_text(url: &str) -> Result<String, ExtractionError> {
    let url = if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    };

    let client = reqwest::Client::new();
    let resp = client
        .get(&url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .timeout(FETCH_TIMEOUT)
        .send()
        .await
        .map_err(|e| ExtractionError::Fetch {
            url: url.clone(),
            reason: e.to_string(),
        })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(ExtractionError::Fetch {
            url,
            reason: format!("status {status}"),
        });
    }

    let html = resp.text().await.map_err(|e| ExtractionError::Fetch {
        url: url.clone(),
        reason: e.to_string(),
    })?;

    let text = strip_html(&html);
    info!(url = %url, chars = text.len(), "fetched source text");
    Ok(text)
}

/// Reduce an HTML document to its visible text.
pub fn strip_html(html: &str) -> String {
    let mut cleaned = html.to_string();
    for tag in SKIP_BLOCKS {
        cleaned = remove_blocks(&cleaned, tag);
    }
    let text = strip_tags(&cleaned);
    collapse_whitespace(&decode_entities(&text))
}

/// Remove every `<tag ...>...</tag>` block, case-insensitively.
fn remove_blocks(html: &str, tag: &str) -> String {
    // ASCII-only lowering keeps byte offsets aligned with the original.
    let mut lower = html.to_string();
    lower.make_ascii_lowercase();
    let open = format!("<{tag}");
    let close = format!("</{tag}>");

    let mut out = String::with_capacity(html.len());
    let mut pos = 0;
    while let Some(rel) = lower[pos..].find(&open) {
        let start = pos + rel;
        out.push_str(&html[pos..start]);
        match lower[start..].find(&close) {
            Some(rel_end) => pos = start + rel_end + close.len(),
            None => {
                // Unclosed block: drop the rest of the document.
                return out;
            }
        }
    }
    out.push_str(&html[pos..]);
    out
}

/// Drop tags, inserting a space so adjacent text nodes stay separated.
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                out.push(' ');
            }
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_collapses_whitespace() {
        let html = "<html><body><p>We   visited\n<b>Paris</b>.</p></body></html>";
        assert_eq!(strip_html(html), "We visited Paris .");
    }

    #[test]
    fn drops_script_and_style_blocks() {
        let html = "<script>var x = 'Lisbon';</script><p>Porto</p><style>.a{}</style>";
        assert_eq!(strip_html(html), "Porto");
    }

    #[test]
    fn drops_nav_header_footer() {
        let html = "<header>Menu</header><nav>Links</nav><p>Rome</p><footer>About</footer>";
        assert_eq!(strip_html(html), "Rome");
    }

    #[test]
    fn case_insensitive_block_removal() {
        let html = "<SCRIPT>x</SCRIPT><p>Madrid</p>";
        assert_eq!(strip_html(html), "Madrid");
    }

    #[test]
    fn unclosed_block_drops_remainder() {
        let html = "<p>Berlin</p><script>never closed";
        assert_eq!(strip_html(html), "Berlin");
    }

    #[test]
    fn decodes_common_entities() {
        let html = "<p>Fish &amp; Chips &#39;pub&#39;</p>";
        assert_eq!(strip_html(html), "Fish & Chips 'pub'");
    }
}
