use once_cell::sync::Lazy;
use regex::Regex;

static CAPTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<text[^>]*>([^<]+)</text>").unwrap());

/// Extracts the reference name from an anchor's inner content: the trimmed
/// text of the first `<text …>…</text>` element. PlantUML puts the name the
/// diagram author wrote after `\ref` there, as the link's visible caption.
pub fn ref_name(anchor_inner: &str) -> Option<String> {
    let caps = CAPTION_RE.captures(anchor_inner)?;
    let name = caps[1].trim();
    if name.is_empty() {
        return None;
    }
    Some(name.to_string())
}
