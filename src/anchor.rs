pub const HREF_PLACEHOLDER: &str = "href=\"\\ref\"";
pub const XLINK_PLACEHOLDER: &str = "xlink:href=\"\\ref\"";

/// Cheap containment test that gates a whole patch pass. When this is false
/// the file must be left untouched.
pub fn has_bare_refs(content: &str) -> bool {
    content.contains(HREF_PLACEHOLDER) || content.contains(XLINK_PLACEHOLDER)
}

/// Byte offsets delimiting one anchor element: `tag_start..=tag_end` is the
/// opening tag including its closing `>`, `close_start` is where `</a>`
/// begins. Invariant: `tag_start <= tag_end < close_start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorSpan {
    pub tag_start: usize,
    pub tag_end: usize,
    pub close_start: usize,
}

impl AnchorSpan {
    pub fn opening_tag<'a>(&self, buffer: &'a str) -> &'a str {
        &buffer[self.tag_start..=self.tag_end]
    }

    pub fn inner<'a>(&self, buffer: &'a str) -> &'a str {
        &buffer[self.tag_end + 1..self.close_start]
    }
}

/// Position of the leftmost placeholder at or after `from`, either spelling.
/// The plain spelling is checked first, which also decides an exact tie.
pub fn next_placeholder(buffer: &str, from: usize) -> Option<usize> {
    let tail = &buffer[from..];
    let href = tail.find(HREF_PLACEHOLDER);
    let xlink = tail.find(XLINK_PLACEHOLDER);
    let pos = match (href, xlink) {
        (Some(h), Some(x)) => h.min(x),
        (Some(h), None) => h,
        (None, Some(x)) => x,
        (None, None) => return None,
    };
    Some(from + pos)
}

/// Delimits the anchor element enclosing the placeholder at `ref_pos` using
/// plain substring search: the nearest `<a` before the placeholder, the
/// nearest `</a>` after it, and the opening tag's `>` between them.
///
/// Assumes anchors do not nest, which holds for the SVG PlantUML emits.
pub fn enclosing_anchor(buffer: &str, ref_pos: usize) -> Option<AnchorSpan> {
    let tag_start = buffer[..ref_pos].rfind("<a")?;
    let close_start = buffer[ref_pos..].find("</a>").map(|i| ref_pos + i)?;
    let tag_end = buffer[tag_start..].find('>').map(|i| tag_start + i)?;
    if tag_end >= close_start {
        // The supposed opening tag runs past the close; malformed.
        return None;
    }
    Some(AnchorSpan {
        tag_start,
        tag_end,
        close_start,
    })
}
