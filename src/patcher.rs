use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::anchor::{self, AnchorSpan, HREF_PLACEHOLDER, XLINK_PLACEHOLDER};
use crate::caption;
use crate::config::PatchConfig;
use crate::resolver::{RefResolver, build_ref_url};

// Plain spelling first; replacing it also rewrites the tail of the namespaced
// one, so a tag carrying both ends up with both attributes rewritten.
const PLACEHOLDER_ATTRS: [(&str, &str); 2] =
    [("href", HREF_PLACEHOLDER), ("xlink:href", XLINK_PLACEHOLDER)];

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("problem opening {path} for patching: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("problem opening {path} for writing: {source}")]
    Write { path: PathBuf, source: io::Error },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchStats {
    pub resolved: usize,
    pub unresolved: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// Neither placeholder spelling occurs in the file; nothing was written.
    Untouched,
    Patched(PatchStats),
}

/// Rewrites bare `\ref` placeholder links in one PlantUML-generated SVG file.
///
/// PlantUML emits `href="\ref"` (and `xlink:href="\ref"`) without the
/// reference name; the name only survives as the caption text inside the
/// anchor. The patcher recovers it, resolves it through the injected
/// resolver, and rewrites each anchor's opening tag in place. Unresolvable
/// references become inert `href="#"` links with an `onclick` handler that
/// notifies the hosting page.
pub struct SvgPatcher<'a> {
    svg_file: PathBuf,
    rel_path: String,
    context: String,
    resolver: &'a dyn RefResolver,
    config: PatchConfig,
}

impl<'a> SvgPatcher<'a> {
    pub fn new(
        svg_file: impl Into<PathBuf>,
        rel_path: impl Into<String>,
        context: impl Into<String>,
        resolver: &'a dyn RefResolver,
        config: PatchConfig,
    ) -> Self {
        Self {
            svg_file: svg_file.into(),
            rel_path: rel_path.into(),
            context: context.into(),
            resolver,
            config,
        }
    }

    pub fn run(&self) -> Result<PatchOutcome, PatchError> {
        let content = fs::read_to_string(&self.svg_file).map_err(|source| PatchError::Read {
            path: self.svg_file.clone(),
            source,
        })?;

        if !anchor::has_bare_refs(&content) {
            return Ok(PatchOutcome::Untouched);
        }

        let (patched, stats) = self.patch_content(&content);
        fs::write(&self.svg_file, patched).map_err(|source| PatchError::Write {
            path: self.svg_file.clone(),
            source,
        })?;
        Ok(PatchOutcome::Patched(stats))
    }

    /// Patches every placeholder anchor in `content`, returning the new
    /// buffer and per-occurrence counts.
    ///
    /// The buffer changes length as anchors are rewritten, so the scan
    /// threads an explicit cursor: each iteration either rewrites one anchor
    /// and resumes just past the new tag, or skips one occurrence by moving a
    /// single byte past its start. Either way the cursor advances, which
    /// bounds the loop by the buffer length.
    pub fn patch_content(&self, content: &str) -> (String, PatchStats) {
        let mut buffer = content.to_string();
        let mut stats = PatchStats::default();
        let mut cursor = 0;

        while let Some(ref_pos) = anchor::next_placeholder(&buffer, cursor) {
            let Some(span) = anchor::enclosing_anchor(&buffer, ref_pos) else {
                cursor = ref_pos + 1;
                stats.skipped += 1;
                continue;
            };

            let opening_tag = span.opening_tag(&buffer);
            // The placeholder text can also appear inside the anchor's
            // content rather than its tag; rewriting the tag would then never
            // consume the occurrence.
            if !PLACEHOLDER_ATTRS
                .iter()
                .any(|(_, needle)| opening_tag.contains(needle))
            {
                cursor = ref_pos + 1;
                stats.skipped += 1;
                continue;
            }

            let Some(name) = caption::ref_name(span.inner(&buffer)) else {
                cursor = ref_pos + 1;
                stats.skipped += 1;
                continue;
            };

            let url = self
                .resolver
                .resolve(&name, &self.context)
                .and_then(|target| build_ref_url(&target, &self.rel_path, &self.config));
            match url {
                Some(_) => stats.resolved += 1,
                None => stats.unresolved += 1,
            }

            let new_tag = rewrite_opening_tag(opening_tag, url.as_deref(), &name);
            cursor = span.tag_start + new_tag.len();
            buffer = splice_opening_tag(&buffer, span, &new_tag);
        }

        (buffer, stats)
    }
}

/// Produces the rewritten opening tag. `url` present selects the resolved
/// branch; `None` selects the inert-link fallback with its notification
/// hook. Only the attributes actually present in the tag are touched.
fn rewrite_opening_tag(tag: &str, url: Option<&str>, name: &str) -> String {
    let mut out = tag.to_string();
    match url {
        Some(url) => {
            for (attr, needle) in PLACEHOLDER_ATTRS {
                if out.contains(needle) {
                    out = out.replace(needle, &format!("{attr}=\"{url}\""));
                }
            }
        }
        None => {
            for (attr, needle) in PLACEHOLDER_ATTRS {
                if out.contains(needle) {
                    out = out.replace(needle, &format!("{attr}=\"#\""));
                }
            }
            let handler = format!(
                "window.parent.postMessage({{type:'unresolved-ref',name:'{}'}},'*');return false;",
                escape_js_single_quoted(name)
            );
            if let Some(pos) = out.rfind('>') {
                out.insert_str(pos, &format!(" onclick=\"{handler}\""));
            }
        }
    }
    out
}

// Backslashes first, then quotes; the reverse order would re-escape the
// backslashes just inserted.
fn escape_js_single_quoted(name: &str) -> String {
    name.replace('\\', "\\\\").replace('\'', "\\'")
}

fn splice_opening_tag(buffer: &str, span: AnchorSpan, new_tag: &str) -> String {
    let mut out = String::with_capacity(buffer.len() + new_tag.len());
    out.push_str(&buffer[..span.tag_start]);
    out.push_str(new_tag);
    out.push_str(&buffer[span.tag_end + 1..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{RefTarget, TableResolver};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    struct NoneResolver;

    impl RefResolver for NoneResolver {
        fn resolve(&self, _name: &str, _context: &str) -> Option<RefTarget> {
            None
        }
    }

    fn file_target(file: &str) -> RefTarget {
        RefTarget {
            file: Some(file.to_string()),
            anchor: None,
            external: false,
        }
    }

    fn table(entries: &[(&str, RefTarget)]) -> TableResolver {
        let refs: HashMap<String, RefTarget> = entries
            .iter()
            .map(|(name, target)| (name.to_string(), target.clone()))
            .collect();
        TableResolver::new(refs)
    }

    fn patcher<'a>(resolver: &'a dyn RefResolver) -> SvgPatcher<'a> {
        SvgPatcher::new("diagram.svg", "", "", resolver, PatchConfig::default())
    }

    #[test]
    fn resolved_round_trip() {
        let resolver = table(&[("foo", file_target("foo.html"))]);
        let input = "<a href=\"\\ref\"><text>foo</text></a>";
        let (output, stats) = patcher(&resolver).patch_content(input);
        assert_eq!(output, "<a href=\"foo.html\"><text>foo</text></a>");
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.unresolved, 0);
    }

    #[test]
    fn unresolved_fallback() {
        let input = "<a href=\"\\ref\"><text>foo</text></a>";
        let (output, stats) = patcher(&NoneResolver).patch_content(input);
        assert_eq!(
            output,
            "<a href=\"#\" onclick=\"window.parent.postMessage({type:'unresolved-ref',name:'foo'},'*');return false;\"><text>foo</text></a>"
        );
        assert_eq!(stats.unresolved, 1);
    }

    #[test]
    fn escaping_order_backslash_then_quote() {
        let input = "<a href=\"\\ref\"><text>a\\b'c</text></a>";
        let (output, _) = patcher(&NoneResolver).patch_content(input);
        assert!(output.contains("name:'a\\\\b\\'c'"), "got: {output}");
    }

    #[test]
    fn both_attributes_rewritten_when_resolved() {
        let resolver = table(&[("foo", file_target("foo"))]);
        let input = "<a href=\"\\ref\" target=\"_top\" xlink:href=\"\\ref\"><text>foo</text></a>";
        let (output, stats) = patcher(&resolver).patch_content(input);
        assert_eq!(
            output,
            "<a href=\"foo.html\" target=\"_top\" xlink:href=\"foo.html\"><text>foo</text></a>"
        );
        assert_eq!(stats.resolved, 1);
    }

    #[test]
    fn both_attributes_share_one_onclick_when_unresolved() {
        let input = "<a href=\"\\ref\" xlink:href=\"\\ref\"><text>foo</text></a>";
        let (output, _) = patcher(&NoneResolver).patch_content(input);
        assert_eq!(
            output,
            "<a href=\"#\" xlink:href=\"#\" onclick=\"window.parent.postMessage({type:'unresolved-ref',name:'foo'},'*');return false;\"><text>foo</text></a>"
        );
        assert_eq!(output.matches("onclick").count(), 1);
    }

    #[test]
    fn namespaced_only_tag_is_rewritten() {
        let resolver = table(&[("foo", file_target("foo"))]);
        let input = "<a xlink:href=\"\\ref\"><text>foo</text></a>";
        let (output, _) = patcher(&resolver).patch_content(input);
        assert_eq!(output, "<a xlink:href=\"foo.html\"><text>foo</text></a>");
    }

    #[test]
    fn anchor_without_close_tag_is_left_alone() {
        let resolver = table(&[("good", file_target("good"))]);
        let input = "<a href=\"\\ref\"><text>good</text></a><a href=\"\\ref\"><text>bad</text>";
        let (output, stats) = patcher(&resolver).patch_content(input);
        assert_eq!(
            output,
            "<a href=\"good.html\"><text>good</text></a><a href=\"\\ref\"><text>bad</text>"
        );
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn anchor_without_caption_is_left_alone() {
        let input = "<a href=\"\\ref\"><rect x=\"1\"/></a>";
        let (output, stats) = patcher(&NoneResolver).patch_content(input);
        assert_eq!(output, input);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.unresolved, 0);
    }

    #[test]
    fn placeholder_in_caption_text_terminates() {
        // The placeholder occurs as visible text, not as a tag attribute; the
        // scan must step over it instead of rewriting the enclosing tag
        // forever.
        let input = "<a href=\"x.html\"><text>href=\"\\ref\"</text></a>";
        let (output, stats) = patcher(&NoneResolver).patch_content(input);
        assert_eq!(output, input);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn multiple_anchors_mixed_outcomes() {
        let resolver = table(&[
            ("First", file_target("classFirst")),
            ("Third", file_target("classThird")),
        ]);
        let input = concat!(
            "<svg><g>",
            "<a href=\"\\ref\" xlink:href=\"\\ref\"><text>First</text></a>",
            "<rect width=\"10\"/>",
            "<a xlink:href=\"\\ref\"><text>Second</text></a>",
            "<a href=\"\\ref\"><text>Third</text></a>",
            "</g></svg>"
        );
        let (output, stats) = patcher(&resolver).patch_content(input);
        assert_eq!(
            output,
            concat!(
                "<svg><g>",
                "<a href=\"classFirst.html\" xlink:href=\"classFirst.html\"><text>First</text></a>",
                "<rect width=\"10\"/>",
                "<a xlink:href=\"#\" onclick=\"window.parent.postMessage({type:'unresolved-ref',name:'Second'},'*');return false;\"><text>Second</text></a>",
                "<a href=\"classThird.html\"><text>Third</text></a>",
                "</g></svg>"
            )
        );
        assert_eq!(stats.resolved, 2);
        assert_eq!(stats.unresolved, 1);
        assert_eq!(stats.skipped, 0);
        assert!(!anchor::has_bare_refs(&output));
    }

    #[test]
    fn buffer_without_placeholders_is_unchanged() {
        let input = "<svg><a href=\"real.html\"><text>real</text></a></svg>";
        let (output, stats) = patcher(&NoneResolver).patch_content(input);
        assert_eq!(output, input);
        assert_eq!(stats, PatchStats::default());
    }

    #[test]
    fn rel_path_and_context_flow_into_urls() {
        let refs = table(&[("ns::item", file_target("nsitem"))]);
        let svg_patcher =
            SvgPatcher::new("diagram.svg", "../", "ns", &refs, PatchConfig::default());
        let input = "<a href=\"\\ref\"><text>item</text></a>";
        let (output, _) = svg_patcher.patch_content(input);
        assert_eq!(output, "<a href=\"../nsitem.html\"><text>item</text></a>");
    }
}
