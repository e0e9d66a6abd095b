//! Rendered document fragments.
//!
//! A [`Fragment`] is the rendered form of a résumé: a tree of elements, text
//! and trusted rich-text HTML ([`Node::Raw`]). It is what the image inliner
//! copies and rewrites and what the exporter serialises into the payload.
//!
//! Image references are addressed by [`ImageSlot`]: the pre-order position
//! of the node holding them, plus the occurrence index for `<img>` tags
//! embedded in raw HTML. Slots are stable across clones of the same tree,
//! which is what lets substitutions be applied independently of the order in
//! which fetches complete.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Elements serialised without a closing tag.
const VOID_ELEMENTS: &[&str] = &["area", "br", "col", "hr", "img", "input", "link", "meta", "wbr"];

/// `<img … src="…">` inside raw rich-text HTML. Group 1 or 2 is the URL.
static RAW_IMG_SRC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*?\ssrc\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

/// A `srcset` attribute, leading whitespace included.
static RAW_SRCSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\ssrcset\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#).unwrap());

/// A node of a rendered fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Plain text; escaped on output.
    Text(String),
    /// Trusted HTML from the rich-text editor; emitted verbatim.
    Raw(String),
}

impl Node {
    pub fn text(s: impl Into<String>) -> Self {
        Node::Text(s.into())
    }

    pub fn raw(s: impl Into<String>) -> Self {
        Node::Raw(s.into())
    }
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}

/// An HTML element.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder-style child append.
    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(nodes);
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }

    fn is_void(&self) -> bool {
        VOID_ELEMENTS
            .iter()
            .any(|v| v.eq_ignore_ascii_case(&self.tag))
    }
}

/// Address of one image reference inside a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageSlot {
    /// Pre-order index of the node holding the reference.
    pub node: usize,
    /// For raw HTML nodes, which `<img>` tag within the node.
    pub occurrence: Option<usize>,
}

/// An image reference found in a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub slot: ImageSlot,
    pub src: String,
}

/// A rendered document fragment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub nodes: Vec<Node>,
}

impl Fragment {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Serialise to HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            write_node(&mut out, node);
        }
        out
    }

    /// Every image reference, in document order.
    pub fn image_refs(&self) -> Vec<ImageRef> {
        let mut refs = Vec::new();
        let mut index = 0;
        for node in &self.nodes {
            collect_images(node, &mut index, &mut refs);
        }
        refs
    }

    /// Replace the `src` of every slot present in `replacements`.
    ///
    /// Slots not in the map keep their original reference.
    pub fn replace_images(&mut self, replacements: &HashMap<ImageSlot, String>) {
        if replacements.is_empty() {
            return;
        }
        let mut index = 0;
        for node in &mut self.nodes {
            rewrite_images(node, &mut index, replacements);
        }
    }
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Text(t) => out.push_str(&escape_text(t)),
        Node::Raw(html) => out.push_str(html),
        Node::Element(e) => {
            out.push('<');
            out.push_str(&e.tag);
            for (k, v) in &e.attrs {
                out.push(' ');
                out.push_str(k);
                out.push_str("=\"");
                out.push_str(&escape_attr(v));
                out.push('"');
            }
            out.push('>');
            if e.is_void() {
                return;
            }
            for child in &e.children {
                write_node(out, child);
            }
            out.push_str("</");
            out.push_str(&e.tag);
            out.push('>');
        }
    }
}

fn collect_images(node: &Node, index: &mut usize, refs: &mut Vec<ImageRef>) {
    let here = *index;
    *index += 1;
    match node {
        Node::Text(_) => {}
        Node::Raw(html) => {
            for (occurrence, caps) in RAW_IMG_SRC.captures_iter(html).enumerate() {
                if let Some(src) = caps.get(1).or_else(|| caps.get(2)) {
                    refs.push(ImageRef {
                        slot: ImageSlot {
                            node: here,
                            occurrence: Some(occurrence),
                        },
                        src: src.as_str().to_string(),
                    });
                }
            }
        }
        Node::Element(e) => {
            if e.tag.eq_ignore_ascii_case("img") {
                if let Some(src) = e.get_attr("src") {
                    refs.push(ImageRef {
                        slot: ImageSlot {
                            node: here,
                            occurrence: None,
                        },
                        src: src.to_string(),
                    });
                }
            }
            for child in &e.children {
                collect_images(child, index, refs);
            }
        }
    }
}

fn rewrite_images(node: &mut Node, index: &mut usize, replacements: &HashMap<ImageSlot, String>) {
    let here = *index;
    *index += 1;
    match node {
        Node::Text(_) => {}
        Node::Raw(html) => {
            let mut rebuilt = String::with_capacity(html.len());
            let mut last = 0;
            for (occurrence, caps) in RAW_IMG_SRC.captures_iter(html).enumerate() {
                let slot = ImageSlot {
                    node: here,
                    occurrence: Some(occurrence),
                };
                let (Some(tag), Some(src), Some(new_src)) = (
                    caps.get(0),
                    caps.get(1).or_else(|| caps.get(2)),
                    replacements.get(&slot),
                ) else {
                    continue;
                };
                // An embedded image must not keep remote candidates.
                let tag_end = html[src.end()..]
                    .find('>')
                    .map_or(html.len(), |i| src.end() + i);
                rebuilt.push_str(&html[last..tag.start()]);
                rebuilt.push_str(&RAW_SRCSET.replace_all(&html[tag.start()..src.start()], ""));
                rebuilt.push_str(new_src);
                rebuilt.push_str(&RAW_SRCSET.replace_all(&html[src.end()..tag_end], ""));
                last = tag_end;
            }
            if last > 0 {
                rebuilt.push_str(&html[last..]);
                *html = rebuilt;
            }
        }
        Node::Element(e) => {
            let slot = ImageSlot {
                node: here,
                occurrence: None,
            };
            if e.tag.eq_ignore_ascii_case("img") {
                if let Some(new_src) = replacements.get(&slot) {
                    e.set_attr("src", new_src.clone());
                    e.remove_attr("srcset");
                }
            }
            for child in &mut e.children {
                rewrite_images(child, index, replacements);
            }
        }
    }
}

/// Escape text content.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a double-quoted attribute value.
pub fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Fragment {
        Fragment::new(vec![Element::new("div")
            .attr("class", "page")
            .child(Element::new("img").attr("src", "https://cdn.example.com/a.png"))
            .child(Node::text("A & B <C>"))
            .child(Node::raw(
                r#"<p>x<img alt="1" src="/b.png"> y <IMG src='c.jpg'></p>"#,
            ))
            .into()])
    }

    #[test]
    fn serialises_elements_text_and_raw() {
        let html = sample().to_html();
        assert!(html.starts_with(r#"<div class="page"><img src="https://cdn.example.com/a.png">"#));
        assert!(html.contains("A &amp; B &lt;C&gt;"));
        assert!(html.contains("<IMG src='c.jpg'>"));
        assert!(html.ends_with("</div>"));
        assert!(!html.contains("</img>"));
    }

    #[test]
    fn attribute_values_are_escaped() {
        let f = Fragment::new(vec![Element::new("a").attr("title", r#"say "hi""#).into()]);
        assert_eq!(f.to_html(), r#"<a title="say &quot;hi&quot;"></a>"#);
    }

    #[test]
    fn finds_images_in_elements_and_raw_html() {
        let refs = sample().image_refs();
        let srcs: Vec<&str> = refs.iter().map(|r| r.src.as_str()).collect();
        assert_eq!(srcs, vec!["https://cdn.example.com/a.png", "/b.png", "c.jpg"]);
        assert_eq!(refs[0].slot.occurrence, None);
        assert_eq!(refs[1].slot, ImageSlot { node: 3, occurrence: Some(0) });
        assert_eq!(refs[2].slot, ImageSlot { node: 3, occurrence: Some(1) });
    }

    #[test]
    fn replaces_only_listed_slots() {
        let mut f = sample();
        let refs = f.image_refs();
        let mut map = HashMap::new();
        map.insert(refs[0].slot, "data:image/png;base64,AAA".to_string());
        map.insert(refs[2].slot, "data:image/jpeg;base64,BBB".to_string());
        f.replace_images(&map);

        let html = f.to_html();
        assert!(html.contains(r#"<img src="data:image/png;base64,AAA">"#));
        assert!(html.contains(r#"src="/b.png""#));
        assert!(html.contains("<IMG src='data:image/jpeg;base64,BBB'>"));
    }

    #[test]
    fn data_src_is_not_mistaken_for_src() {
        let f = Fragment::new(vec![Node::raw(
            r#"<img data-src="lazy.png" src="https://cdn.example.com/real.png">"#,
        )]);
        let refs = f.image_refs();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].src, "https://cdn.example.com/real.png");
    }

    #[test]
    fn replaced_images_drop_srcset() {
        let mut f = Fragment::new(vec![
            Element::new("img")
                .attr("src", "https://cdn.example.com/a.png")
                .attr("srcset", "https://cdn.example.com/a@2x.png 2x")
                .into(),
            Node::raw(
                r#"<p><img srcset="b@2x.png 2x" src="b.png" data-srcset="keep" alt="b"> <img src="c.png" srcset='c@2x.png 2x'></p>"#,
            ),
        ]);
        let map: HashMap<ImageSlot, String> = f
            .image_refs()
            .into_iter()
            .map(|r| (r.slot, "data:image/png;base64,AAA".to_string()))
            .collect();
        assert_eq!(map.len(), 3);
        f.replace_images(&map);

        let html = f.to_html();
        assert!(!html.contains("@2x"), "got: {html}");
        assert!(html.contains(r#"<img src="data:image/png;base64,AAA">"#));
        assert!(html.contains(
            r#"<p><img src="data:image/png;base64,AAA" data-srcset="keep" alt="b"> <img src="data:image/png;base64,AAA"></p>"#
        ));
    }

    #[test]
    fn set_attr_is_case_insensitive() {
        let mut e = Element::new("img").attr("SRC", "a");
        e.set_attr("src", "b");
        assert_eq!(e.attrs.len(), 1);
        assert_eq!(e.get_attr("src"), Some("b"));
    }
}
