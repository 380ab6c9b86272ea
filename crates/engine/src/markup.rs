//! Lenient markup scanner for bookmark exports.
//!
//! Netscape-format files routinely leave `DT`, `DD`, and `P` unclosed, so a
//! strict XML parser rejects them. This scanner auto-closes those elements
//! and yields a plain element tree for the bookmark builder to walk.

/// Elements that never hold children.
const VOID_ELEMENTS: &[&str] = &["base", "br", "hr", "img", "input", "link", "meta"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Tag name, lowercased.
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    pub fn find_child(&self, name: &str) -> Option<&Element> {
        self.child_elements().find(|el| el.name == name)
    }

    /// Concatenated descendant text, trimmed.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out.trim().to_string()
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(el) => el.collect_text(out),
            }
        }
    }

    /// Every descendant element, depth-first.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        self.collect_descendants(&mut out);
        out
    }

    fn collect_descendants<'a>(&'a self, out: &mut Vec<&'a Element>) {
        for el in self.child_elements() {
            out.push(el);
            el.collect_descendants(out);
        }
    }
}

/// Parse a document into a synthetic `#document` root. Never fails: whatever
/// cannot be understood is skipped.
pub fn parse(input: &str) -> Element {
    Parser::new(input).run()
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    root: Element,
    /// Elements opened but not yet closed, innermost last.
    open: Vec<Element>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            root: Element::new("#document"),
            open: Vec::new(),
        }
    }

    fn run(mut self) -> Element {
        let bytes = self.input.as_bytes();
        while self.pos < bytes.len() {
            if bytes[self.pos] == b'<' {
                self.markup();
            } else {
                self.text();
            }
        }
        // Pop everything left open into the root.
        while !self.open.is_empty() {
            self.pop();
        }
        self.root
    }

    fn text(&mut self) {
        let rest = &self.input[self.pos..];
        let end = rest.find('<').unwrap_or(rest.len());
        let raw = &rest[..end];
        if !raw.trim().is_empty() {
            let decoded = decode_entities(raw);
            self.top().children.push(Node::Text(decoded));
        }
        self.pos += end;
    }

    fn markup(&mut self) {
        let rest = &self.input[self.pos..];
        if rest.starts_with("<!--") {
            self.pos += rest.find("-->").map(|i| i + 3).unwrap_or(rest.len());
            return;
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            self.pos += rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
            return;
        }
        if rest.starts_with("</") {
            self.close_tag();
            return;
        }
        if rest.len() > 1 && rest.as_bytes()[1].is_ascii_alphabetic() {
            self.open_tag();
            return;
        }
        // A lone '<' in text.
        self.top().children.push(Node::Text("<".to_string()));
        self.pos += 1;
    }

    fn close_tag(&mut self) {
        self.pos += 2;
        let name = self.tag_name();
        let rest = &self.input[self.pos..];
        self.pos += rest.find('>').map(|i| i + 1).unwrap_or(rest.len());

        // Ignore a close with no matching open element.
        if !self.open.iter().any(|el| el.name == name) {
            return;
        }
        loop {
            let closed = self.top().name == name;
            self.pop();
            if closed || self.open.is_empty() {
                break;
            }
        }
    }

    fn open_tag(&mut self) {
        self.pos += 1;
        let name = self.tag_name();
        let mut element = Element::new(name.clone());

        loop {
            self.skip_whitespace();
            let rest = self.input[self.pos..].as_bytes();
            match rest.first() {
                None => break,
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(b'/') => {
                    self.pos += 1;
                    if self.input[self.pos..].starts_with('>') {
                        self.pos += 1;
                        self.implicit_close(&element.name);
                        self.top().children.push(Node::Element(element));
                        return;
                    }
                }
                Some(_) => {
                    if let Some(attr) = self.attribute() {
                        element.attrs.push(attr);
                    }
                }
            }
        }

        self.implicit_close(&element.name);
        if VOID_ELEMENTS.contains(&element.name.as_str()) {
            self.top().children.push(Node::Element(element));
        } else {
            self.open.push(element);
        }
    }

    /// Auto-close elements an incoming tag implies the end of. `DT`/`DD`
    /// terminate the previous `DT`/`DD` of the same list; a `P` left open by
    /// the `</DL><p>` idiom is swept up with it. `P` also closes `P`.
    fn implicit_close(&mut self, incoming: &str) {
        match incoming {
            "dt" | "dd" => loop {
                let Some(top) = self.open.last() else {
                    break;
                };
                if top.name == "dt" || top.name == "dd" {
                    self.pop();
                    continue;
                }
                let parent_is_list = self
                    .open
                    .len()
                    .checked_sub(2)
                    .map(|i| self.open[i].name == "dl")
                    .unwrap_or(false);
                if top.name == "p" && !parent_is_list {
                    self.pop();
                    continue;
                }
                break;
            },
            "p" => {
                if self.open.last().is_some_and(|el| el.name == "p") {
                    self.pop();
                }
            }
            _ => {}
        }
    }

    fn attribute(&mut self) -> Option<(String, String)> {
        let start = self.pos;
        while let Some(&b) = self.input[self.pos..].as_bytes().first() {
            if b.is_ascii_whitespace() || b == b'=' || b == b'>' || b == b'/' {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            // Unparseable byte; skip it so the loop makes progress.
            self.pos += 1;
            return None;
        }
        let name = self.input[start..self.pos].to_ascii_lowercase();

        self.skip_whitespace();
        if !self.input[self.pos..].starts_with('=') {
            return Some((name, String::new()));
        }
        self.pos += 1;
        self.skip_whitespace();

        let rest = self.input[self.pos..].as_bytes();
        let value = match rest.first() {
            Some(&quote @ (b'"' | b'\'')) => {
                self.pos += 1;
                let start = self.pos;
                let tail = &self.input[self.pos..];
                let end = tail.find(quote as char).unwrap_or(tail.len());
                self.pos = start + end;
                if self.pos < self.input.len() {
                    self.pos += 1;
                }
                &self.input[start..start + end]
            }
            _ => {
                let start = self.pos;
                while let Some(&b) = self.input[self.pos..].as_bytes().first() {
                    if b.is_ascii_whitespace() || b == b'>' {
                        break;
                    }
                    self.pos += 1;
                }
                &self.input[start..self.pos]
            }
        };
        Some((name, decode_entities(value)))
    }

    fn tag_name(&mut self) -> String {
        let start = self.pos;
        while let Some(&b) = self.input[self.pos..].as_bytes().first() {
            if b.is_ascii_alphanumeric() || b == b'-' || b == b':' {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_ascii_lowercase()
    }

    fn skip_whitespace(&mut self) {
        while self.input[self.pos..]
            .as_bytes()
            .first()
            .is_some_and(|b| b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
    }

    fn top(&mut self) -> &mut Element {
        self.open.last_mut().unwrap_or(&mut self.root)
    }

    fn pop(&mut self) {
        if let Some(element) = self.open.pop() {
            self.top().children.push(Node::Element(element));
        }
    }
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let Some(semi) = rest[..rest.len().min(10)].find(';') else {
            out.push('&');
            rest = &rest[1..];
            continue;
        };
        let entity = &rest[1..semi];
        match decode_entity(entity) {
            Some(ch) => out.push(ch),
            None => out.push_str(&rest[..semi + 1]),
        }
        rest = &rest[semi + 1..];
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = if let Some(hex) = entity.strip_prefix("#x").or(entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse().ok()?
            } else {
                return None;
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_element_with_attrs() {
        let doc = parse(r#"<A HREF="https://x.example" ADD_DATE=123>X</A>"#);
        let anchor = doc.find_child("a").unwrap();
        assert_eq!(anchor.attr("href"), Some("https://x.example"));
        assert_eq!(anchor.attr("add_date"), Some("123"));
        assert_eq!(anchor.text(), "X");
    }

    #[test]
    fn unclosed_dt_holds_nested_list() {
        let doc = parse("<DL><p><DT><H3>F</H3>\n<DL><p><DT><A HREF=\"https://a\">a</A></DL><p></DL>");
        let dl = doc.find_child("dl").unwrap();
        let p = dl.find_child("p").unwrap();
        let dt = p.find_child("dt").unwrap();
        assert!(dt.find_child("h3").is_some());
        // Nested list landed inside the unclosed DT.
        assert!(dt.find_child("dl").is_some());
    }

    #[test]
    fn explicit_dt_close_puts_list_as_sibling() {
        let doc = parse("<DL><p><DT><H3>F</H3></DT><DL><p><DT><A HREF=\"https://a\">a</A></DL></DL>");
        let dl = doc.find_child("dl").unwrap();
        let p = dl.find_child("p").unwrap();
        let names: Vec<&str> = p.child_elements().map(|el| el.name.as_str()).collect();
        assert_eq!(names, vec!["dt", "dl"]);
    }

    #[test]
    fn sibling_dts_do_not_nest() {
        let doc = parse(
            "<DL><p>\
             <DT><A HREF=\"https://a\">a</A>\
             <DT><A HREF=\"https://b\">b</A>\
             </DL>",
        );
        let p = doc.find_child("dl").unwrap().find_child("p").unwrap();
        assert_eq!(p.child_elements().filter(|el| el.name == "dt").count(), 2);
    }

    #[test]
    fn comments_and_doctype_are_skipped() {
        let doc = parse("<!DOCTYPE NETSCAPE-Bookmark-file-1><!-- generated --><DL></DL>");
        assert_eq!(doc.children.len(), 1);
        assert!(doc.find_child("dl").is_some());
    }

    #[test]
    fn entities_decode_in_text_and_attrs() {
        let doc = parse(r#"<A HREF="https://x.example/?a=1&amp;b=2">Q&amp;A &#39;quoted&#39;</A>"#);
        let anchor = doc.find_child("a").unwrap();
        assert_eq!(anchor.attr("href"), Some("https://x.example/?a=1&b=2"));
        assert_eq!(anchor.text(), "Q&A 'quoted'");
    }

    #[test]
    fn stray_close_tags_are_ignored() {
        let doc = parse("</dd><DL><DT><A HREF=\"https://a\">a</A></DL>");
        assert!(doc.find_child("dl").is_some());
    }

    #[test]
    fn trailing_p_after_list_close_does_not_swallow_items() {
        // The Netscape idiom closes every list with `</DL><p>`.
        let doc = parse(
            "<DL><p>\
             <DT><H3>One</H3>\n<DL><p><DT><A HREF=\"https://one\">1</A></DL><p>\
             <DT><H3>Two</H3>\n<DL><p><DT><A HREF=\"https://two\">2</A></DL><p>\
             </DL>",
        );
        let p = doc.find_child("dl").unwrap().find_child("p").unwrap();
        let folders: Vec<String> = p
            .child_elements()
            .filter(|el| el.name == "dt")
            .filter_map(|dt| dt.find_child("h3").map(|h| h.text()))
            .collect();
        assert_eq!(folders, vec!["One".to_string(), "Two".to_string()]);
    }
}
