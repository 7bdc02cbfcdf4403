//! Author stylesheets – the `<style>` blocks of a document.
//!
//! Supports the selector subset stylesheets coming out of XSLT templates
//! actually use: type, class, id and universal selectors, compound
//! selectors, descendant and child combinators and selector groups. Rules
//! are applied in specificity order, ties broken by source order. Anything
//! else (attribute selectors, pseudo classes, sibling combinators) makes the
//! selector unmatched rather than wrongly matched.
//!
//! `@page` rules feed the page geometry; all other at-rules are skipped.

use crate::dom::ElementNode;

/// `(ids, classes, types)`
pub type Specificity = (u32, u32, u32);

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Compound {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
}

impl Compound {
    fn parse(token: &str) -> Option<Self> {
        if token.is_empty() || token.contains(['[', ':', '+', '~', '(']) {
            return None;
        }
        let mut compound = Compound::default();
        let mut rest = token;
        let head_end = rest.find(['.', '#']).unwrap_or(rest.len());
        let head = &rest[..head_end];
        if head != "*" && !head.is_empty() {
            compound.tag = Some(head.to_ascii_lowercase());
        }
        rest = &rest[head_end..];
        while let Some(marker) = rest.chars().next() {
            let body = &rest[1..];
            let end = body.find(['.', '#']).unwrap_or(body.len());
            let name = &body[..end];
            if name.is_empty() {
                return None;
            }
            match marker {
                '.' => compound.classes.push(name.to_string()),
                _ => compound.id = Some(name.to_string()),
            }
            rest = &body[end..];
        }
        Some(compound)
    }

    fn matches(&self, element: &ElementNode) -> bool {
        if let Some(tag) = &self.tag {
            if element.tag.name() != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.id() != Some(id.as_str()) {
                return false;
            }
        }
        let classes = element.classes();
        self.classes.iter().all(|c| classes.contains(&c.as_str()))
    }

    fn specificity(&self) -> Specificity {
        (
            self.id.is_some() as u32,
            self.classes.len() as u32,
            self.tag.is_some() as u32,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

/// One complex selector, compounds ordered left to right. The combinator
/// stored with a compound links it to the compound before it.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    parts: Vec<(Combinator, Compound)>,
}

impl Selector {
    pub fn parse(source: &str) -> Option<Self> {
        let spaced = source.replace('>', " > ");
        let mut parts = Vec::new();
        let mut combinator = Combinator::Descendant;
        for token in spaced.split_whitespace() {
            if token == ">" {
                if parts.is_empty() {
                    return None;
                }
                combinator = Combinator::Child;
                continue;
            }
            parts.push((combinator, Compound::parse(token)?));
            combinator = Combinator::Descendant;
        }
        if parts.is_empty() || combinator == Combinator::Child {
            return None;
        }
        Some(Self { parts })
    }

    pub fn specificity(&self) -> Specificity {
        self.parts.iter().fold((0, 0, 0), |acc, (_, c)| {
            let s = c.specificity();
            (acc.0 + s.0, acc.1 + s.1, acc.2 + s.2)
        })
    }

    /// Does the selector match `element`, whose ancestors are listed root
    /// first?
    pub fn matches(&self, element: &ElementNode, ancestors: &[&ElementNode]) -> bool {
        let last = self.parts.len() - 1;
        self.parts[last].1.matches(element) && self.matches_before(last, ancestors)
    }

    fn matches_before(&self, index: usize, ancestors: &[&ElementNode]) -> bool {
        if index == 0 {
            return true;
        }
        let (combinator, _) = &self.parts[index];
        let previous = &self.parts[index - 1].1;
        match combinator {
            Combinator::Child => match ancestors.split_last() {
                Some((parent, rest)) => {
                    previous.matches(parent) && self.matches_before(index - 1, rest)
                }
                None => false,
            },
            Combinator::Descendant => {
                let mut rest = ancestors;
                while let Some((candidate, above)) = rest.split_last() {
                    if previous.matches(candidate) && self.matches_before(index - 1, above) {
                        return true;
                    }
                    rest = above;
                }
                false
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub selector: Selector,
    pub specificity: Specificity,
    pub order: usize,
    pub declarations: Vec<(String, String)>,
}

/// Values from `@page` rules.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PageRule {
    /// `(width, height)` in points.
    pub size: Option<(f32, f32)>,
    pub margin: Option<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    rules: Vec<Rule>,
    page: PageRule,
}

impl Stylesheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(css: &str) -> Self {
        let mut sheet = Self::new();
        sheet.add(css);
        sheet
    }

    /// Parse every block in `blocks` into one sheet, in order.
    pub fn from_blocks<S: AsRef<str>>(blocks: &[S]) -> Self {
        let mut sheet = Self::new();
        for block in blocks {
            sheet.add(block.as_ref());
        }
        sheet
    }

    /// Append the rules of `css` after the existing ones.
    pub fn add(&mut self, css: &str) {
        let css = strip_comments(css);
        let mut rest = css.as_str();
        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }
            if rest.starts_with('@') {
                rest = self.at_rule(rest);
                continue;
            }
            let Some(open) = rest.find('{') else {
                break;
            };
            let prelude = &rest[..open];
            let (body, after) = split_block(&rest[open + 1..]);
            let declarations = parse_declarations(body);
            for selector in prelude.split(',').filter_map(|s| Selector::parse(s.trim())) {
                let order = self.rules.len();
                self.rules.push(Rule {
                    specificity: selector.specificity(),
                    selector,
                    order,
                    declarations: declarations.clone(),
                });
            }
            rest = after;
        }
    }

    /// Consume one at-rule from the front of `input`, returning what follows.
    fn at_rule<'a>(&mut self, input: &'a str) -> &'a str {
        let open = input.find('{');
        let semi = input.find(';');
        match (open, semi) {
            (Some(o), Some(s)) if s < o => &input[s + 1..],
            (Some(o), _) => {
                let keyword = input[1..o].trim().to_ascii_lowercase();
                let (body, after) = split_block(&input[o + 1..]);
                if keyword == "page"
                    || keyword.starts_with("page ")
                    || keyword.starts_with("page:")
                {
                    self.page_rule(body);
                }
                after
            }
            (None, Some(s)) => &input[s + 1..],
            (None, None) => "",
        }
    }

    fn page_rule(&mut self, body: &str) {
        for (prop, value) in parse_declarations(body) {
            match prop.as_str() {
                "size" => {
                    if let Some(size) = parse_page_size(&value) {
                        self.page.size = Some(size);
                    }
                }
                "margin" => {
                    if let Some(m) = value.split_whitespace().next().and_then(parse_absolute_length)
                    {
                        self.page.margin = Some(m);
                    }
                }
                _ => {}
            }
        }
    }

    pub fn page(&self) -> PageRule {
        self.page
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Declarations of all rules matching `element`, lowest precedence first.
    pub fn matching_declarations(
        &self,
        element: &ElementNode,
        ancestors: &[&ElementNode],
    ) -> Vec<(&str, &str)> {
        let mut matched: Vec<&Rule> = self
            .rules
            .iter()
            .filter(|r| r.selector.matches(element, ancestors))
            .collect();
        matched.sort_by_key(|r| (r.specificity, r.order));
        matched
            .into_iter()
            .flat_map(|r| r.declarations.iter().map(|(p, v)| (p.as_str(), v.as_str())))
            .collect()
    }
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Split `input` (just after an opening brace) at its matching close brace.
fn split_block(input: &str) -> (&str, &str) {
    let mut depth = 1usize;
    for (i, c) in input.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return (&input[..i], &input[i + 1..]);
                }
            }
            _ => {}
        }
    }
    (input, "")
}

/// Parse `prop: value; ...` into lowercase property names and trimmed values.
/// `!important` is accepted and ignored.
pub fn parse_declarations(body: &str) -> Vec<(String, String)> {
    body.split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim().to_ascii_lowercase();
            let value = value.trim().trim_end_matches("!important").trim();
            if prop.is_empty() || value.is_empty() {
                None
            } else {
                Some((prop, value.to_string()))
            }
        })
        .collect()
}

/// A length in points for units that do not depend on context.
pub fn parse_absolute_length(value: &str) -> Option<f32> {
    let value = value.trim();
    let (number, factor) = if let Some(n) = value.strip_suffix("px") {
        (n, 1.0)
    } else if let Some(n) = value.strip_suffix("pt") {
        (n, 1.0)
    } else if let Some(n) = value.strip_suffix("mm") {
        (n, 72.0 / 25.4)
    } else if let Some(n) = value.strip_suffix("cm") {
        (n, 72.0 / 2.54)
    } else if let Some(n) = value.strip_suffix("in") {
        (n, 72.0)
    } else if value == "0" {
        (value, 1.0)
    } else {
        return None;
    };
    number.trim().parse::<f32>().ok().map(|n| n * factor)
}

fn parse_page_size(value: &str) -> Option<(f32, f32)> {
    let mut size: Option<(f32, f32)> = None;
    let mut landscape = false;
    let mut lengths = Vec::new();
    for token in value.split_whitespace() {
        match token.to_ascii_lowercase().as_str() {
            "a3" => size = Some((841.89, 1190.55)),
            "a4" => size = Some((595.28, 841.89)),
            "a5" => size = Some((419.53, 595.28)),
            "letter" => size = Some((612.0, 792.0)),
            "legal" => size = Some((612.0, 1008.0)),
            "landscape" => landscape = true,
            "portrait" => {}
            other => lengths.push(parse_absolute_length(other)?),
        }
    }
    match lengths.as_slice() {
        [side] => size = Some((*side, *side)),
        [w, h] => size = Some((*w, *h)),
        [] => {}
        _ => return None,
    }
    let (w, h) = size?;
    if landscape && w < h {
        Some((h, w))
    } else {
        Some((w, h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{find_element, parse_html, DomNode, Tag};

    #[test]
    fn specificity_counts_ids_classes_and_types() {
        let sel = |s: &str| Selector::parse(s).unwrap().specificity();
        assert_eq!(sel("p"), (0, 0, 1));
        assert_eq!(sel(".x"), (0, 1, 0));
        assert_eq!(sel("#main"), (1, 0, 0));
        assert_eq!(sel("div#main.a.b > p"), (1, 2, 2));
        assert_eq!(sel("*"), (0, 0, 0));
    }

    #[test]
    fn unsupported_selectors_are_dropped() {
        assert!(Selector::parse("a:hover").is_none());
        assert!(Selector::parse("input[type=text]").is_none());
        assert!(Selector::parse("h1 + p").is_none());
        assert!(Selector::parse("> p").is_none());
        let sheet = Stylesheet::parse("a:hover, p { color: red }");
        assert_eq!(sheet.rules().len(), 1);
    }

    #[test]
    fn combinators_follow_the_ancestor_chain() {
        let dom = parse_html(
            r#"<div id="main"><table class="grid"><tr><td>x</td></tr></table></div>"#,
        );
        let html = match &dom[0] {
            DomNode::Element(e) => e,
            _ => unreachable!(),
        };
        let body = find_element(&dom, &Tag::Body).unwrap();
        let div = find_element(&dom, &Tag::Div).unwrap();
        let table = find_element(&dom, &Tag::Table).unwrap();
        let tbody = find_element(&dom, &Tag::Tbody).unwrap();
        let tr = find_element(&dom, &Tag::Tr).unwrap();
        let td = find_element(&dom, &Tag::Td).unwrap();
        let ancestors = [html, body, div, table, tbody, tr];

        let m = |s: &str| Selector::parse(s).unwrap().matches(td, &ancestors);
        assert!(m("td"));
        assert!(m("#main td"));
        assert!(m("table.grid td"));
        assert!(m("tr > td"));
        assert!(m("tbody > tr > td"));
        assert!(!m("table > td"));
        assert!(!m("table > tr > td"));
        assert!(!m(".other td"));
        assert!(!m("th"));
    }

    #[test]
    fn declarations_come_back_in_cascade_order() {
        let sheet = Stylesheet::parse(
            "/* note */ #x { color: blue } p { color: red; margin: 0 !important } .c { color: green } p { color: black }",
        );
        let dom = parse_html(r#"<p id="x" class="c">t</p>"#);
        let p = find_element(&dom, &Tag::P).unwrap();
        let decls = sheet.matching_declarations(p, &[]);
        let colors: Vec<&str> = decls
            .iter()
            .filter(|(k, _)| *k == "color")
            .map(|(_, v)| *v)
            .collect();
        assert_eq!(colors, vec!["red", "black", "green", "blue"]);
        assert!(decls.contains(&("margin", "0")));
    }

    #[test]
    fn page_rules_set_geometry_and_other_at_rules_are_skipped() {
        let sheet = Stylesheet::parse(
            "@import url(x.css); @page { size: A4 landscape; margin: 2cm } @media print { p { color: red } } td { padding: 2px }",
        );
        let page = sheet.page();
        assert_eq!(page.size, Some((841.89, 595.28)));
        assert!((page.margin.unwrap() - 56.69).abs() < 0.01);
        assert_eq!(sheet.rules().len(), 1);

        let sheet = Stylesheet::parse("@page { size: 8.5in 11in }");
        assert_eq!(sheet.page().size, Some((612.0, 792.0)));
    }
}
