use crate::debug::{DebugLogger, Field};
use crate::query::Query;
use crate::selector::{Specificity, parse_selector, specificity};
use cssparser::{Delimiter, ParseError, Parser, ParserInput, Token};
use lightningcss::declaration::DeclarationBlock;
use lightningcss::properties::Property;
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleAttribute};
use roxmltree::{Document, Node, NodeId};
use std::collections::HashMap;
use std::sync::Arc;

/// One `property: value` pair, as the CSS parser prints it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleDeclaration {
    pub name: String,
    pub value: String,
    pub important: bool,
}

impl StyleDeclaration {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            important: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuleEntry {
    pub selector_text: String,
    pub query: Query,
    pub specificity: Specificity,
    /// Increments per accepted selector; breaks specificity ties.
    pub order: usize,
    pub declarations: Arc<[StyleDeclaration]>,
}

/// Rules gathered from a document's `<style>` elements.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    rules: Vec<RuleEntry>,
    unparsed_selectors: Vec<String>,
    next_order: usize,
}

impl Stylesheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the text of every `<style>` element, one block per element.
    pub fn from_document(doc: &Document<'_>, debug: Option<&DebugLogger>) -> Self {
        let mut sheet = Self::new();
        for node in doc.descendants().filter(|n| n.has_tag_name("style")) {
            sheet.add_block(&style_element_text(node), debug);
        }
        sheet
    }

    /// Parses a block of CSS and appends its rules. Bad rules are skipped;
    /// `@media` contents are treated as if they applied.
    ///
    /// Selectors are handed to [`parse_selector`] as written, so anything it
    /// accepts works even where strict CSS grammar would reject it (for
    /// example `[abc^=123]`). Declarations go through lightningcss.
    pub fn add_block(&mut self, css: &str, debug: Option<&DebugLogger>) {
        if css.trim().is_empty() {
            return;
        }
        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        self.collect_rules(&mut parser, debug);
    }

    fn collect_rules(&mut self, parser: &mut Parser<'_, '_>, debug: Option<&DebugLogger>) {
        loop {
            parser.skip_whitespace();
            let start = parser.position();
            let _ = parser.parse_until_before::<_, (), ()>(
                Delimiter::CurlyBracketBlock | Delimiter::Semicolon,
                |p| consume_all(p),
            );
            let prelude = parser.slice_from(start).trim();
            match parser.next() {
                Ok(Token::CurlyBracketBlock) => {}
                // Statement at-rules such as `@import`.
                Ok(_) => continue,
                Err(_) => break,
            }

            if let Some(at_rule) = prelude.strip_prefix('@') {
                let name = at_rule
                    .split(|c: char| !(c.is_alphanumeric() || c == '-'))
                    .next()
                    .unwrap_or_default();
                if name.eq_ignore_ascii_case("media") {
                    let _ = parser.parse_nested_block::<_, (), ()>(|nested| {
                        self.collect_rules(nested, debug);
                        Ok(())
                    });
                } else {
                    log::debug!("skipping @{name} rule");
                }
                continue;
            }

            let body = parser.parse_nested_block::<_, _, ()>(|nested| {
                let start = nested.position();
                consume_all(nested)?;
                Ok(nested.slice_from(start))
            });
            let Ok(body) = body else {
                continue;
            };
            let declarations: Arc<[StyleDeclaration]> = parse_declaration_block(body).into();
            for selector_text in split_selector_list(prelude) {
                if !selector_text.is_empty() {
                    self.add_rule(selector_text, &declarations, debug);
                }
            }
        }
    }

    fn add_rule(
        &mut self,
        selector_text: &str,
        declarations: &Arc<[StyleDeclaration]>,
        debug: Option<&DebugLogger>,
    ) {
        let Some(selector) = parse_selector(selector_text) else {
            log::debug!("dropping unsupported selector {selector_text:?}");
            if let Some(logger) = debug {
                logger.event(
                    "css.rule",
                    &[("selector", Field::Str(selector_text)), ("parsed", Field::Bool(false))],
                );
                logger.increment("css.selector_unparsed", 1);
            }
            self.unparsed_selectors.push(selector_text.to_string());
            return;
        };

        let entry = RuleEntry {
            selector_text: selector_text.to_string(),
            query: Query::compile(&selector),
            specificity: specificity(&selector),
            order: self.next_order,
            declarations: Arc::clone(declarations),
        };
        self.next_order += 1;

        if let Some(logger) = debug {
            let query = entry.query.to_string();
            let spec = entry.specificity.to_string();
            logger.event(
                "css.rule",
                &[
                    ("selector", Field::Str(selector_text)),
                    ("parsed", Field::Bool(true)),
                    ("query", Field::Str(&query)),
                    ("specificity", Field::Str(&spec)),
                ],
            );
            logger.increment("css.rules", 1);
        }
        self.rules.push(entry);
    }

    /// Rules in cascade order: ascending specificity, then source order.
    pub fn sorted_rules(&self) -> Vec<&RuleEntry> {
        let mut rules: Vec<&RuleEntry> = self.rules.iter().collect();
        rules.sort_by_key(|rule| (rule.specificity, rule.order));
        rules
    }

    pub fn rules(&self) -> &[RuleEntry] {
        &self.rules
    }

    pub fn unparsed_selectors(&self) -> &[String] {
        &self.unparsed_selectors
    }

    /// Runs every rule against `doc` and returns, per matched element, the
    /// concatenated declarations in cascade order. Applying them in sequence
    /// with last-one-wins yields the cascaded value.
    pub fn associate(&self, doc: &Document<'_>) -> ElementStyles {
        let mut styles: HashMap<NodeId, Vec<StyleDeclaration>> = HashMap::new();
        for rule in self.sorted_rules() {
            for node in rule.query.select(doc) {
                styles
                    .entry(node.id())
                    .or_default()
                    .extend(rule.declarations.iter().cloned());
            }
        }
        log::debug!(
            "stylesheet: {} rules, {} styled elements",
            self.rules.len(),
            styles.len()
        );
        ElementStyles { styles }
    }
}

/// Declarations per element, produced by [`Stylesheet::associate`].
#[derive(Debug, Clone, Default)]
pub struct ElementStyles {
    styles: HashMap<NodeId, Vec<StyleDeclaration>>,
}

impl ElementStyles {
    pub fn get(&self, node: NodeId) -> &[StyleDeclaration] {
        self.styles.get(&node).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &[StyleDeclaration])> {
        self.styles.iter().map(|(id, decls)| (*id, decls.as_slice()))
    }
}

/// Text and CDATA content of a `<style>` element, concatenated.
pub fn style_element_text(node: Node<'_, '_>) -> String {
    node.children()
        .filter(|child| child.is_text())
        .filter_map(|child| child.text())
        .collect()
}

fn consume_all<'i>(parser: &mut Parser<'i, '_>) -> Result<(), ParseError<'i, ()>> {
    while parser.next_including_whitespace_and_comments().is_ok() {}
    Ok(())
}

/// Splits a rule prelude on top-level commas. Commas inside quotes,
/// brackets or parentheses stay with their selector.
fn split_selector_list(prelude: &str) -> Vec<&str> {
    let mut input = ParserInput::new(prelude);
    let mut parser = Parser::new(&mut input);
    let mut selectors = Vec::new();
    loop {
        let start = parser.position();
        let _ = parser.parse_until_before::<_, (), ()>(Delimiter::Comma, |p| consume_all(p));
        selectors.push(parser.slice_from(start).trim());
        if parser.next().is_err() {
            break;
        }
    }
    selectors
}

fn parse_declaration_block(body: &str) -> Vec<StyleDeclaration> {
    let options = ParserOptions {
        error_recovery: true,
        ..ParserOptions::default()
    };
    match DeclarationBlock::parse_string(body, options) {
        Ok(block) => declaration_list(&block),
        Err(err) => {
            log::debug!("ignoring unparseable declarations: {err}");
            Vec::new()
        }
    }
}

/// Parses a `style="..."` attribute.
pub fn parse_inline_style(style: &str) -> Vec<StyleDeclaration> {
    match StyleAttribute::parse(style, ParserOptions::default()) {
        Ok(attr) => declaration_list(&attr.declarations),
        Err(err) => {
            log::debug!("ignoring unparseable style attribute: {err}");
            Vec::new()
        }
    }
}

fn declaration_list(block: &DeclarationBlock<'_>) -> Vec<StyleDeclaration> {
    let normal = block.declarations.iter().map(|p| (p, false));
    let important = block.important_declarations.iter().map(|p| (p, true));
    normal
        .chain(important)
        .filter_map(|(property, important)| declaration(property, important))
        .collect()
}

fn declaration(property: &Property<'_>, important: bool) -> Option<StyleDeclaration> {
    let value = property
        .value_to_css_string(PrinterOptions::default())
        .ok()?;
    Some(StyleDeclaration {
        name: property.property_id().name().to_string(),
        value,
        important,
    })
}
