//! Path queries compiled from parsed selectors.
//!
//! A [`Query`] is a list of XPath-style location steps. It prints as the
//! equivalent XPath expression (handy in debug logs) and is evaluated
//! directly against a `roxmltree` document.

use crate::selector::{AttributeOperator, AttributeSelector, Combinator, SelectorPart};
use roxmltree::{Document, Node, NodeId};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// `//`
    Descendant,
    /// `/`
    Child,
    /// `/following-sibling::`
    FollowingSibling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Index(u64),
    Last,
}

impl Position {
    fn matches(self, position: usize, last: usize) -> bool {
        match self {
            Position::Index(index) => position as u64 == index,
            Position::Last => position == last,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Index(index) => write!(f, "{index}"),
            Position::Last => f.write_str("last()"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Every position test must hold.
    Position(Vec<Position>),
    Name(String),
    Class(String),
    Id(String),
    Attribute(AttributeSelector),
}

impl Predicate {
    fn matches(&self, node: Node<'_, '_>) -> bool {
        match self {
            Predicate::Position(_) => true,
            Predicate::Name(name) => node.tag_name().name() == name,
            Predicate::Class(class) => {
                let padded = format!(" {} ", node.attribute("class").unwrap_or_default());
                padded.contains(&format!(" {class} "))
            }
            Predicate::Id(id) => node.attribute("id") == Some(id.as_str()),
            Predicate::Attribute(attr) => attribute_matches(node, attr),
        }
    }
}

fn attribute_matches(node: Node<'_, '_>, attr: &AttributeSelector) -> bool {
    let actual = node.attribute(attr.key.as_str());
    let Some(operator) = attr.operator else {
        return actual.is_some();
    };
    let expected = attr.value.as_deref().unwrap_or_default();
    // Missing attributes compare as the empty string, except for `=`.
    let text = actual.unwrap_or_default();
    match operator {
        AttributeOperator::Equals => actual == Some(expected),
        AttributeOperator::Prefix => text.starts_with(expected),
        AttributeOperator::Suffix => text.ends_with(expected),
        AttributeOperator::Substring => text.contains(expected),
        AttributeOperator::Includes => format!(" {text} ").contains(&format!(" {expected} ")),
        AttributeOperator::DashMatch => format!("-{text}-").contains(&format!("-{expected}-")),
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Position(positions) => {
                if let [single] = positions.as_slice() {
                    return write!(f, "[{single}]");
                }
                let logic: Vec<String> = positions
                    .iter()
                    .map(|p| format!("position()={p}"))
                    .collect();
                write!(f, "[{}]", logic.join(" and "))
            }
            Predicate::Name(name) => write!(f, "[name()={}]", quote(name)),
            Predicate::Class(class) => {
                write!(f, "[contains(concat(' ',@class,' '), ' {class} ')]")
            }
            Predicate::Id(id) => write!(f, "[@id='{id}']"),
            Predicate::Attribute(attr) => {
                let key = &attr.key;
                let value = attr.value.as_deref().unwrap_or_default();
                match attr.operator {
                    None => write!(f, "[@{key}]"),
                    Some(AttributeOperator::Equals) => write!(f, "[@{key}={}]", quote(value)),
                    Some(AttributeOperator::Prefix) => {
                        write!(f, "[starts-with(@{key}, {})]", quote(value))
                    }
                    Some(AttributeOperator::Suffix) => write!(
                        f,
                        "[substring(@{key}, string-length(@{key}) - {}) = {}]",
                        value.chars().count() as i64 - 1,
                        quote(value)
                    ),
                    Some(AttributeOperator::Substring) => {
                        write!(f, "[contains(@{key}, {})]", quote(value))
                    }
                    Some(AttributeOperator::Includes) => write!(
                        f,
                        "[contains(concat(' ',@{key},' '), {})]",
                        quote(&format!(" {value} "))
                    ),
                    Some(AttributeOperator::DashMatch) => write!(
                        f,
                        "[contains(concat('-',@{key},'-'), {})]",
                        quote(&format!("-{value}-"))
                    ),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub axis: Axis,
    /// `None` is the `*` wildcard.
    pub name: Option<String>,
    pub predicates: Vec<Predicate>,
}

impl Step {
    fn compile(part: &SelectorPart) -> Self {
        let mut pseudo_classes: Vec<&str> = Vec::new();
        for pc in &part.pseudo_classes {
            if !pseudo_classes.contains(&pc.as_str()) {
                pseudo_classes.push(pc.as_str());
            }
        }

        let axis = match part.combinator {
            Some(Combinator::Child) => Axis::Child,
            Some(Combinator::Adjacent) => {
                if !pseudo_classes.contains(&"first-child") {
                    pseudo_classes.push("first-child");
                }
                Axis::FollowingSibling
            }
            Some(Combinator::Siblings) => Axis::FollowingSibling,
            Some(Combinator::Descendant) | None => Axis::Descendant,
        };

        let positions: Vec<Position> = pseudo_classes
            .iter()
            .filter_map(|pc| match *pc {
                "first-child" => Some(Position::Index(1)),
                "last-child" => Some(Position::Last),
                other => nth_child(other).map(Position::Index),
            })
            .collect();

        let element_name = part.name.as_deref().filter(|n| *n != "*");
        let mut predicates = Vec::new();
        let name = if positions.is_empty() {
            element_name.map(str::to_string)
        } else {
            // Positions count every element sibling, so the name test has
            // to come after them.
            predicates.push(Predicate::Position(positions));
            if let Some(name) = element_name {
                predicates.push(Predicate::Name(name.to_string()));
            }
            None
        };

        predicates.extend(part.classes.iter().cloned().map(Predicate::Class));
        predicates.extend(part.ids.iter().cloned().map(Predicate::Id));
        predicates.extend(part.attributes.iter().cloned().map(Predicate::Attribute));

        Self {
            axis,
            name,
            predicates,
        }
    }

    /// Applies the node test and predicates to one candidate list, in the
    /// axis' proximity order.
    fn filter<'a, 'input>(&self, candidates: impl Iterator<Item = Node<'a, 'input>>, out: &mut Vec<Node<'a, 'input>>) {
        let mut nodes: Vec<Node<'a, 'input>> = candidates
            .filter(|n| self.name.as_deref().is_none_or(|name| n.tag_name().name() == name))
            .collect();
        for predicate in &self.predicates {
            nodes = match predicate {
                Predicate::Position(positions) => {
                    let last = nodes.len();
                    nodes
                        .into_iter()
                        .enumerate()
                        .filter(|(i, _)| positions.iter().all(|p| p.matches(i + 1, last)))
                        .map(|(_, n)| n)
                        .collect()
                }
                other => nodes.into_iter().filter(|n| other.matches(*n)).collect(),
            };
        }
        out.extend(nodes);
    }
}

fn nth_child(pseudo_class: &str) -> Option<u64> {
    let digits = pseudo_class.strip_prefix("nth-child(")?.strip_suffix(')')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self.axis {
            Axis::Descendant => "//",
            Axis::Child => "/",
            Axis::FollowingSibling => "/following-sibling::",
        })?;
        f.write_str(self.name.as_deref().unwrap_or("*"))?;
        for predicate in &self.predicates {
            write!(f, "{predicate}")?;
        }
        Ok(())
    }
}

fn element_children<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.is_element())
}

fn following_siblings<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    std::iter::successors(node.next_sibling_element(), |n| n.next_sibling_element())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub steps: Vec<Step>,
}

impl Query {
    pub fn compile(selector: &[SelectorPart]) -> Self {
        Self {
            steps: selector.iter().map(Step::compile).collect(),
        }
    }

    /// Matching elements in document order, each at most once.
    pub fn select<'a, 'input>(&self, doc: &'a Document<'input>) -> Vec<Node<'a, 'input>> {
        let mut context = vec![doc.root()];
        for step in &self.steps {
            let mut next = Vec::new();
            for node in &context {
                match step.axis {
                    Axis::Child => step.filter(element_children(*node), &mut next),
                    Axis::FollowingSibling => step.filter(following_siblings(*node), &mut next),
                    Axis::Descendant => {
                        for parent in node.descendants() {
                            step.filter(element_children(parent), &mut next);
                        }
                    }
                }
            }
            next.sort_by_key(|n| n.id().get_usize());
            next.dedup_by_key(|n| n.id());
            context = next;
            if context.is_empty() {
                break;
            }
        }
        context
    }

    pub fn matches(&self, doc: &Document<'_>, node_id: NodeId) -> bool {
        self.select(doc).iter().any(|n| n.id() == node_id)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::parse_selector;

    fn compile(selector: &str) -> Query {
        Query::compile(&parse_selector(selector).expect("selector"))
    }

    fn widths(doc: &Document<'_>, selector: &str) -> Vec<String> {
        compile(selector)
            .select(doc)
            .iter()
            .filter_map(|n| n.attribute("width").map(str::to_string))
            .collect()
    }

    const SQUARES: &str = r#"<svg>
        <square width="10" chocolate="hi there" />
        <square width="11" abc="def" />
        <square width="12" abc="ghidef" />
        <square width="13" abc="aghidefjkl" />
        <square width="14" abc="agmnohidefjklx" />
        <square width="15" abc="aeo cnj pqr" />
        <square width="16" abc="eij-stu-asd" />
        <square width="17" abc="123x" />
        <square width="18" abc="x123" />
        <square width="19" abc="a 123 b" />
    </svg>"#;

    #[test]
    fn prints_as_xpath() {
        assert_eq!(compile("rect").to_string(), "//rect");
        assert_eq!(compile(".hero > rect").to_string(), "//*[contains(concat(' ',@class,' '), ' hero ')]/rect");
        assert_eq!(compile("rect + rect").to_string(), "//rect/following-sibling::*[1][name()=\"rect\"]");
        assert_eq!(compile("rect ~ rect").to_string(), "//rect/following-sibling::rect");
        assert_eq!(
            compile("rect:first-child:last-child").to_string(),
            "//*[position()=1 and position()=last()][name()=\"rect\"]"
        );
        assert_eq!(compile("#a").to_string(), "//*[@id='a']");
        assert_eq!(compile("*:nth-child(3)").to_string(), "//*[3]");
    }

    #[test]
    fn prints_attribute_operators() {
        assert_eq!(compile("a[b]").to_string(), "//a[@b]");
        assert_eq!(compile("a[b=c]").to_string(), "//a[@b=\"c\"]");
        assert_eq!(compile("a[b^=c]").to_string(), "//a[starts-with(@b, \"c\")]");
        assert_eq!(
            compile("a[b$=cd]").to_string(),
            "//a[substring(@b, string-length(@b) - 1) = \"cd\"]"
        );
        assert_eq!(compile("a[b*=c]").to_string(), "//a[contains(@b, \"c\")]");
        assert_eq!(
            compile("a[b~=c]").to_string(),
            "//a[contains(concat(' ',@b,' '), \" c \")]"
        );
        assert_eq!(
            compile("a[b|=c]").to_string(),
            "//a[contains(concat('-',@b,'-'), \"-c-\")]"
        );
        assert_eq!(compile("a[b='x\"y']").to_string(), "//a[@b=\"x\\\"y\"]");
    }

    #[test]
    fn attribute_operators_select_the_right_elements() {
        let doc = Document::parse(SQUARES).expect("xml");
        assert_eq!(widths(&doc, "square[chocolate]"), ["10"]);
        assert_eq!(widths(&doc, "square[abc=def]"), ["11"]);
        assert_eq!(widths(&doc, "square[abc^=ghi]"), ["12"]);
        assert_eq!(widths(&doc, "square[abc$=jkl]"), ["13"]);
        assert_eq!(widths(&doc, "square[abc*=mno]"), ["14"]);
        assert_eq!(widths(&doc, "square[abc~=pqr]"), ["15"]);
        assert_eq!(widths(&doc, "square[abc|=stu]"), ["16"]);
        assert_eq!(widths(&doc, "[abc^=123]"), ["17"]);
        assert_eq!(widths(&doc, "[abc$=123]"), ["18"]);
        assert_eq!(widths(&doc, "[abc~=123]"), ["19"]);
    }

    #[test]
    fn positions_are_relative_to_element_siblings() {
        let doc = Document::parse(
            r#"<svg><g><circle width="1"/><!-- c --><circle width="2"/>text<circle width="3"/></g><rect width="4"/></svg>"#,
        )
        .expect("xml");
        assert_eq!(widths(&doc, "circle:first-child"), ["1"]);
        assert_eq!(widths(&doc, "circle:nth-child(2)"), ["2"]);
        assert_eq!(widths(&doc, "circle:last-child"), ["3"]);
        assert_eq!(widths(&doc, "g + rect"), ["4"]);
        assert_eq!(widths(&doc, "circle + circle"), ["2", "3"]);
        assert!(widths(&doc, "rect:first-child").is_empty());
    }

    #[test]
    fn sibling_matches_are_reported_once() {
        let doc = Document::parse(
            r#"<g><rect width="1"/><rect width="2"/><rect width="3"/></g>"#,
        )
        .expect("xml");
        assert_eq!(widths(&doc, "rect ~ rect"), ["2", "3"]);
        let query = compile("g > rect");
        let last = doc.descendants().filter(|n| n.has_tag_name("rect")).last().expect("rect");
        assert!(query.matches(&doc, last.id()));
    }
}
