//! CSS selector tokenizer.
//!
//! Supports type, universal, class, id, attribute and pseudo-class simple
//! selectors joined by descendant, child (`>`), adjacent (`+`) and general
//! sibling (`~`) combinators. Functional pseudo-class arguments are kept
//! verbatim, e.g. `nth-child(3n+1)`.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    Descendant,
    Child,
    Adjacent,
    Siblings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeOperator {
    /// `=`
    Equals,
    /// `^=`
    Prefix,
    /// `$=`
    Suffix,
    /// `*=`
    Substring,
    /// `~=`
    Includes,
    /// `|=`
    DashMatch,
}

impl AttributeOperator {
    fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "=" => AttributeOperator::Equals,
            "^=" => AttributeOperator::Prefix,
            "$=" => AttributeOperator::Suffix,
            "*=" => AttributeOperator::Substring,
            "~=" => AttributeOperator::Includes,
            "|=" => AttributeOperator::DashMatch,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AttributeOperator::Equals => "=",
            AttributeOperator::Prefix => "^=",
            AttributeOperator::Suffix => "$=",
            AttributeOperator::Substring => "*=",
            AttributeOperator::Includes => "~=",
            AttributeOperator::DashMatch => "|=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    pub key: String,
    pub operator: Option<AttributeOperator>,
    pub value: Option<String>,
}

impl AttributeSelector {
    pub fn exists(key: &str) -> Self {
        Self {
            key: key.to_string(),
            operator: None,
            value: None,
        }
    }

    pub fn new(key: &str, operator: AttributeOperator, value: &str) -> Self {
        Self {
            key: key.to_string(),
            operator: Some(operator),
            value: Some(value.to_string()),
        }
    }
}

/// One compound selector plus the combinator linking it to the previous
/// part. The first part has no combinator unless the selector starts with
/// one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorPart {
    pub combinator: Option<Combinator>,
    pub name: Option<String>,
    pub ids: Vec<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<AttributeSelector>,
    pub pseudo_classes: Vec<String>,
}

/// `(ids, classes + attributes + pseudo-classes, element names)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Specificity(pub u16, pub u16, pub u16);

impl fmt::Display for Specificity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.0, self.1, self.2)
    }
}

impl SelectorPart {
    fn specificity(&self) -> Specificity {
        let name = match self.name.as_deref() {
            Some(name) if name != "*" => 1,
            _ => 0,
        };
        Specificity(
            self.ids.len() as u16,
            (self.classes.len() + self.attributes.len() + self.pseudo_classes.len()) as u16,
            name,
        )
    }
}

pub fn specificity(selector: &[SelectorPart]) -> Specificity {
    selector.iter().fold(Specificity::default(), |acc, part| {
        let s = part.specificity();
        Specificity(acc.0 + s.0, acc.1 + s.1, acc.2 + s.2)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Class,
    Id,
    PseudoClass,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Modifier(Field),
    Identifier(String),
    Combinator(Combinator),
    Attribute {
        key: String,
        operator: Option<String>,
        value: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttributeState {
    PreKey,
    Key,
    PreOperator,
    Operator,
    PreValue,
    Value,
    Quoted(char),
    PostString,
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || ('\u{a0}'..='\u{ffff}').contains(&c)
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '=' | '*' | '~' | '^' | '|' | '$')
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Parses one selector (no commas). Returns `None` for anything malformed:
/// unclosed brackets or parentheses, misplaced `*` or `(`, unknown
/// characters or attribute operators.
pub fn parse_selector(selector: &str) -> Option<Vec<SelectorPart>> {
    let tokens = tokenize(selector)?;

    let mut result = vec![SelectorPart::default()];
    let mut field = None;

    for token in tokens {
        let part = result.last_mut()?;
        match token {
            Token::Modifier(f) => {
                if f == Field::Name && part.name.is_none() {
                    part.name = Some(String::new());
                }
                field = Some(f);
            }
            Token::Identifier(text) => match field? {
                Field::Name => part.name.get_or_insert_with(String::new).push_str(&text),
                Field::Class => part.classes.push(text),
                Field::Id => part.ids.push(text),
                Field::PseudoClass => part.pseudo_classes.push(text),
            },
            Token::Attribute {
                key,
                operator,
                value,
            } => {
                let operator = match operator {
                    Some(op) => Some(AttributeOperator::parse(&op)?),
                    None => None,
                };
                part.attributes.push(AttributeSelector {
                    key,
                    operator,
                    value,
                });
            }
            Token::Combinator(combinator) => {
                result.push(SelectorPart {
                    combinator: Some(combinator),
                    ..SelectorPart::default()
                });
                field = None;
            }
        }
    }

    Some(result)
}

fn tokenize(selector: &str) -> Option<Vec<Token>> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut in_brackets = false;
    let mut attribute: Option<AttributeState> = None;
    let mut escaped = false;

    for c in selector.trim().chars() {
        if in_brackets {
            if let Some(Token::Identifier(name)) = tokens.last_mut() {
                name.push(c);
            }
            if c == ')' {
                in_brackets = false;
            }
            continue;
        }

        if let Some(state) = attribute {
            let Some(Token::Attribute {
                key,
                operator,
                value,
            }) = tokens.last_mut()
            else {
                return None;
            };
            attribute = match state {
                AttributeState::PreKey => {
                    if is_identifier_char(c) {
                        key.push(c);
                        Some(AttributeState::Key)
                    } else if is_blank(c) {
                        Some(state)
                    } else {
                        return None;
                    }
                }
                AttributeState::Key => {
                    if is_identifier_char(c) {
                        key.push(c);
                        Some(state)
                    } else if c == ']' {
                        None
                    } else if is_operator_char(c) {
                        *operator = Some(c.to_string());
                        Some(AttributeState::Operator)
                    } else if is_blank(c) {
                        Some(AttributeState::PreOperator)
                    } else {
                        return None;
                    }
                }
                AttributeState::PreOperator => {
                    if is_operator_char(c) {
                        *operator = Some(c.to_string());
                        Some(AttributeState::Operator)
                    } else if is_blank(c) {
                        Some(state)
                    } else {
                        return None;
                    }
                }
                AttributeState::Operator => {
                    if is_operator_char(c) {
                        operator.get_or_insert_with(String::new).push(c);
                        Some(state)
                    } else if is_blank(c) {
                        Some(AttributeState::PreValue)
                    } else if c == '"' || c == '\'' {
                        *value = Some(String::new());
                        Some(AttributeState::Quoted(c))
                    } else {
                        *value = Some(c.to_string());
                        Some(AttributeState::Value)
                    }
                }
                AttributeState::PreValue => {
                    if c == '"' || c == '\'' {
                        *value = Some(String::new());
                        Some(AttributeState::Quoted(c))
                    } else if is_blank(c) {
                        Some(state)
                    } else {
                        *value = Some(c.to_string());
                        Some(AttributeState::Value)
                    }
                }
                AttributeState::Value => {
                    let text = value.get_or_insert_with(String::new);
                    if c == ']' {
                        text.truncate(text.trim_end().len());
                        None
                    } else {
                        text.push(c);
                        Some(state)
                    }
                }
                AttributeState::Quoted(quote) => {
                    if c == '\\' && !escaped {
                        escaped = true;
                        Some(state)
                    } else if c == quote && !escaped {
                        Some(AttributeState::PostString)
                    } else {
                        escaped = false;
                        value.get_or_insert_with(String::new).push(c);
                        Some(state)
                    }
                }
                AttributeState::PostString => {
                    if c == ']' {
                        None
                    } else if is_blank(c) {
                        Some(state)
                    } else {
                        return None;
                    }
                }
            };
            continue;
        }

        if is_identifier_char(c) {
            if let Some(Token::Identifier(name)) = tokens.last_mut() {
                name.push(c);
                continue;
            }
            if !matches!(tokens.last(), Some(Token::Modifier(_))) {
                tokens.push(Token::Modifier(Field::Name));
            }
            tokens.push(Token::Identifier(c.to_string()));
            continue;
        }

        match c {
            '.' => tokens.push(Token::Modifier(Field::Class)),
            '#' => tokens.push(Token::Modifier(Field::Id)),
            ':' => tokens.push(Token::Modifier(Field::PseudoClass)),
            ' ' | '\t' => {
                if !matches!(tokens.last(), Some(Token::Combinator(_))) {
                    tokens.push(Token::Combinator(Combinator::Descendant));
                }
            }
            '>' | '+' | '~' => {
                if tokens.last() == Some(&Token::Combinator(Combinator::Descendant)) {
                    tokens.pop();
                }
                tokens.push(Token::Combinator(match c {
                    '>' => Combinator::Child,
                    '+' => Combinator::Adjacent,
                    _ => Combinator::Siblings,
                }));
            }
            '*' => {
                if !matches!(tokens.last(), None | Some(Token::Combinator(_))) {
                    return None;
                }
                tokens.push(Token::Modifier(Field::Name));
                tokens.push(Token::Identifier("*".to_string()));
            }
            '(' => {
                let n = tokens.len();
                let after_pseudo = n >= 2
                    && matches!(tokens[n - 2], Token::Modifier(Field::PseudoClass))
                    && matches!(tokens[n - 1], Token::Identifier(_));
                if !after_pseudo {
                    return None;
                }
                if let Some(Token::Identifier(name)) = tokens.last_mut() {
                    name.push('(');
                }
                in_brackets = true;
            }
            '[' => {
                tokens.push(Token::Attribute {
                    key: String::new(),
                    operator: None,
                    value: None,
                });
                attribute = Some(AttributeState::PreKey);
            }
            _ => return None,
        }
    }

    (!in_brackets && attribute.is_none()).then_some(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(combinator: Option<Combinator>) -> SelectorPart {
        SelectorPart {
            combinator,
            ..SelectorPart::default()
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn parses_simple_selectors() {
        assert_eq!(
            parse_selector("div"),
            Some(vec![SelectorPart {
                name: Some("div".into()),
                ..part(None)
            }])
        );
        assert_eq!(
            parse_selector(".c1"),
            Some(vec![SelectorPart {
                classes: strings(&["c1"]),
                ..part(None)
            }])
        );
    }

    #[test]
    fn parses_a_complex_selector() {
        let result =
            parse_selector("div#count .c1.c2 > span.large + div~.other:first-child *:nth-child(3)")
                .expect("selector");
        assert_eq!(
            result,
            vec![
                SelectorPart {
                    name: Some("div".into()),
                    ids: strings(&["count"]),
                    ..part(None)
                },
                SelectorPart {
                    classes: strings(&["c1", "c2"]),
                    ..part(Some(Combinator::Descendant))
                },
                SelectorPart {
                    name: Some("span".into()),
                    classes: strings(&["large"]),
                    ..part(Some(Combinator::Child))
                },
                SelectorPart {
                    name: Some("div".into()),
                    ..part(Some(Combinator::Adjacent))
                },
                SelectorPart {
                    classes: strings(&["other"]),
                    pseudo_classes: strings(&["first-child"]),
                    ..part(Some(Combinator::Siblings))
                },
                SelectorPart {
                    name: Some("*".into()),
                    pseudo_classes: strings(&["nth-child(3)"]),
                    ..part(Some(Combinator::Descendant))
                },
            ]
        );
    }

    #[test]
    fn parses_attributes() {
        let attrs = |s: &str| {
            parse_selector(s)
                .expect("selector")
                .remove(0)
                .attributes
        };
        assert_eq!(attrs("[abc]"), vec![AttributeSelector::exists("abc")]);
        let prefix = vec![AttributeSelector::new("abc", AttributeOperator::Prefix, "123")];
        assert_eq!(
            attrs("[abc=123]"),
            vec![AttributeSelector::new("abc", AttributeOperator::Equals, "123")]
        );
        assert_eq!(attrs("[abc^=123]"), prefix);
        assert_eq!(attrs("[ abc ^= 123 ]"), prefix);
        assert_eq!(attrs("[abc^='123']"), prefix);
        assert_eq!(attrs("[abc^= '123' ]"), prefix);
        assert_eq!(
            attrs("[abc^= '123\\'456' ]"),
            vec![AttributeSelector::new("abc", AttributeOperator::Prefix, "123'456")]
        );
        assert_eq!(
            attrs("[abc^= \"123\\\"456\" ]"),
            vec![AttributeSelector::new("abc", AttributeOperator::Prefix, "123\"456")]
        );
    }

    #[test]
    fn combinators_replace_pending_whitespace() {
        let parts = parse_selector("a  >  b ~c").expect("selector");
        let combinators: Vec<_> = parts.iter().map(|p| p.combinator).collect();
        assert_eq!(
            combinators,
            vec![None, Some(Combinator::Child), Some(Combinator::Siblings)]
        );
    }

    #[test]
    fn rejects_malformed_selectors() {
        for bad in [
            "a[abc",
            "a[abc='x'",
            "a:nth-child(3",
            "a*",
            "a(b)",
            "[abc==x]",
            "[abc x]",
            "[ ]",
            "a, b",
            "a/b",
        ] {
            assert_eq!(parse_selector(bad), None, "{bad}");
        }
    }

    #[test]
    fn computes_specificity() {
        let spec = |s: &str| specificity(&parse_selector(s).expect("selector"));
        assert_eq!(spec("rect"), Specificity(0, 0, 1));
        assert_eq!(spec(".cls"), Specificity(0, 1, 0));
        assert_eq!(spec("*"), Specificity(0, 0, 0));
        assert_eq!(spec("#a rect:first-child[x]"), Specificity(1, 2, 1));
        assert_eq!(
            spec("div#count .c1.c2 > span.large + div~.other:first-child *:nth-child(3)"),
            Specificity(1, 6, 3)
        );
        assert!(spec(".cls") > spec("rect"));
        assert_eq!(spec("#a").to_string(), "(1,0,0)");
    }
}
