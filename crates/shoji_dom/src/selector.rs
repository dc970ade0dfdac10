//! Selector parsing and matching
//!
//! Supports the subset the widgets query with:
//!
//! - Type and universal selectors (`button`, `*`)
//! - `#id`, `.class`
//! - Attribute presence and equality (`[open]`, `[aria-selected="true"]`)
//! - The descendant combinator (`ui-tabs-trigger button`)
//! - Selector lists (`a, b`)

use std::str::FromStr;

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{all_consuming, map, opt},
    error::{Error as NomError, ErrorKind},
    multi::{many0, separated_list1},
    sequence::{delimited, preceded, tuple},
    IResult,
};

use crate::document::Document;
use crate::error::{DomError, Result};
use crate::node::NodeId;

/// Single condition inside a compound selector
#[derive(Debug, Clone, PartialEq, Eq)]
enum Simple {
    Id(String),
    Class(String),
    Attribute { name: String, value: Option<String> },
}

/// Tag plus conditions, e.g. `button[aria-selected="true"]`
#[derive(Debug, Clone, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    conditions: Vec<Simple>,
}

/// Compounds joined by descendant combinators
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
}

/// Parsed selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Complex>,
}

// ============================================================================
// Parser
// ============================================================================

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn ident(input: &str) -> IResult<&str, &str> {
    take_while1(is_ident_char)(input)
}

fn quoted(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
        delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
    ))(input)
}

fn attribute(input: &str) -> IResult<&str, Simple> {
    map(
        delimited(
            char('['),
            tuple((
                delimited(multispace0, ident, multispace0),
                opt(preceded(
                    char('='),
                    delimited(multispace0, alt((quoted, ident)), multispace0),
                )),
            )),
            char(']'),
        ),
        |(name, value)| Simple::Attribute {
            name: name.to_ascii_lowercase(),
            value: value.map(str::to_string),
        },
    )(input)
}

fn simple(input: &str) -> IResult<&str, Simple> {
    alt((
        map(preceded(char('#'), ident), |id| Simple::Id(id.to_string())),
        map(preceded(char('.'), ident), |class| {
            Simple::Class(class.to_string())
        }),
        attribute,
    ))(input)
}

fn compound(input: &str) -> IResult<&str, Compound> {
    let (input, tag) = opt(alt((
        map(char('*'), |_| None),
        map(ident, |tag: &str| Some(tag.to_ascii_lowercase())),
    )))(input)?;
    let (input, conditions) = many0(simple)(input)?;

    if tag.is_none() && conditions.is_empty() {
        return Err(nom::Err::Error(NomError::new(input, ErrorKind::Verify)));
    }
    Ok((
        input,
        Compound {
            tag: tag.flatten(),
            conditions,
        },
    ))
}

fn complex(input: &str) -> IResult<&str, Complex> {
    map(separated_list1(multispace1, compound), |compounds| Complex {
        compounds,
    })(input)
}

fn selector_list(input: &str) -> IResult<&str, Vec<Complex>> {
    all_consuming(delimited(
        multispace0,
        separated_list1(delimited(multispace0, char(','), multispace0), complex),
        multispace0,
    ))(input)
}

impl Selector {
    pub fn parse(text: &str) -> Result<Self> {
        selector_list(text)
            .map(|(_, alternatives)| Self { alternatives })
            .map_err(|_| DomError::InvalidSelector(text.to_string()))
    }

    /// Whether `node` matches any alternative
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.alternatives
            .iter()
            .any(|complex| complex.matches(doc, node))
    }
}

impl FromStr for Selector {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// ============================================================================
// Matching
// ============================================================================

impl Compound {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(tag) = doc.tag(node) else {
            return false;
        };
        if tag.starts_with('#') {
            return false;
        }
        if self.tag.as_ref().is_some_and(|expected| *expected != tag) {
            return false;
        }

        self.conditions.iter().all(|condition| match condition {
            Simple::Id(id) => doc.get_attribute(node, "id").as_deref() == Some(id.as_str()),
            Simple::Class(class) => doc
                .get_attribute(node, "class")
                .is_some_and(|classes| classes.split_whitespace().any(|c| c == class)),
            Simple::Attribute { name, value } => match (doc.get_attribute(node, name), value) {
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == *expected,
                (None, _) => false,
            },
        })
    }
}

impl Complex {
    /// Right-to-left match; nearest matching ancestor is enough for descendant-only chains
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some((last, rest)) = self.compounds.split_last() else {
            return false;
        };
        if !last.matches(doc, node) {
            return false;
        }

        let mut current = doc.parent(node);
        for compound in rest.iter().rev() {
            loop {
                let Some(candidate) = current else {
                    return false;
                };
                current = doc.parent(candidate);
                if compound.matches(doc, candidate) {
                    break;
                }
            }
        }
        true
    }
}

// ============================================================================
// Queries
// ============================================================================

impl Document {
    /// First descendant of `scope` matching `selector`, in tree order
    pub fn query_selector(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|node| selector.matches(self, *node))
    }

    /// All descendants of `scope` matching `selector`, in tree order
    pub fn query_selector_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|node| selector.matches(self, *node))
            .collect()
    }

    /// Matching descendants of `scope` that are not inside a nested `boundary`
    ///
    /// A `boundary` element itself may match, but nothing below it is
    /// visited. This keeps a widget from claiming parts of a nested widget of
    /// the same kind.
    pub fn query_scoped(&self, scope: NodeId, selector: &Selector, boundary: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            if selector.matches(self, node) {
                out.push(node);
            }
            if !self.has_tag(node, boundary) {
                stack.extend(self.children(node).into_iter().rev());
            }
        }
        out
    }

    /// First result of [`Document::query_scoped`]
    pub fn query_scoped_first(
        &self,
        scope: NodeId,
        selector: &Selector,
        boundary: &str,
    ) -> Option<NodeId> {
        self.query_scoped(scope, selector, boundary).into_iter().next()
    }

    /// Document-wide lookup from selector text, body included
    pub fn query_document(&self, text: &str) -> Result<Option<NodeId>> {
        let selector = Selector::parse(text)?;
        let body = self.body();
        if selector.matches(self, body) {
            return Ok(Some(body));
        }
        Ok(self.query_selector(body, &selector))
    }
}
