//! Abstract syntax tree types for YAMLPath expressions.

use regex::Regex;

/// A segment in a YAMLPath expression.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// Root node ($)
    Root,
    /// Current node (@)
    Current,
    /// Named child (.property or ['property'])
    Child(String),
    /// Sequence index ([0], [-1])
    Index(isize),
    /// Wildcard (* or [*]) - all children
    Wildcard,
    /// Recursive descent (..property or ..*), descendants only
    RecursiveDescent(Option<String>),
    /// The current node and all of its descendants, produced by `..[`
    DescendantOrSelf,
    /// Sequence slice ([start:end])
    Slice(Option<isize>, Option<isize>),
    /// Multiple properties (['prop1','prop2'])
    MultiProperty(Vec<String>),
    /// Filter over children ([?(@.key OP value)])
    Filter(Filter),
}

/// A filter predicate evaluated against each child of the current node.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Keys followed from `@` to reach the tested value.
    pub path: Vec<String>,
    /// Comparison applied to the value. `None` tests for existence.
    pub condition: Option<Condition>,
}

/// Comparison part of a filter, e.g. `== 'x'` or `=~ /^S/`.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare(Comparison, Literal),
    Matches(Pattern),
}

/// Comparison operators usable in filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Literal operand of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
    Bool(bool),
    Null,
}

/// Compiled regular expression of a `=~` filter.
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self)
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

/// A complete YAMLPath expression.
#[derive(Debug, Clone, PartialEq)]
pub struct YamlPath {
    /// Segments that make up the path.
    pub segments: Vec<PathSegment>,
}

impl YamlPath {
    /// Creates a new YAMLPath with the given segments.
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }
}
