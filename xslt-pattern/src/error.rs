use std::fmt;

/// A byte-offset range into the original source string, used so a caller
/// can report "approximate location" per §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Static errors raised while compiling a match pattern (§4.4) or an
/// attribute value template (§4.5). All carry the XTSE0340 code used by
/// the XSLT 3.0 static-error vocabulary for "invalid pattern", except the
/// ones specific to AVT brace balancing which have no pattern code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParserError {
    #[error("XTSE0340: '{source_text}' is not a valid pattern: arithmetic expressions are not allowed")]
    ArithmeticInPattern { source_text: String, span: Span },

    #[error("XTSE0340: '{source_text}' is not a valid pattern: numeric literals are not allowed")]
    NumericLiteralInPattern { source_text: String, span: Span },

    #[error("XTSE0340: '{source_text}' is not a valid pattern: the namespace:: axis is not allowed")]
    NamespaceAxisInPattern { source_text: String, span: Span },

    #[error("XTSE0340: unbalanced delimiter '{delimiter}' in '{source_text}'")]
    UnbalancedDelimiter {
        source_text: String,
        delimiter: char,
        span: Span,
    },

    #[error("XTSE0340: '{source_text}' is not a valid pattern")]
    Malformed { source_text: String, span: Span },

    #[error("XTSE0340: unknown function '{name}' in pattern")]
    IllegalFunctionInPattern { name: String, span: Span },

    #[error("XTSE0340: processing-instruction name '{name}' contains a colon")]
    QualifiedProcessingInstructionName { name: String, span: Span },

    #[error("unmatched '}}' in attribute value template '{source_text}'")]
    UnmatchedBrace { source_text: String, span: Span },

    #[error("embedded expression error: {message}")]
    Expression { message: String, span: Span },
}

impl ParserError {
    /// The XTSE static-error code this error corresponds to, where one
    /// applies (§6, §7).
    pub fn code(&self) -> Option<&'static str> {
        match self {
            ParserError::ArithmeticInPattern { .. }
            | ParserError::NumericLiteralInPattern { .. }
            | ParserError::NamespaceAxisInPattern { .. }
            | ParserError::UnbalancedDelimiter { .. }
            | ParserError::Malformed { .. }
            | ParserError::IllegalFunctionInPattern { .. }
            | ParserError::QualifiedProcessingInstructionName { .. } => Some("XTSE0340"),
            ParserError::UnmatchedBrace { .. } | ParserError::Expression { .. } => None,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ParserError::ArithmeticInPattern { span, .. }
            | ParserError::NumericLiteralInPattern { span, .. }
            | ParserError::NamespaceAxisInPattern { span, .. }
            | ParserError::UnbalancedDelimiter { span, .. }
            | ParserError::Malformed { span, .. }
            | ParserError::IllegalFunctionInPattern { span, .. }
            | ParserError::QualifiedProcessingInstructionName { span, .. }
            | ParserError::UnmatchedBrace { span, .. }
            | ParserError::Expression { span, .. } => *span,
        }
    }
}

/// A dynamic error surfaced while evaluating a predicate (§4.3.1, §7).
///
/// Every predicate-evaluation fault other than `XTDE0640` is swallowed by
/// the pattern matcher and reported as "no match"; this type exists only
/// to carry the one code that must be re-raised, plus enough information
/// for a caller building a general XPath evaluator to report others.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct DynamicError {
    pub code: Option<String>,
    pub message: String,
}

impl DynamicError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    pub fn without_code(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// `true` iff this is the one dynamic predicate error that must
    /// propagate instead of being swallowed (§4.3.1, §6, §7).
    pub fn is_xtde0640(&self) -> bool {
        self.code.as_deref() == Some("XTDE0640")
    }
}
