use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum GlpsError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Machine(#[from] MachineError),

    #[error("cannot read '{path}': {reason}")]
    #[diagnostic(code(glps::io))]
    Io { path: String, reason: String },
}

/// Errors raised while lexing, parsing, or evaluating GLPS source.
///
/// All of these abort the parse; no partial configuration is returned.
#[derive(Error, Debug, Diagnostic)]
pub enum ParseError {
    #[error("invalid character 0x{byte:02x}")]
    #[diagnostic(
        code(glps::lexer::invalid_character),
        help("bytes outside the identifier/number/operator set are only allowed inside quoted text")
    )]
    InvalidCharacter {
        byte: u8,
        #[source_code]
        src: NamedSource<String>,
        #[label("this byte is not valid here")]
        span: SourceSpan,
    },

    #[error("unterminated quote")]
    #[diagnostic(
        code(glps::lexer::unterminated_quote),
        help("quoted text must be closed with '\"' before the end of input")
    )]
    UnterminatedQuote {
        #[source_code]
        src: NamedSource<String>,
        #[label("quote opened here")]
        span: SourceSpan,
    },

    #[error("syntax error: expected {expected}")]
    #[diagnostic(code(glps::parser::syntax))]
    Syntax {
        expected: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("unexpected input here")]
        span: SourceSpan,
    },

    #[error("'{name}' referenced before definition")]
    #[diagnostic(
        code(glps::parser::undefined_reference),
        help("GLPS names must be defined by an earlier statement before they can be used")
    )]
    UndefinedReference {
        name: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("not defined at this point")]
        span: SourceSpan,
    },

    #[error("vector element types must be scalar, not type {found}")]
    #[diagnostic(code(glps::eval::vector_element))]
    VectorElementType {
        found: &'static str,
        #[source_code]
        src: NamedSource<String>,
        #[label("this element is not a scalar")]
        span: SourceSpan,
    },

    #[error("cannot apply '{op}' to {left} and {right}")]
    #[diagnostic(
        code(glps::eval::type_mismatch),
        help("arithmetic works on two scalars, or element-wise on two vectors of equal length")
    )]
    TypeMismatch {
        op: char,
        left: &'static str,
        right: &'static str,
        #[source_code]
        src: NamedSource<String>,
        #[label("in this expression")]
        span: SourceSpan,
    },

    #[error("vector operands of '{op}' must have equal length ({left} vs {right})")]
    #[diagnostic(code(glps::eval::vector_length))]
    VectorLength {
        op: char,
        left: usize,
        right: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("in this expression")]
        span: SourceSpan,
    },

    #[error("division results in non-finite value")]
    #[diagnostic(code(glps::eval::non_finite))]
    NonFiniteDivision {
        #[source_code]
        src: NamedSource<String>,
        #[label("this division")]
        span: SourceSpan,
    },

    #[error("no beamlines defined by this file")]
    #[diagnostic(
        code(glps::parser::no_beamlines),
        help("at least one 'name: LINE = (...);' declaration is required")
    )]
    NoBeamlines {
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("unknown function '{name}'")]
    #[diagnostic(
        code(glps::parser::unknown_function),
        help("the only function GLPS supports is parse(\"path\")")
    )]
    UnknownFunction {
        name: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("called here")]
        span: SourceSpan,
    },

    #[error("parse() expects a text path, not {found}")]
    #[diagnostic(code(glps::include::argument))]
    IncludeArgument {
        found: &'static str,
        #[source_code]
        src: NamedSource<String>,
        #[label("this argument")]
        span: SourceSpan,
    },

    #[error("recursive include of '{path}' ({chain})")]
    #[diagnostic(code(glps::include::cycle))]
    IncludeCycle {
        path: String,
        chain: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("includes a file that is already being parsed")]
        span: SourceSpan,
    },

    #[error("cannot read include '{path}': {reason}")]
    #[diagnostic(code(glps::include::io))]
    IncludeIo {
        path: String,
        reason: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("included here")]
        span: SourceSpan,
    },

    #[error("beamline member '{name}' does not name an element or beamline")]
    #[diagnostic(code(glps::parser::invalid_member))]
    InvalidMember {
        name: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("referenced here")]
        span: Option<SourceSpan>,
    },

    #[error("recursive beamline '{name}'")]
    #[diagnostic(
        code(glps::parser::recursive_beamline),
        help("a beamline ends up containing itself through redefinition; expansion would never terminate")
    )]
    RecursiveBeamline {
        name: String,
        #[source_code]
        src: NamedSource<String>,
    },
}

/// Shape violations found when consuming a parsed configuration
/// (by the canonical printer or the machine builder).
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum ConfigError {
    #[error("configuration has no 'elements' entry")]
    #[diagnostic(code(glps::config::missing_elements))]
    MissingElements,

    #[error("'elements' entry must be a config list, not {found}")]
    #[diagnostic(code(glps::config::element_shape))]
    ElementShape { found: &'static str },

    #[error("element {index} has no '{key}' entry")]
    #[diagnostic(
        code(glps::config::incomplete_element),
        help("every element config carries 'name' and 'type' text entries")
    )]
    IncompleteElement { index: usize, key: &'static str },
}

/// Errors from the machine builder's scope resolution.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum MachineError {
    #[error("missing required property '{property}' for element '{element}'")]
    #[diagnostic(
        code(glps::machine::missing_parameter),
        help("the property must come from the element itself or from a global defined before 'elements'")
    )]
    MissingParameter { element: String, property: String },
}
