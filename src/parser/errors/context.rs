//! Parse context tracking for context-aware error messages

/// Where in the file structure the parser currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseContext {
    /// At the top level of a file
    TopLevel,
    /// Inside an interface body
    InterfaceBody,
    /// Inside a struct or union body
    CompoundBody,
    /// Inside an enum body
    EnumBody,
    /// Parsing a method argument or result list
    ParameterList,
    /// Parsing an annotation
    Annotation,
    /// Parsing a type
    Type,
}

impl ParseContext {
    /// Human-readable description for error messages
    pub fn description(&self) -> &'static str {
        match self {
            Self::TopLevel => "at top level",
            Self::InterfaceBody => "in interface body",
            Self::CompoundBody => "in struct body",
            Self::EnumBody => "in enum body",
            Self::ParameterList => "in parameter list",
            Self::Annotation => "in annotation",
            Self::Type => "in type",
        }
    }

    /// What the parser expected in this context
    pub fn expected_description(&self) -> &'static str {
        match self {
            Self::TopLevel => "a type declaration or 'interface'",
            Self::InterfaceBody => "a method or nested type declaration",
            Self::CompoundBody => "a field or nested type declaration",
            Self::EnumBody => "an enumerator",
            Self::ParameterList => "a typed parameter",
            Self::Annotation => "an annotation parameter",
            Self::Type => "a type name",
        }
    }
}
