use std::borrow::Cow;

/// Configuration errors raised while declaring and compiling the route table.
///
/// All of them are fatal: they are meant to stop process startup before any
/// request is served.
#[warren_derive::warren_error]
pub enum DeclarationError {
    /// Two sibling collections share a name.
    #[error("Collection already registered{}: {message}", format_context(.context))]
    DuplicateCollection { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Two operations of one collection share a name.
    #[error("Operation already registered{}: {message}", format_context(.context))]
    DuplicateOperation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// An operation declares the same parameter twice.
    #[error("Parameter already declared{}: {message}", format_context(.context))]
    DuplicateParameter { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A control body was attached to a collection instead of an operation.
    #[error("Control outside of operation{}: {message}", format_context(.context))]
    ControlOutsideOperation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A feature was declared without the collection it extends, or re-targeted.
    #[error("Invalid feature target{}: {message}", format_context(.context))]
    FeatureTarget { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Two bindings resolve to the same method and path.
    #[error("Route conflict{}: {message}", format_context(.context))]
    RouteConflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A synthesized path repeats a parameter name.
    #[error("Ambiguous path{}: {message}", format_context(.context))]
    AmbiguousPath { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected compiler faults.
    #[error("Internal declaration error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
