use bitflags::bitflags;

/// Segment and endpoint names of the auxiliary bindings.
pub const HEAD: &str = "head";
pub const OPTIONS: &str = "options";
pub const DOCS: &str = "docs";
pub const INDEX: &str = "index";
/// Segment under a collection document holding its operation documents.
pub const OPERATIONS: &str = "operations";

bitflags! {
    /// Auxiliary bindings generated next to every collection and operation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AuxRoutes: u8 {
        /// `HEAD` answering 200 with an empty body.
        const HEAD = 1 << 0;
        /// `OPTIONS` advertising methods or accepted parameters.
        const OPTIONS = 1 << 1;
        /// Per-collection and per-operation documentation documents.
        const DOCS = 1 << 2;
        /// The documentation entrypoint listing top-level collections.
        const INDEX = 1 << 3;

        const ALL = Self::HEAD.bits() | Self::OPTIONS.bits() | Self::DOCS.bits() | Self::INDEX.bits();
    }
}
