pub use crate::collection::{Collection, CollectionBuilder, Node};
pub use crate::compiler::{Api, ApiBuilder, Binding, Endpoint};
pub use crate::error::{DeclarationError, DeclarationErrorExt};
pub use crate::feature::{Feature, FeatureBuilder, FeatureRegistry};
pub use crate::hooks::Hooks;
pub use crate::operation::{Gate, Operation, OperationBuilder};
pub use crate::reply::{Control, ControlError, Inputs, Reply};
pub use crate::validator::{ValidationError, ValidationOutcome, validate};
pub use warren_domain::method::HttpMethod;
pub use warren_domain::param::{ParamKind, ParameterSchema};
