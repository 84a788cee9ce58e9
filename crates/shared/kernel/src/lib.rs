//! Route compiler for declarative resource APIs.
//!
//! Applications declare collections, operations and features on an
//! [`ApiBuilder`](compiler::ApiBuilder); compiling yields an immutable
//! [`Api`](compiler::Api) holding the collection tree and the route table a host
//! dispatcher mounts. Requests run through the registration gate, capability check and
//! input validation before an operation body sees them.
//!
//! ## Declaring an API
//! ```rust
//! use warren_kernel::prelude::*;
//!
//! let api = Api::builder("sample_app")
//!     .feature("user_data", "sample", |f| {
//!         f.operation("index", [ParameterSchema::string("feature_data")]);
//!     })
//!     .collection("sample", |c| {
//!         c.operation("index", |o| {
//!             o.param(ParameterSchema::string("id").required());
//!         })
//!         .collection("subsample", |s| {
//!             s.with_id("sub_id").operation("start", |_| {});
//!         });
//!     })
//!     .build()
//!     .unwrap();
//!
//! let start = api.collection_at(&["sample", "subsample"]).unwrap().operation("start").unwrap();
//! assert_eq!(start.path(), "/sample/:id/subsample/:sub_id/start");
//! ```
//!
//! ## Config loading
//! ```rust,ignore
//! use warren_domain::config::ApiConfig;
//! use warren_kernel::config::load_config;
//!
//! let cfg: ApiConfig = load_config(Some("warren.toml")).unwrap();
//! ```
pub mod collection;
pub mod compiler;
pub mod config;
pub mod docs;
pub mod error;
pub mod feature;
pub mod hooks;
pub mod operation;
pub mod path;
pub mod prelude;
pub mod registry;
pub mod reply;
#[cfg(feature = "server")]
pub mod server;
pub mod validator;

pub use warren_domain as domain;
