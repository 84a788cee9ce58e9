//! Facade crate for the Warren route compiler.
//! Re-exports the domain models and the kernel so applications depend on one crate.
//! Keep this crate thin: it composes other crates, it does not implement routing logic.
//!
//! ## Usage
//! - Add `warren`, with the `server` feature to mount compiled APIs on axum.
//! - Declare collections with [`Api::builder`], then hand the result to a host.

pub use warren_domain as domain;
pub use warren_kernel as kernel;
pub use warren_kernel::compiler::{Api, ApiBuilder};
pub use warren_kernel::prelude;

#[cfg(feature = "server")]
pub mod server {
    pub use warren_kernel::server::{axum_path, router};
}
