//! Tera-based rendering of templated target fields.
//!
//! Target declarations may embed Tera expressions in any string value, e.g.
//!
//! ```yaml
//! targets:
//!   - name: "{{ target.targetConfig.ref }}"
//!     cluster: "{{ target.args.environment }}"
//!     context: "{{ cluster.context }}"
//! ```
//!
//! This module only knows how to render strings inside a JSON value against a
//! context. Which namespaces exist and how often rendering repeats is decided
//! by [`crate::targets::render`].

pub mod error;
pub mod renderer;

pub use error::{ErrorLocation, TemplateError};
pub use renderer::{RenderedValue, TemplateRenderer};
pub use tera::Context as TemplateContext;
