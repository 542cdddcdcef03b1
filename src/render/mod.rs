//! Renderers over a finished resource set
//!
//! Both renderers apply the same exclusion and allowlist filters from
//! [`RenderOptions`] and never touch the filesystem themselves.

pub mod flowchart;
pub mod options;
pub mod report;

pub use flowchart::build_flowchart;
pub use options::{GroupDefinition, RenderOptions};
pub use report::build_report;
