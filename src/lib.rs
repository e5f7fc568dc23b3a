//! Cross-reference inspector for application-model exports.
//!
//! A model export holds pages, fragments, layouts and flows. [`pipeline::run`]
//! walks every document, fills the overview and flow sheets, and builds a
//! [`report::CrossReference`] recording where shared artifacts are used and
//! which declared ones are never used.
pub mod cli;
pub mod decode;
pub mod error;
pub mod jq_exec;
pub mod load;
pub mod model;
pub mod node;
pub mod path_de;
pub mod pipeline;
pub mod report;
pub mod sheet;
pub mod store;
pub mod visit;
