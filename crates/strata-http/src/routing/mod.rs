//! Route groups and the axum bridge

pub mod group;
pub mod router;

pub use group::RouteGroup;
pub use router::{respond_with, PipelineRouter};
