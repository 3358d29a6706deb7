//! # Pipeline
//!
//! The onion-model core: [`RequestContext`], the [`Stage`] trait,
//! [`MiddlewareChain`] and the [`Executor`].

pub mod chain;
pub mod context;
pub mod executor;
pub mod stage;

pub use chain::MiddlewareChain;
pub use context::RequestContext;
pub use executor::{
    execute, panic_message, ErrorHandlerConfig, ExecutionOptions, Executor,
};
pub use stage::{handler_fn, stage_fn, FnHandler, FnStage, Stage};
