//! Route configuration, middleware chains and manifest loading

pub mod builder;
pub mod chain;
pub mod loader;
pub mod registry;

pub use builder::RouteConfig;
pub use chain::{ChainStep, MiddlewareChain};
pub use loader::RouteDef;
pub use registry::HandlerRegistry;
