pub mod config;
pub mod diagnostic;
pub mod error;
pub mod expr;
pub mod external;
pub mod loader;
pub mod model;
pub mod outputs;
pub mod paths;
pub mod repo;
pub mod rules;

pub use error::{DotGithubError, Result};
