//! Crawl configuration: types, fluent builder and getters.

pub mod builder;
pub mod getters;
pub mod types;

pub use builder::TreeConfigBuilder;
pub use types::{QueryMode, TreeConfig};
