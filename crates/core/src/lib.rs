pub mod config;
pub mod error;
pub mod rule;
pub mod store;
pub mod task;

pub use config::Config;
pub use error::*;
pub use rule::*;
pub use store::*;
pub use task::*;
