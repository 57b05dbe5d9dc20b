pub mod config;
pub mod errors;
pub mod parameters;
pub mod runtime;

pub use config::*;
pub use errors::*;
pub use parameters::*;
pub use runtime::*;
