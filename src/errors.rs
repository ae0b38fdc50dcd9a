mod types;

pub use types::{FormAgentError, Result};
