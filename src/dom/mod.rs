pub mod element;
pub mod processor;
pub mod state;

pub use element::{ElementHandle, ElementProfile, OptionInfo};
pub use processor::PageTextProcessor;
pub use state::PostSubmitState;
