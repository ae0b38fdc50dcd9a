#[cfg(feature = "chrome")]
pub mod chrome;
pub mod navigation;
pub mod page;
pub mod session;

#[cfg(feature = "chrome")]
pub use chrome::ChromeBrowser;
pub use navigation::{NavigationManager, NavigationResult};
pub use page::ScriptedPage;
pub use session::{run_isolated, ApplicationSession};
