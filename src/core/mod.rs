pub mod browser;
pub mod config;
pub mod page;
pub mod session;

pub use browser::{BrowserCapabilities, BrowserTrait};
pub use config::{
    BrowserConfig, ClassifierConfig, Config, ProxyConfig, SessionConfig, SubmitConfig, Viewport,
};
pub use page::{DomEvent, PageDriver, SearchRoot, SettleSignal};
pub use session::SessionTrait;
