use crate::core::{BrowserTrait, Config};
use crate::errors::Result;
use crate::types::{ApplicationReport, ApplicationRequest};
use async_trait::async_trait;

#[async_trait]
pub trait SessionTrait<B: BrowserTrait>: Send + Sync {
    async fn new(browser: B, config: Config) -> Result<Self>
    where
        Self: Sized;

    /// Load the target url and wait for it to settle.
    async fn open(&mut self, url: &str) -> Result<()>;

    /// Fill, submit and classify one application. Only resource faults come back as `Err`.
    async fn apply(&mut self, request: &ApplicationRequest) -> Result<ApplicationReport>;

    async fn screenshot(&self) -> Result<Vec<u8>>;

    async fn current_url(&self) -> Result<String>;

    async fn close(&mut self) -> Result<()>;
}
