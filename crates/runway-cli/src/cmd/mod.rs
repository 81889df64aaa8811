pub mod archive;
pub mod campaign;
pub mod config;
pub mod finale;
pub mod note;
pub mod session;
pub mod status;
pub mod toggle;

use anyhow::Context;
use runway_core::api::HttpApi;
use runway_core::config::Config;
use runway_core::session::Session;
use runway_core::store::FileStore;
use std::path::PathBuf;

pub type CliSession = Session<HttpApi, FileStore>;

/// Global options every command sees.
pub struct Ctx {
    pub root: PathBuf,
    pub api_url: Option<String>,
    pub json: bool,
}

impl Ctx {
    pub fn config(&self) -> anyhow::Result<Config> {
        let mut config = Config::load(&self.root).context("failed to load config")?;
        if let Some(url) = &self.api_url {
            config.api_url = url.clone();
        }
        Ok(config)
    }

    pub fn store(&self) -> FileStore {
        FileStore::new(&self.root)
    }

    pub fn open_session(&self) -> anyhow::Result<CliSession> {
        let config = self.config()?;
        let api = HttpApi::from_config(&config).context("failed to build HTTP client")?;
        Session::open(api, self.store()).context("failed to load local progress")
    }
}

/// The event loop is single-threaded: completions resume on the thread that
/// issued them.
pub fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

/// Fetch campaign data and apply everything that follows from it.
pub async fn load(session: &mut CliSession) -> anyhow::Result<()> {
    session.load().await?;
    Ok(())
}
