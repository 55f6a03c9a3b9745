use std::sync::Arc;

use anyhow::Context;
use log::{log, Level};

use crate::{
    api::client::HttpGateway,
    auth::{FileSessionStore, Session},
    config::Config,
    store::QuoteStore,
};

pub struct AppState {
    pub config: Config,
    pub session: Session,
    pub gateway: Arc<HttpGateway>,
    pub store: QuoteStore,
}

/// Wires the persisted session, the HTTP gateway and the store together.
pub fn get_app_data(config: Config) -> anyhow::Result<AppState> {
    let sessions = FileSessionStore::open(&config.session_file)?;
    let session = Session::new(Arc::new(sessions));
    let gateway = Arc::new(
        HttpGateway::new(&config.api_base_url, session.clone())
            .context("Could not build HTTP client")?,
    );
    let store = QuoteStore::new(gateway.clone(), session.clone());
    log!(
        Level::Debug,
        "Using {} (session at {})",
        config.api_base_url,
        config.session_file.display()
    );
    Ok(AppState {
        config,
        session,
        gateway,
        store,
    })
}
