use std::sync::Arc;

use crate::{
    db::{DbPool, OrmConn},
    gateway::GatewayVerifier,
    settings::PlatformSettings,
    tokens::TokenSource,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub settings: Arc<PlatformSettings>,
    pub verifier: Arc<dyn GatewayVerifier>,
    pub tokens: Arc<dyn TokenSource>,
}
