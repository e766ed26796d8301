// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::SessionStore;
use crate::config::Config;

/// Shared by every handler: the database, the login sessions and the settings.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub sessions: SessionStore,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        Self {
            pool,
            sessions: SessionStore::new(config.session_ttl),
            config: Arc::new(config),
        }
    }
}
