//! Shared application state for all routes. The resolver (and its cache) is shared by every request.

use crate::resolver::ConnectionResolver;

#[derive(Clone, Debug)]
pub struct AppState {
    pub resolver: ConnectionResolver,
}

impl AppState {
    pub fn new(resolver: ConnectionResolver) -> Self {
        AppState { resolver }
    }
}
