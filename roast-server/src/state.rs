use std::sync::Arc;

use roast::sampler::SamplerStatus;
use roast::{SharedCallTree, Symbols};

/// Everything a request handler reads. Handlers never mutate the tree.
#[derive(Clone)]
pub struct AppState {
    pub calltree: SharedCallTree,
    pub symbols: Arc<Symbols>,
    pub status: Arc<SamplerStatus>,
}

impl AppState {
    pub fn new(calltree: SharedCallTree, symbols: Arc<Symbols>, status: Arc<SamplerStatus>) -> Self {
        Self {
            calltree,
            symbols,
            status,
        }
    }
}
