use std::sync::Arc;

use service::Marketplace;

#[derive(Clone)]
pub struct ServerState {
    pub marketplace: Arc<Marketplace>,
}

impl ServerState {
    pub fn new(marketplace: Marketplace) -> Self { Self { marketplace: Arc::new(marketplace) } }
}
