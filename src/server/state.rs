use std::sync::Arc;

use crate::generation::DescriptionGenerator;
use crate::store::TodoStore;

// app's shared state
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<DescriptionGenerator>,
    // todo routes are only mounted when a store is configured
    pub store: Option<Arc<dyn TodoStore>>,
}

impl AppState {
    pub fn new(generator: Arc<DescriptionGenerator>) -> Self {
        Self {
            generator,
            store: None,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn TodoStore>) -> Self {
        self.store = Some(store);
        self
    }
}
