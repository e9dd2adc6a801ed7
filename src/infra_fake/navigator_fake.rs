use crate::domain_port::Navigator;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<String> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route.to_string());
    }
}
