//! Stub provider for builds and platforms without an embedded map

use futures::future::{self, BoxFuture};
use tracing::warn;

use super::{MapSurface, SurfaceCapability, SurfaceProvider};
use crate::error::{Error, Result};

/// Provider that never opens a surface
#[derive(Debug, Clone)]
pub struct UnavailableProvider {
    reason: String,
}

impl UnavailableProvider {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl SurfaceProvider for UnavailableProvider {
    fn capability(&self) -> SurfaceCapability {
        SurfaceCapability::Unavailable
    }

    fn open(&self) -> BoxFuture<'static, Result<Box<dyn MapSurface>>> {
        warn!("Map surface requested but unavailable: {}", self.reason);
        Box::pin(future::ready(Err(Error::SurfaceUnavailable(
            self.reason.clone(),
        ))))
    }
}
