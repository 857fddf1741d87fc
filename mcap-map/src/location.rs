//! Viewer location and viewport planning
//!
//! Device geolocation is external; providers deliver a position
//! asynchronously. When no position is available the map still opens, on a
//! configured fallback center and without the viewer marker.

use futures::future::{self, BoxFuture};
use mcap_common::Coordinate;
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Source of the viewer's current position
pub trait LocationProvider: Send + Sync {
    fn current_position(&self) -> BoxFuture<'static, Result<Coordinate>>;
}

/// Always reports the same position
///
/// Stands in for live geolocation on platforms that lack it.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinate);

impl LocationProvider for FixedLocation {
    fn current_position(&self) -> BoxFuture<'static, Result<Coordinate>> {
        Box::pin(future::ready(Ok(self.0)))
    }
}

/// Provider for a user who refused the location permission
#[derive(Debug, Clone, Copy, Default)]
pub struct DeniedLocation;

impl LocationProvider for DeniedLocation {
    fn current_position(&self) -> BoxFuture<'static, Result<Coordinate>> {
        Box::pin(future::ready(Err(Error::PermissionDenied(
            "foreground location permission not granted".to_string(),
        ))))
    }
}

/// Where to center the map and whether to draw the viewer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportPlan {
    pub center: Coordinate,
    /// Position for the viewer marker; `None` hides it
    pub viewer: Option<Coordinate>,
    /// The provider refused; the UI should tell the user
    pub permission_denied: bool,
}

/// Turn a location lookup into a viewport plan
///
/// A valid position centers the map and (if sharing is on) shows the viewer
/// marker. Anything else falls back to `fallback` with no viewer marker.
pub fn resolve_viewport(
    position: Result<Coordinate>,
    fallback: Coordinate,
    sharing_enabled: bool,
) -> ViewportPlan {
    match position {
        Ok(coordinate) => match coordinate.validate() {
            Ok(()) => {
                info!("Viewer located at {}", coordinate);
                ViewportPlan {
                    center: coordinate,
                    viewer: sharing_enabled.then_some(coordinate),
                    permission_denied: false,
                }
            }
            Err(e) => {
                warn!("Location provider returned {}: {}, using fallback", coordinate, e);
                fallback_plan(fallback, false)
            }
        },
        Err(Error::PermissionDenied(reason)) => {
            warn!("Location permission denied ({}), using fallback {}", reason, fallback);
            fallback_plan(fallback, true)
        }
        Err(e) => {
            warn!("Location unavailable ({}), using fallback {}", e, fallback);
            fallback_plan(fallback, false)
        }
    }
}

fn fallback_plan(fallback: Coordinate, permission_denied: bool) -> ViewportPlan {
    ViewportPlan {
        center: fallback,
        viewer: None,
        permission_denied,
    }
}
