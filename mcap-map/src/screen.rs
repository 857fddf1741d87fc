//! Map screen
//!
//! Ties the catalog, search box, mode toggle, favorites and detail sheet to a
//! marker reconciler. Every change to the search query or mode re-runs a
//! full reconciliation; marker taps land in the selection slot and on the
//! event bus.

use mcap_common::config::{AppSettings, TomlConfig};
use mcap_common::events::{EventBus, MapEvent};
use mcap_common::{time, Catalog, Coordinate, ItemKind, SelectableItem};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

use crate::error::Result;
use crate::favorites::Favorites;
use crate::filter::{filter_capsules, MapMode};
use crate::location::{resolve_viewport, LocationProvider, ViewportPlan};
use crate::reconciler::{
    ActivationCallback, BindOutcome, MapAvailability, MarkerReconciler, ReconcileReport,
    ReconcilerState,
};
use crate::selection::SelectionDetail;
use crate::surface::SurfaceProvider;
use crate::upload::UploadDraft;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Cloneable handle to the screen's reconciler
///
/// Lets another task tear the map down while a bind is still in flight.
#[derive(Clone)]
pub struct MapHandle {
    reconciler: Arc<Mutex<MarkerReconciler>>,
    events: EventBus,
}

impl MapHandle {
    /// Release all markers and unbind; cancels a pending bind
    pub fn teardown(&self) -> usize {
        let released = lock(&self.reconciler).teardown();
        self.events.emit_lossy(MapEvent::TornDown {
            timestamp: time::now(),
        });
        released
    }

    pub fn availability(&self) -> MapAvailability {
        lock(&self.reconciler).availability()
    }

    pub fn state(&self) -> ReconcilerState {
        lock(&self.reconciler).state()
    }

    pub fn marker_count(&self) -> usize {
        lock(&self.reconciler).marker_count()
    }
}

/// The map tab: search, mode toggle, markers and the detail sheet
pub struct MapScreen {
    catalog: Catalog,
    search: String,
    mode: MapMode,
    favorites: Favorites,
    settings: AppSettings,
    fallback_center: Coordinate,
    viewport: Option<ViewportPlan>,
    selection: Arc<Mutex<Option<SelectableItem>>>,
    handle: MapHandle,
}

impl MapScreen {
    pub fn new(catalog: Catalog, config: &TomlConfig, events: EventBus) -> Self {
        let selection: Arc<Mutex<Option<SelectableItem>>> = Arc::new(Mutex::new(None));

        let slot = selection.clone();
        let bus = events.clone();
        let on_activate: ActivationCallback = Arc::new(move |item: SelectableItem| {
            info!("Marker activated: {} '{}'", item.kind(), item.id());
            *lock(&slot) = Some(item.clone());
            bus.emit_lossy(MapEvent::MarkerActivated {
                item,
                timestamp: time::now(),
            });
        });

        let favorites = Favorites::from_capsules(catalog.favorite_capsules());
        Self {
            catalog,
            search: String::new(),
            mode: MapMode::default(),
            favorites,
            settings: config.settings.clone(),
            fallback_center: config.map.fallback_center(),
            viewport: None,
            selection,
            handle: MapHandle {
                reconciler: Arc::new(Mutex::new(MarkerReconciler::new(
                    config.map.zoom,
                    on_activate,
                ))),
                events,
            },
        }
    }

    fn reconciler(&self) -> MutexGuard<'_, MarkerReconciler> {
        lock(&self.handle.reconciler)
    }

    fn emit(&self, event: MapEvent) {
        self.handle.events.emit_lossy(event);
    }

    pub fn handle(&self) -> MapHandle {
        self.handle.clone()
    }

    /// Locate the viewer, open a surface and draw the current markers
    ///
    /// If the map is torn down (through a [`MapHandle`]) before the surface
    /// finishes opening, the surface is discarded and nothing is drawn.
    pub async fn bind(
        &mut self,
        provider: &dyn SurfaceProvider,
        location: &dyn LocationProvider,
    ) -> BindOutcome {
        let ticket = self.reconciler().begin_bind();

        let position = location.current_position().await;
        let plan = resolve_viewport(
            position,
            self.fallback_center,
            self.settings.location_sharing,
        );
        self.viewport = Some(plan);

        let opened = provider.open().await;
        let failure = opened.as_ref().err().map(|e| e.to_string());
        let outcome = self
            .reconciler()
            .finish_bind(ticket, opened, plan.center, plan.viewer);

        match outcome {
            BindOutcome::Bound => {
                self.emit(MapEvent::SurfaceBound {
                    center: plan.center,
                    viewer_marker: plan.viewer.is_some(),
                    timestamp: time::now(),
                });
                self.refresh();
            }
            BindOutcome::Unavailable => {
                self.emit(MapEvent::SurfaceUnavailable {
                    reason: failure
                        .unwrap_or_else(|| "map already reported unavailable".to_string()),
                    timestamp: time::now(),
                });
            }
            BindOutcome::Discarded => {
                self.emit(MapEvent::BindDiscarded {
                    timestamp: time::now(),
                });
            }
            BindOutcome::AlreadyBound => {}
        }
        outcome
    }

    /// Re-run reconciliation for the current query and mode
    pub fn refresh(&self) -> ReconcileReport {
        let filtered = filter_capsules(&self.catalog.capsules, &self.search);
        let (capsules, listeners) = self.mode.inputs(&filtered, &self.catalog.nearby_listeners);
        let report = self.reconciler().reconcile(capsules, listeners);

        if report.applied {
            for skipped in &report.skipped {
                self.emit(MapEvent::RecordSkipped {
                    kind: skipped.kind,
                    id: skipped.id.clone(),
                    reason: skipped.reason.clone(),
                    timestamp: time::now(),
                });
            }
            self.emit(MapEvent::MarkersReconciled {
                capsules: report.capsules,
                listeners: report.listeners,
                skipped: report.skipped.len(),
                released: report.released,
                timestamp: time::now(),
            });
        }
        report
    }

    pub fn set_search(&mut self, query: impl Into<String>) -> ReconcileReport {
        self.search = query.into();
        self.refresh()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_mode(&mut self, mode: MapMode) -> ReconcileReport {
        info!("Map mode: {}", mode);
        self.mode = mode;
        self.refresh()
    }

    pub fn mode(&self) -> MapMode {
        self.mode
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn favorites(&self) -> &Favorites {
        &self.favorites
    }

    pub fn viewport(&self) -> Option<ViewportPlan> {
        self.viewport
    }

    pub fn availability(&self) -> MapAvailability {
        self.reconciler().availability()
    }

    pub fn marker_count(&self) -> usize {
        self.reconciler().marker_count()
    }

    /// Raw surface id of the marker for item `id` of `kind`
    ///
    /// Fails with `NotFound` when that record has no marker on the map,
    /// for instance because the current mode or search hides it.
    pub fn marker_id(&self, kind: ItemKind, id: &str) -> Result<u64> {
        self.reconciler().marker_id(kind, id).ok_or_else(|| {
            mcap_common::Error::NotFound(format!("no marker for {} '{}'", kind, id)).into()
        })
    }

    pub fn selection(&self) -> Option<SelectableItem> {
        lock(&self.selection).clone()
    }

    /// Content of the detail sheet for the current selection
    pub fn selection_detail(&self) -> Option<SelectionDetail> {
        self.selection().map(|item| {
            let favorited = item
                .as_capsule()
                .is_some_and(|c| self.favorites.contains(&c.id));
            SelectionDetail::for_item(&item, self.settings.auto_play, favorited)
        })
    }

    pub fn close_selection(&self) {
        if lock(&self.selection).take().is_some() {
            self.emit(MapEvent::SelectionCleared {
                timestamp: time::now(),
            });
        }
    }

    /// Flip favorite status of the selected capsule
    ///
    /// Returns `None` when nothing, or a listener, is selected.
    pub fn toggle_favorite_selected(&mut self) -> Option<bool> {
        let item = self.selection()?;
        let capsule = item.as_capsule()?;
        let favorited = self.favorites.toggle(capsule);
        self.emit(MapEvent::FavoriteToggled {
            capsule_id: capsule.id.clone(),
            favorited,
            timestamp: time::now(),
        });
        Some(favorited)
    }

    /// Move the map back to the viewer; false if the viewer is not shown
    pub fn recenter_on_viewer(&self) -> bool {
        let Some(viewer) = self.viewport.and_then(|plan| plan.viewer) else {
            return false;
        };
        let mut reconciler = self.reconciler();
        if !reconciler.is_bound() {
            return false;
        }
        reconciler.set_center(viewer);
        true
    }

    /// Validate an upload and drop the capsule at the viewer's position
    ///
    /// Falls back to the map center when the viewer is not located.
    /// Returns the new capsule's id.
    pub fn upload(&mut self, draft: UploadDraft, uploaded_by: &str) -> Result<String> {
        let position = self
            .viewport
            .map(|plan| plan.viewer.unwrap_or(plan.center))
            .unwrap_or(self.fallback_center);
        let capsule = draft.into_capsule(position, uploaded_by, time::today())?;
        let id = capsule.id.clone();
        self.catalog.add_capsule(capsule)?;
        self.refresh();
        Ok(id)
    }

    pub fn teardown(&self) -> usize {
        self.handle.teardown()
    }
}
