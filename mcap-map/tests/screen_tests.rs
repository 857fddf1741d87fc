//! Map screen integration: async binding, degradation, search, selection
//!
//! Uses the headless surface as the map backend and broadcast events to
//! observe what the screen reports.

use futures::future::BoxFuture;
use mcap_common::config::TomlConfig;
use mcap_common::events::{EventBus, MapEvent};
use mcap_common::{Catalog, Coordinate, ItemKind};
use mcap_map::filter::MapMode;
use mcap_map::location::{DeniedLocation, FixedLocation};
use mcap_map::selection::SelectionDetail;
use mcap_map::surface::{
    HeadlessProvider, HeadlessSurface, MapSurface, MarkerStyle, SurfaceCapability,
    SurfaceProvider, UnavailableProvider,
};
use mcap_map::upload::UploadDraft;
use mcap_map::{BindOutcome, MapAvailability, MapScreen, ReconcilerState};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::broadcast::Receiver;
use tokio::sync::Notify;

/// Provider whose surface only opens once the gate is notified
struct GatedProvider {
    surface: HeadlessSurface,
    gate: Arc<Notify>,
}

impl GatedProvider {
    fn new() -> Self {
        Self {
            surface: HeadlessSurface::new(),
            gate: Arc::new(Notify::new()),
        }
    }
}

impl SurfaceProvider for GatedProvider {
    fn capability(&self) -> SurfaceCapability {
        SurfaceCapability::Available
    }

    fn open(&self) -> BoxFuture<'static, mcap_map::Result<Box<dyn MapSurface>>> {
        let gate = self.gate.clone();
        let surface = self.surface.clone();
        Box::pin(async move {
            gate.notified().await;
            let surface: Box<dyn MapSurface> = Box::new(surface);
            Ok(surface)
        })
    }
}

fn tokyo() -> Coordinate {
    Coordinate::new(35.6812, 139.7671)
}

fn screen_with(catalog: Catalog, config: &TomlConfig) -> (MapScreen, Receiver<MapEvent>) {
    let events = EventBus::new(256);
    let rx = events.subscribe();
    (MapScreen::new(catalog, config, events), rx)
}

fn drain(rx: &mut Receiver<MapEvent>) -> Vec<MapEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn names(events: &[MapEvent]) -> Vec<&'static str> {
    events.iter().map(|e| e.name()).collect()
}

#[tokio::test]
async fn test_bind_draws_capsules_and_viewer() {
    let (mut screen, mut rx) = screen_with(Catalog::demo(), &TomlConfig::default());
    let provider = HeadlessProvider::new();
    let surface = provider.surface();

    let outcome = screen.bind(&provider, &FixedLocation(tokyo())).await;

    assert_eq!(outcome, BindOutcome::Bound);
    assert_eq!(screen.availability(), MapAvailability::Available);
    assert_eq!(screen.marker_count(), 5);
    assert_eq!(surface.markers_with_style(MarkerStyle::Capsule).len(), 5);
    assert_eq!(surface.markers_with_style(MarkerStyle::Viewer).len(), 1);
    assert_eq!(surface.viewport(), Some((tokyo(), 13)));
    assert_eq!(names(&drain(&mut rx)), vec!["SurfaceBound", "MarkersReconciled"]);
}

#[tokio::test]
async fn test_unavailable_surface_degrades_to_noop() {
    let (mut screen, mut rx) = screen_with(Catalog::demo(), &TomlConfig::default());
    let provider = UnavailableProvider::new("no embedded map on this platform");

    let outcome = screen.bind(&provider, &FixedLocation(tokyo())).await;
    let report = screen.set_search("beyond");

    assert_eq!(outcome, BindOutcome::Unavailable);
    assert_eq!(screen.availability(), MapAvailability::Unavailable);
    assert!(!report.applied);
    assert_eq!(screen.marker_count(), 0);
    assert!(screen.selection().is_none());

    let events = drain(&mut rx);
    match &events[..] {
        [MapEvent::SurfaceUnavailable { reason, .. }] => {
            assert!(reason.contains("no embedded map"));
        }
        other => panic!("unexpected events {:?}", names(other)),
    }

    // Teardown on a never-bound map is harmless and the state sticks
    screen.teardown();
    assert_eq!(screen.availability(), MapAvailability::Unavailable);
}

#[tokio::test]
async fn test_denied_location_uses_fallback_without_viewer() {
    let (mut screen, _rx) = screen_with(Catalog::demo(), &TomlConfig::default());
    let provider = HeadlessProvider::new();
    let surface = provider.surface();

    screen.bind(&provider, &DeniedLocation).await;

    let plan = screen.viewport().unwrap();
    assert!(plan.permission_denied);
    assert_eq!(plan.center, Coordinate::fallback());
    assert!(surface.markers_with_style(MarkerStyle::Viewer).is_empty());
    assert_eq!(surface.viewport(), Some((Coordinate::fallback(), 13)));
    assert!(!screen.recenter_on_viewer());
}

#[tokio::test]
async fn test_location_sharing_off_hides_viewer() {
    let mut config = TomlConfig::default();
    config.settings.location_sharing = false;
    let (mut screen, _rx) = screen_with(Catalog::demo(), &config);
    let provider = HeadlessProvider::new();

    screen.bind(&provider, &FixedLocation(tokyo())).await;

    assert!(provider.surface().markers_with_style(MarkerStyle::Viewer).is_empty());
    assert_eq!(provider.surface().viewport(), Some((tokyo(), 13)));
}

#[tokio::test]
async fn test_teardown_during_bind_discards_surface() {
    let (mut screen, mut rx) = screen_with(Catalog::demo(), &TomlConfig::default());
    let handle = screen.handle();
    let provider = GatedProvider::new();
    let gate = provider.gate.clone();
    let surface = provider.surface.clone();

    let location = FixedLocation(tokyo());
    let bind = screen.bind(&provider, &location);
    let cancel = async {
        tokio::task::yield_now().await;
        assert_eq!(handle.availability(), MapAvailability::Pending);
        handle.teardown();
        gate.notify_one();
    };
    let (outcome, ()) = tokio::join!(bind, cancel);

    assert_eq!(outcome, BindOutcome::Discarded);
    assert_eq!(handle.state(), ReconcilerState::Unbound);
    assert_eq!(handle.marker_count(), 0);
    assert_eq!(surface.created_count(), 0);
    assert!(surface.viewport().is_none());
    assert!(names(&drain(&mut rx)).contains(&"BindDiscarded"));
}

#[tokio::test]
async fn test_search_and_mode_rebuild_markers() {
    let (mut screen, _rx) = screen_with(Catalog::demo(), &TomlConfig::default());
    let provider = HeadlessProvider::new();
    let surface = provider.surface();
    screen.bind(&provider, &DeniedLocation).await;

    let report = screen.set_search("愛情");
    assert_eq!(report.capsules, 2);
    assert_eq!(report.released, 5);
    assert_eq!(surface.live_count(), 2);

    let report = screen.set_mode(MapMode::Nearby);
    assert_eq!((report.capsules, report.listeners), (0, 3));
    assert_eq!(surface.markers_with_style(MarkerStyle::Listener).len(), 3);
    assert!(surface.markers_with_style(MarkerStyle::Capsule).is_empty());

    let report = screen.set_mode(MapMode::Capsules);
    assert_eq!(report.capsules, 2);
    assert_eq!(screen.search(), "愛情");

    screen.set_search("");
    assert_eq!(surface.live_count(), 5);
}

#[tokio::test]
async fn test_tap_opens_detail_and_favorite_toggles() {
    let (mut screen, mut rx) = screen_with(Catalog::demo(), &TomlConfig::default());
    let provider = HeadlessProvider::new();
    let surface = provider.surface();
    screen.bind(&provider, &DeniedLocation).await;
    drain(&mut rx);

    assert!(surface.tap_title("演員"));
    let item = screen.selection().unwrap();
    assert_eq!((item.kind(), item.id()), (ItemKind::Capsule, "4"));

    match screen.selection_detail().unwrap() {
        SelectionDetail::Player { favorited, embed_url, .. } => {
            assert!(!favorited);
            assert!(embed_url.contains("Nt6kKhlX8vU"));
            assert!(embed_url.contains("autoplay=0"));
        }
        other => panic!("expected player, got {:?}", other),
    }

    assert_eq!(screen.toggle_favorite_selected(), Some(true));
    assert!(screen.favorites().contains("4"));
    assert_eq!(screen.favorites().len(), 4);

    screen.close_selection();
    assert!(screen.selection().is_none());
    assert_eq!(screen.toggle_favorite_selected(), None);

    assert_eq!(
        names(&drain(&mut rx)),
        vec!["MarkerActivated", "FavoriteToggled", "SelectionCleared"]
    );
}

#[tokio::test]
async fn test_marker_id_activates_by_identity() {
    let mut catalog = Catalog::demo();
    catalog.capsules[1].title = catalog.capsules[0].title.clone();
    catalog.nearby_listeners[0].id = "1".to_string();
    let (mut screen, _rx) = screen_with(catalog, &TomlConfig::default());
    let provider = HeadlessProvider::new();
    let surface = provider.surface();
    screen.bind(&provider, &DeniedLocation).await;

    let marker = screen.marker_id(ItemKind::Capsule, "2").unwrap();
    assert!(surface.tap(marker));
    match screen.selection_detail().unwrap() {
        SelectionDetail::Player { capsule_id, .. } => assert_eq!(capsule_id, "2"),
        other => panic!("expected player, got {:?}", other),
    }
    assert!(matches!(
        screen.marker_id(ItemKind::Listener, "1"),
        Err(mcap_map::Error::Common(mcap_common::Error::NotFound(_)))
    ));

    screen.set_mode(MapMode::Nearby);
    let marker = screen.marker_id(MapMode::Nearby.item_kind(), "1").unwrap();
    assert!(surface.tap(marker));
    let item = screen.selection().unwrap();
    assert_eq!((item.kind(), item.id()), (ItemKind::Listener, "1"));
    assert!(screen.marker_id(ItemKind::Capsule, "1").is_err());
}

#[tokio::test]
async fn test_listener_selection_cannot_be_favorited() {
    let (mut screen, _rx) = screen_with(Catalog::demo(), &TomlConfig::default());
    let provider = HeadlessProvider::new();
    let surface = provider.surface();
    screen.bind(&provider, &DeniedLocation).await;
    screen.set_mode(MapMode::Nearby);

    assert!(surface.tap_title("小華"));
    assert_eq!(screen.toggle_favorite_selected(), None);
    match screen.selection_detail().unwrap() {
        SelectionDetail::ListenerCard { listener_id, .. } => assert_eq!(listener_id, "u3"),
        other => panic!("expected listener card, got {:?}", other),
    }
}

#[tokio::test]
async fn test_auto_play_setting_reaches_embed() {
    let mut config = TomlConfig::default();
    config.settings.auto_play = true;
    let (mut screen, _rx) = screen_with(Catalog::demo(), &config);
    let provider = HeadlessProvider::new();
    screen.bind(&provider, &DeniedLocation).await;

    assert!(provider.surface().tap_title("告白氣球"));
    match screen.selection_detail().unwrap() {
        SelectionDetail::Player { embed_url, favorited, .. } => {
            assert!(embed_url.contains("autoplay=1"));
            assert!(favorited);
        }
        other => panic!("expected player, got {:?}", other),
    }
}

#[tokio::test]
async fn test_recenter_on_viewer() {
    let (mut screen, _rx) = screen_with(Catalog::demo(), &TomlConfig::default());
    let provider = HeadlessProvider::new();
    let surface = provider.surface();
    screen.bind(&provider, &FixedLocation(tokyo())).await;

    assert!(screen.recenter_on_viewer());
    assert_eq!(surface.viewport(), Some((tokyo(), 13)));
    assert_eq!(surface.live_count(), 6);

    screen.teardown();
    assert!(!screen.recenter_on_viewer());
}

#[tokio::test]
async fn test_upload_adds_marker_at_viewer() {
    let (mut screen, _rx) = screen_with(Catalog::demo(), &TomlConfig::default());
    let provider = HeadlessProvider::new();
    let surface = provider.surface();
    screen.bind(&provider, &FixedLocation(tokyo())).await;

    let draft = UploadDraft {
        youtube_url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
        hashtags: "#經典 #dance".to_string(),
        description: String::new(),
        location_name: "東京都千代田區".to_string(),
        title: Some("Never Gonna Give You Up".to_string()),
        artist: Some("Rick Astley".to_string()),
    };
    let id = screen.upload(draft, "tester").unwrap();

    let capsule = screen.catalog().capsule(&id).unwrap();
    assert_eq!(capsule.coordinate, Some(tokyo()));
    assert_eq!(capsule.hashtags, vec!["經典", "dance"]);
    assert_eq!(screen.marker_count(), 6);
    assert!(surface.tap_title("Never Gonna Give You Up"));
    assert_eq!(screen.selection().unwrap().id(), id);
}

#[tokio::test]
async fn test_upload_rejects_invalid_draft() {
    let (mut screen, _rx) = screen_with(Catalog::demo(), &TomlConfig::default());
    let draft = UploadDraft {
        youtube_url: "https://vimeo.com/1".to_string(),
        hashtags: "x".to_string(),
        location_name: "here".to_string(),
        ..UploadDraft::default()
    };

    assert!(matches!(
        screen.upload(draft, "tester"),
        Err(mcap_map::Error::Validation(_))
    ));
    assert_eq!(screen.catalog().capsules.len(), 5);
}

#[tokio::test]
async fn test_catalog_file_with_unplaced_record() {
    let mut catalog = Catalog::demo();
    catalog.nearby_listeners[0].coordinate = None;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(serde_json::to_string(&catalog).unwrap().as_bytes())
        .unwrap();

    let loaded = Catalog::from_json_file(file.path()).unwrap();
    let (mut screen, mut rx) = screen_with(loaded, &TomlConfig::default());
    let provider = HeadlessProvider::new();
    screen.bind(&provider, &DeniedLocation).await;
    let report = screen.set_mode(MapMode::Nearby);

    assert_eq!(report.listeners, 2);
    assert_eq!(report.skipped.len(), 1);
    let skipped: Vec<_> = drain(&mut rx)
        .into_iter()
        .filter_map(|e| match e {
            MapEvent::RecordSkipped { id, kind, .. } => Some((kind, id)),
            _ => None,
        })
        .collect();
    assert_eq!(skipped, vec![(ItemKind::Listener, "u1".to_string())]);
}

#[tokio::test]
async fn test_teardown_releases_everything() {
    let (mut screen, mut rx) = screen_with(Catalog::demo(), &TomlConfig::default());
    let provider = HeadlessProvider::new();
    let surface = provider.surface();
    screen.bind(&provider, &FixedLocation(tokyo())).await;

    assert_eq!(screen.teardown(), 5);
    assert_eq!(screen.teardown(), 0);
    assert_eq!(surface.live_count(), 0);
    assert!(surface.is_released());
    assert_eq!(screen.availability(), MapAvailability::Unknown);
    assert!(names(&drain(&mut rx)).contains(&"TornDown"));

    // Rebinding after teardown reopens the same headless surface
    assert_eq!(
        screen.bind(&provider, &FixedLocation(tokyo())).await,
        BindOutcome::Bound
    );
    assert_eq!(surface.live_count(), 6);
}
