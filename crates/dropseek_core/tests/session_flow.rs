use async_trait::async_trait;
use dropseek_core::{
    Coordinate, DropDraft, DropError, DropId, DropRecord, DropService, DropStore, EngineConfig,
    LocationOptions, LocationSource, NavEvent, NewDrop, Notice, SensorError, SensorEvent,
    SensorScope, SessionController, SessionError, SessionEvent, SqliteDropStore, StoreError,
    StoreResult, Subscription, TransitionError, ViewState,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

const HERE: Coordinate = Coordinate::new(37.7749, -122.4194);
// About 111 m north of HERE.
const NORTH: Coordinate = Coordinate::new(37.7759, -122.4194);
const T0: i64 = 1_700_000_000_000;

fn fixed_clock() -> i64 {
    T0
}

/// SQLite store that counts deletes and can be switched offline.
struct CountingStore {
    inner: SqliteDropStore,
    deletes: AtomicUsize,
    offline: AtomicBool,
}

impl CountingStore {
    fn new() -> Self {
        Self {
            inner: SqliteDropStore::open_in_memory().unwrap(),
            deletes: AtomicUsize::new(0),
            offline: AtomicBool::new(false),
        }
    }

    fn check(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DropStore for CountingStore {
    async fn insert(&self, record: &NewDrop) -> StoreResult<DropId> {
        self.check()?;
        self.inner.insert(record).await
    }

    async fn list_all(&self) -> StoreResult<Vec<DropRecord>> {
        self.check()?;
        self.inner.list_all().await
    }

    async fn delete_by_id(&self, id: DropId) -> StoreResult<()> {
        self.check()?;
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_by_id(id).await
    }

    async fn delete_created_before(&self, cutoff_ms: i64) -> StoreResult<u64> {
        self.check()?;
        self.inner.delete_created_before(cutoff_ms).await
    }
}

async fn controller_with(drops: &[(DropDraft, Coordinate)]) -> SessionController<Arc<CountingStore>> {
    let store = Arc::new(CountingStore::new());
    let service = DropService::new(Arc::clone(&store));
    for (draft, at) in drops {
        service.create(draft.clone(), Some(*at), T0).await.unwrap();
    }

    let mut controller =
        SessionController::new(service, &EngineConfig::default()).with_clock(fixed_clock);
    controller.refresh_drops().await.unwrap();
    controller
}

fn deletes(controller: &SessionController<Arc<CountingStore>>) -> usize {
    controller.service().store().deletes.load(Ordering::SeqCst)
}

async fn fix(controller: &mut SessionController<Arc<CountingStore>>, at: Coordinate) -> ViewState {
    controller
        .handle(SessionEvent::Sensor(SensorEvent::Location(at)))
        .await
        .unwrap()
}

#[tokio::test]
async fn locked_drop_is_revealed_after_wrong_attempts_and_deleted_once() {
    let draft = DropDraft::new("bench", "the key is taped underneath").with_password("pw");
    let mut controller = controller_with(&[(draft, HERE)]).await;

    assert_eq!(controller.view(), ViewState::AwaitingLocation);
    assert_eq!(fix(&mut controller, HERE).await, ViewState::Discovery);

    let found = controller.discoveries();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].distance_m, 0.0);

    let view = controller
        .dispatch(NavEvent::SelectDrop(found[0].clone()))
        .await
        .unwrap();
    assert_eq!(view, ViewState::Navigate);
    let guidance = controller.guidance().unwrap();
    assert!(guidance.arrived);
    assert!(controller.projector().can_open(guidance.distance_m));

    assert_eq!(
        controller.dispatch(NavEvent::OpenRequested).await.unwrap(),
        ViewState::Unlock
    );

    for attempt in ["wrong", "PW"] {
        let err = controller
            .dispatch(NavEvent::SubmitPassword(attempt.to_string()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Drop(DropError::IncorrectPassword)
        ));
        assert_eq!(controller.view(), ViewState::Unlock);
        assert_eq!(controller.session().notice(), Some(Notice::IncorrectPassword));
    }
    assert_eq!(deletes(&controller), 0);

    let view = controller
        .dispatch(NavEvent::SubmitPassword("pw".to_string()))
        .await
        .unwrap();
    assert_eq!(view, ViewState::Reveal);
    assert_eq!(controller.session().notice(), None);
    assert_eq!(deletes(&controller), 1);

    // Re-entering the reveal screen must not consume again.
    controller.dispatch(NavEvent::RevealEntered).await.unwrap();
    assert_eq!(deletes(&controller), 1);

    assert_eq!(
        controller.session().revealed_message(),
        Some("the key is taped underneath")
    );
    assert_eq!(controller.session().revealed_author(), Some("Anonymous"));
    assert!(controller.drops().is_empty());
    assert!(controller.service().list_drops().await.unwrap().is_empty());

    assert_eq!(
        controller.dispatch(NavEvent::Back).await.unwrap(),
        ViewState::Discovery
    );
    assert_eq!(controller.session().revealed_message(), None);
    assert!(controller.discoveries().is_empty());
}

#[tokio::test]
async fn location_updates_after_wrong_password_are_not_password_failures() {
    let draft = DropDraft::new("bench", "under the seat").with_password("pw");
    let mut controller = controller_with(&[(draft, HERE)]).await;
    fix(&mut controller, HERE).await;
    let entry = controller.discoveries().remove(0);
    controller
        .dispatch(NavEvent::SelectDrop(entry))
        .await
        .unwrap();
    controller.dispatch(NavEvent::OpenRequested).await.unwrap();
    assert!(controller
        .dispatch(NavEvent::SubmitPassword("nope".to_string()))
        .await
        .is_err());

    let view = controller
        .handle(SessionEvent::Sensor(SensorEvent::Location(HERE)))
        .await;
    assert!(matches!(view, Ok(ViewState::Unlock)), "{view:?}");

    let view = controller
        .handle(SessionEvent::Sensor(SensorEvent::LocationError(
            SensorError::Unavailable("tunnel".to_string()),
        )))
        .await;
    assert!(matches!(view, Ok(ViewState::Unlock)), "{view:?}");

    // The notice stays visible until the user acts again.
    assert_eq!(controller.session().notice(), Some(Notice::IncorrectPassword));
    assert_eq!(
        controller
            .dispatch(NavEvent::SubmitPassword("pw".to_string()))
            .await
            .unwrap(),
        ViewState::Reveal
    );
    assert_eq!(deletes(&controller), 1);
}

#[tokio::test]
async fn opening_requires_walking_within_open_distance() {
    let mut controller = controller_with(&[(DropDraft::new("north", "hi"), NORTH)]).await;
    fix(&mut controller, HERE).await;

    let entry = controller.discoveries().remove(0);
    assert!(entry.distance_m > 100.0 && entry.distance_m < 120.0);
    assert!(entry.bearing_deg < 1.0 || entry.bearing_deg > 359.0);
    controller
        .dispatch(NavEvent::SelectDrop(entry))
        .await
        .unwrap();

    let err = controller
        .dispatch(NavEvent::OpenRequested)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Transition(TransitionError::TooFar { .. })
    ));
    assert_eq!(controller.view(), ViewState::Navigate);
    assert!(!controller.guidance().unwrap().arrived);

    fix(&mut controller, NORTH).await;
    assert!(controller.guidance().unwrap().arrived);
    assert_eq!(
        controller.dispatch(NavEvent::OpenRequested).await.unwrap(),
        ViewState::Reveal
    );
    assert_eq!(deletes(&controller), 1);
}

#[tokio::test]
async fn heading_rotates_radar_guidance() {
    let mut controller = controller_with(&[(DropDraft::new("north", "hi"), NORTH)]).await;
    fix(&mut controller, HERE).await;
    let entry = controller.discoveries().remove(0);
    controller
        .dispatch(NavEvent::SelectDrop(entry))
        .await
        .unwrap();

    let before = controller.guidance().unwrap();
    assert!(!before.heading_applied);

    controller
        .handle(SessionEvent::Sensor(SensorEvent::Heading(90.0)))
        .await
        .unwrap();
    let turned = controller.guidance().unwrap();
    assert!(turned.heading_applied);
    // Facing east, a drop to the north sits to the user's left.
    assert!((turned.rotation_deg - 270.0).abs() < 1.0);
    assert!(turned.offset.x < 0.0);

    controller
        .handle(SessionEvent::Sensor(SensorEvent::Heading(f64::NAN)))
        .await
        .unwrap();
    assert_eq!(controller.heading_deg(), None);
}

#[tokio::test]
async fn compose_appends_the_new_drop_to_discovery() {
    let mut controller = controller_with(&[]).await;
    fix(&mut controller, HERE).await;

    controller.dispatch(NavEvent::StartCompose).await.unwrap();
    let err = controller
        .dispatch(NavEvent::Submit(DropDraft::new("", "no name")))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Drop(DropError::InvalidInput(_))));
    assert_eq!(controller.view(), ViewState::Compose);

    let view = controller
        .dispatch(NavEvent::Submit(
            DropDraft::new("note", "hello").with_author("sam"),
        ))
        .await
        .unwrap();
    assert_eq!(view, ViewState::Discovery);

    let found = controller.discoveries();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].drop.author, "sam");
    assert_eq!(found[0].drop.location, HERE);
    assert_eq!(found[0].drop.created_at_ms, T0);
    assert_eq!(controller.service().list_drops().await.unwrap().len(), 1);
}

#[tokio::test]
async fn store_outage_keeps_the_session_where_it_was() {
    let mut controller = controller_with(&[(DropDraft::new("here", "hi"), HERE)]).await;
    fix(&mut controller, HERE).await;
    let entry = controller.discoveries().remove(0);
    controller
        .dispatch(NavEvent::SelectDrop(entry))
        .await
        .unwrap();

    controller
        .service()
        .store()
        .offline
        .store(true, Ordering::SeqCst);
    let err = controller
        .dispatch(NavEvent::OpenRequested)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Drop(DropError::StoreUnavailable(_))
    ));
    assert_eq!(controller.view(), ViewState::Navigate);
    assert_eq!(controller.drops().len(), 1);

    controller
        .service()
        .store()
        .offline
        .store(false, Ordering::SeqCst);
    assert_eq!(
        controller.dispatch(NavEvent::OpenRequested).await.unwrap(),
        ViewState::Reveal
    );
}

#[tokio::test]
async fn location_failure_before_first_fix_is_reported() {
    let mut controller = controller_with(&[]).await;

    let view = controller
        .handle(SessionEvent::Sensor(SensorEvent::LocationError(
            SensorError::PermissionDenied,
        )))
        .await
        .unwrap();
    assert_eq!(view, ViewState::AwaitingLocation);
    assert_eq!(
        controller.session().notice(),
        Some(Notice::LocationUnavailable)
    );
    assert!(matches!(
        controller.dispatch(NavEvent::StartCompose).await,
        Err(SessionError::Transition(TransitionError::LocationUnavailable))
    ));
    assert!(controller.discoveries().is_empty());

    assert_eq!(fix(&mut controller, HERE).await, ViewState::Discovery);
    assert_eq!(controller.session().notice(), None);
}

struct ScriptedLocation {
    fixes: Vec<Coordinate>,
}

impl LocationSource for ScriptedLocation {
    fn subscribe(
        &self,
        _options: LocationOptions,
        events: dropseek_core::sensor::SensorSender,
    ) -> Result<Subscription, SensorError> {
        for fix in &self.fixes {
            events.send(SensorEvent::Location(*fix)).unwrap();
        }
        Ok(Subscription::detached())
    }
}

#[tokio::test]
async fn sensor_scope_feeds_the_controller() {
    let mut controller = controller_with(&[(DropDraft::new("north", "hi"), NORTH)]).await;
    let source = Arc::new(ScriptedLocation {
        fixes: vec![HERE, NORTH],
    });
    let (scope, mut events) = SensorScope::acquire(
        source,
        None,
        EngineConfig::default().location_options(),
    );

    while let Ok(event) = events.try_recv() {
        controller.handle(SessionEvent::Sensor(event)).await.unwrap();
    }
    drop(scope);

    assert_eq!(controller.session().location(), Some(NORTH));
    assert_eq!(controller.discoveries()[0].distance_m, 0.0);
}
