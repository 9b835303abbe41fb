//! Integration tests for the toast registry and the toaster service
//!
//! Registry tests drive time with a `ManualClock`; service tests run on
//! paused tokio time so every deadline is deterministic.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio_test::{assert_err, assert_ok};

use toaster::clock::ManualClock;
use toaster::config::{Settings, ToastSettings};
use toaster::error::ToastError;
use toaster::presentation::{Anchor, Gesture, HeadlessHost};
use toaster::tasks::{ToasterHandle, ToasterService};
use toaster::toast::{HoverPolicy, Phase, Registry, ToastEvent, ToastKind};

/// Helper to create a registry on a manual clock
fn create_registry(policy: HoverPolicy) -> (Registry, Arc<ManualClock>) {
    let clock = ManualClock::new();
    let settings = ToastSettings {
        hover_policy: policy,
        ..Default::default()
    };
    let registry = Registry::new(settings, clock.clone(), Arc::new(HeadlessHost::new()), 128)
        .expect("registry should start with every anchor present");
    (registry, clock)
}

/// Advance in frame-sized steps, as a renderer would
fn run_frames(registry: &mut Registry, clock: &ManualClock, total_ms: u64) {
    let mut left = total_ms;
    while left > 0 {
        let step = left.min(16);
        clock.advance(step);
        registry.tick();
        left -= step;
    }
}

// =============================================================================
// Registry lifecycle
// =============================================================================

mod registry_tests {
    use super::*;

    #[test]
    fn test_progress_reaches_one_and_toast_retires() {
        for duration in [1u64, 16, 250, 1000, 5000] {
            let (mut registry, clock) = create_registry(HoverPolicy::PauseHovered);
            let id = registry.info("msg", None, Some(duration as i64)).unwrap();
            assert_eq!(registry.get(&id).unwrap().progress(), 0.0);

            run_frames(&mut registry, &clock, duration);

            assert!(registry.get(&id).is_none(), "duration {duration}");
            assert_eq!(registry.retired(&id).unwrap().progress(), 1.0);
        }
    }

    #[test]
    fn test_progress_is_monotonic_while_active() {
        let (mut registry, clock) = create_registry(HoverPolicy::PauseHovered);
        let id = registry.info("msg", None, Some(2000)).unwrap();

        let mut last = 0.0;
        for step in 0..60 {
            clock.advance(16);
            registry.tick();
            if step % 10 == 0 {
                registry.pause(id);
            } else if step % 10 == 5 {
                registry.resume(id);
            }
            let progress = registry.get(&id).unwrap().progress();
            assert!(progress >= last);
            last = progress;
        }
    }

    #[test]
    fn test_paused_time_never_counts() {
        for paused_for in [0u64, 1, 500, 60_000] {
            let (mut registry, clock) = create_registry(HoverPolicy::PauseHovered);
            let id = registry.info("msg", None, Some(1000)).unwrap();

            run_frames(&mut registry, &clock, 320);
            registry.pause(id);
            let progress = registry.get(&id).unwrap().progress();

            run_frames(&mut registry, &clock, paused_for);
            registry.resume(id);

            let expected = ((1.0 - progress) * 1000.0).round() as u64;
            assert_eq!(registry.scheduled_remaining(&id), Some(expected));
        }
    }

    #[test]
    fn test_scenario_pause_for_two_seconds() {
        let (mut registry, clock) = create_registry(HoverPolicy::PauseHovered);
        let id = registry.add(ToastKind::Info, "hi", Some("Title"), Some(1000)).unwrap();

        run_frames(&mut registry, &clock, 400);
        assert!((registry.get(&id).unwrap().progress() - 0.4).abs() < 1e-9);

        registry.pause(id);
        run_frames(&mut registry, &clock, 2000);
        registry.resume(id);
        assert_eq!(registry.scheduled_remaining(&id), Some(600));

        run_frames(&mut registry, &clock, 600);
        assert!(registry.get(&id).is_none());
        assert!(registry.retired(&id).is_some());
    }

    #[test]
    fn test_pause_all_scenario() {
        let (mut registry, clock) = create_registry(HoverPolicy::PauseAll);
        let a = registry.info("a", None, Some(3000)).unwrap();
        run_frames(&mut registry, &clock, 1000);
        let b = registry.warning("b", None, Some(3000)).unwrap();
        run_frames(&mut registry, &clock, 500);

        registry.pause(a);
        assert!(registry.active().iter().all(|t| t.is_paused()));

        run_frames(&mut registry, &clock, 5000);
        assert_eq!(registry.active().len(), 2);

        registry.resume(b);
        assert!(registry.active().iter().all(|t| !t.is_paused()));
        assert_eq!(registry.scheduled_remaining(&a), Some(1500));
        assert_eq!(registry.scheduled_remaining(&b), Some(2500));

        run_frames(&mut registry, &clock, 1500);
        assert!(registry.get(&a).is_none());
        assert!(registry.get(&b).is_some());
    }

    #[test]
    fn test_disabled_policy_never_touches_timing() {
        let (mut registry, _clock) = create_registry(HoverPolicy::Disabled);
        let id = registry.info("x", None, Some(1000)).unwrap();

        for gesture in [Gesture::PointerEnter(id), Gesture::PointerLeave(id)] {
            registry.handle_gesture(gesture);
            assert!(!registry.get(&id).unwrap().is_paused());
            assert_eq!(registry.scheduled_remaining(&id), Some(1000));
        }
    }

    #[test]
    fn test_sticky_toast_until_closed() {
        let (mut registry, clock) = create_registry(HoverPolicy::PauseAll);
        let id = registry.error("sticky", None, Some(0)).unwrap();
        assert!(!registry.is_scheduled(&id));
        assert_eq!(registry.get(&id).unwrap().progress(), 1.0);

        run_frames(&mut registry, &clock, 30_000);
        assert!(registry.get(&id).is_some());

        registry.handle_gesture(Gesture::Close(id));
        registry.handle_gesture(Gesture::Close(id));
        assert_eq!(registry.stats().total_removed, 1);

        run_frames(&mut registry, &clock, 500);
        assert_eq!(registry.retired(&id).unwrap().phase(), Phase::Detached);
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let (mut registry, _clock) = create_registry(HoverPolicy::PauseHovered);
        let id = registry.info("x", None, None).unwrap();
        registry.remove(id);

        registry.pause(id);
        registry.resume(id);
        assert!(!registry.remove(id));
        assert_eq!(registry.stats().total_paused, 0);
    }

    #[test]
    fn test_missing_anchor_fails_fast() {
        let clock = ManualClock::new();
        let host = Arc::new(HeadlessHost::with_anchors([Anchor::Container]));
        let mut registry = Registry::new(ToastSettings::default(), clock, host, 8).unwrap();

        let err = registry.info("x", None, None).unwrap_err();
        assert!(err.is_fatal());
        assert!(registry.active().is_empty());
    }
}

// =============================================================================
// Service tests
// =============================================================================

mod service_tests {
    use super::*;

    fn start(policy: HoverPolicy) -> (ToasterHandle, broadcast::Sender<()>) {
        let mut settings = Settings::default();
        settings.toast.hover_policy = policy;
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (service, handle) =
            ToasterService::new(&settings, Arc::new(HeadlessHost::new()), shutdown_rx).unwrap();
        tokio::spawn(service.run());
        (handle, shutdown_tx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_duration_applies() {
        let (handle, _shutdown) = start(HoverPolicy::PauseHovered);
        let id = assert_ok!(handle.info("hello", None, None).await);

        tokio::time::sleep(Duration::from_millis(4900)).await;
        let views = assert_ok!(handle.views().await);
        assert_eq!(views[0].id, id);
        assert!(views[0].progress > 0.9);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(assert_ok!(handle.views().await).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_all_through_handle() {
        let (handle, _shutdown) = start(HoverPolicy::PauseAll);
        let a = assert_ok!(handle.info("a", None, Some(1000)).await);
        let _b = assert_ok!(handle.success("b", None, Some(1000)).await);

        assert_ok!(handle.pause(a).await);
        tokio::time::sleep(Duration::from_secs(10)).await;

        let views = assert_ok!(handle.views().await);
        assert_eq!(views.len(), 2);
        assert!(views.iter().all(|v| v.paused));

        assert_ok!(handle.resume(a).await);
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(assert_ok!(handle.views().await).is_empty());

        let stats = assert_ok!(handle.stats().await);
        assert_eq!(stats.total_expired, 2);
        assert_eq!(stats.history_count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_are_serializable() {
        let (handle, _shutdown) = start(HoverPolicy::PauseHovered);
        let mut events = handle.subscribe();

        let id = assert_ok!(handle.warning("Disk almost full", Some("  "), Some(0)).await);
        let event = assert_ok!(events.recv().await);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "added");
        assert_eq!(json["id"], id.to_string());
        assert_eq!(json["kind"], "WARNING");
        assert_eq!(json["title"], "Warning");
        assert_eq!(json["icon"], "warning-svg");
        assert_eq!(json["progress"], 1.0);
        assert!(matches!(event, ToastEvent::Added(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_fails_after_shutdown() {
        let (handle, shutdown) = start(HoverPolicy::PauseHovered);
        shutdown.send(()).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let result = handle.info("late", None, None).await;
        assert!(matches!(assert_err!(result), ToastError::ServiceClosed));
    }
}
