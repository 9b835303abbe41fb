use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};

use crate::clock::TokioClock;
use crate::config::Settings;
use crate::error::{Result, ToastError};
use crate::presentation::{Gesture, Host};
use crate::toast::{
    HoverPolicy, Registry, RegistryStatsSnapshot, ToastEvent, ToastId, ToastKind, ToastView,
};

enum Command {
    Add {
        kind: ToastKind,
        message: String,
        title: Option<String>,
        duration_ms: Option<i64>,
        reply: oneshot::Sender<Result<ToastId>>,
    },
    Remove {
        id: ToastId,
        reply: oneshot::Sender<bool>,
    },
    Pause(ToastId),
    Resume(ToastId),
    Gesture(Gesture),
    SetHoverPolicy(HoverPolicy),
    Clear(oneshot::Sender<usize>),
    Views(oneshot::Sender<Vec<ToastView>>),
    Stats(oneshot::Sender<RegistryStatsSnapshot>),
}

/// Background task owning the toast registry.
///
/// Commands are applied one at a time, so registry operations never
/// interleave. Frames and task deadlines are driven from the same tokio clock.
pub struct ToasterService {
    registry: Registry,
    clock: TokioClock,
    frame_interval: Duration,
    commands: mpsc::Receiver<Command>,
    shutdown: broadcast::Receiver<()>,
}

impl ToasterService {
    /// Build the service and the handle used to talk to it.
    ///
    /// Fails when the host is missing a required anchor.
    pub fn new(
        settings: &Settings,
        host: Arc<dyn Host>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(Self, ToasterHandle)> {
        let clock = TokioClock::new();
        let registry = Registry::new(
            settings.toast.clone(),
            Arc::new(clock.clone()),
            host,
            settings.service.event_capacity,
        )?;

        let (tx, rx) = mpsc::channel(settings.service.command_capacity.max(1));
        let handle = ToasterHandle {
            commands: tx,
            events: registry.event_sender(),
        };

        let service = Self {
            registry,
            clock,
            frame_interval: Duration::from_millis(settings.service.frame_interval_ms.max(1)),
            commands: rx,
            shutdown,
        };

        Ok((service, handle))
    }

    /// Run until shutdown is signalled or every handle is dropped
    pub async fn run(mut self) {
        let mut frames = tokio::time::interval(self.frame_interval);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            frame_interval_ms = self.frame_interval.as_millis() as u64,
            hover_policy = ?self.registry.hover_policy(),
            "Toaster service started"
        );

        loop {
            let deadline = self
                .registry
                .next_deadline()
                .map(|ms| self.clock.instant_at(ms));

            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("Toaster service received shutdown signal");
                    break;
                }
                command = self.commands.recv() => {
                    match command {
                        Some(command) => self.handle(command),
                        None => {
                            tracing::debug!("All toaster handles dropped");
                            break;
                        }
                    }
                }
                _ = frames.tick() => {
                    self.registry.tick();
                }
                _ = sleep_until(deadline) => {
                    self.registry.tick();
                }
            }
        }

        let stats = self.registry.stats();
        tracing::info!(
            active = stats.active_count,
            added = stats.total_added,
            expired = stats.total_expired,
            removed = stats.total_removed,
            "Toaster service stopped"
        );
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Add {
                kind,
                message,
                title,
                duration_ms,
                reply,
            } => {
                let result = self
                    .registry
                    .add(kind, &message, title.as_deref(), duration_ms);
                if let Err(e) = &result {
                    tracing::error!(error = %e, kind = %kind, "Failed to add toast");
                }
                let _ = reply.send(result);
            }
            Command::Remove { id, reply } => {
                let _ = reply.send(self.registry.remove(id));
            }
            Command::Pause(id) => self.registry.pause(id),
            Command::Resume(id) => self.registry.resume(id),
            Command::Gesture(gesture) => self.registry.handle_gesture(gesture),
            Command::SetHoverPolicy(policy) => self.registry.set_hover_policy(policy),
            Command::Clear(reply) => {
                let _ = reply.send(self.registry.clear());
            }
            Command::Views(reply) => {
                let _ = reply.send(self.registry.views());
            }
            Command::Stats(reply) => {
                let _ = reply.send(self.registry.stats());
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Cloneable handle to a running [`ToasterService`].
#[derive(Clone)]
pub struct ToasterHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<ToastEvent>,
}

impl ToasterHandle {
    /// Subscribe to toast change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<ToastEvent> {
        self.events.subscribe()
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ToastError::ServiceClosed)
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.send(command(tx)).await?;
        rx.await.map_err(|_| ToastError::ServiceClosed)
    }

    pub async fn add(
        &self,
        kind: ToastKind,
        message: impl Into<String>,
        title: Option<&str>,
        duration_ms: Option<i64>,
    ) -> Result<ToastId> {
        let message = message.into();
        let title = title.map(str::to_string);
        self.request(|reply| Command::Add {
            kind,
            message,
            title,
            duration_ms,
            reply,
        })
        .await?
    }

    pub async fn info(&self, message: impl Into<String>, title: Option<&str>, duration_ms: Option<i64>) -> Result<ToastId> {
        self.add(ToastKind::Info, message, title, duration_ms).await
    }

    pub async fn success(&self, message: impl Into<String>, title: Option<&str>, duration_ms: Option<i64>) -> Result<ToastId> {
        self.add(ToastKind::Success, message, title, duration_ms).await
    }

    pub async fn warning(&self, message: impl Into<String>, title: Option<&str>, duration_ms: Option<i64>) -> Result<ToastId> {
        self.add(ToastKind::Warning, message, title, duration_ms).await
    }

    pub async fn error(&self, message: impl Into<String>, title: Option<&str>, duration_ms: Option<i64>) -> Result<ToastId> {
        self.add(ToastKind::Error, message, title, duration_ms).await
    }

    /// Returns whether a toast was retired.
    pub async fn remove(&self, id: ToastId) -> Result<bool> {
        self.request(|reply| Command::Remove { id, reply }).await
    }

    pub async fn pause(&self, id: ToastId) -> Result<()> {
        self.send(Command::Pause(id)).await
    }

    pub async fn resume(&self, id: ToastId) -> Result<()> {
        self.send(Command::Resume(id)).await
    }

    pub async fn gesture(&self, gesture: Gesture) -> Result<()> {
        self.send(Command::Gesture(gesture)).await
    }

    pub async fn set_hover_policy(&self, policy: HoverPolicy) -> Result<()> {
        self.send(Command::SetHoverPolicy(policy)).await
    }

    pub async fn clear(&self) -> Result<usize> {
        self.request(Command::Clear).await
    }

    /// Active toasts in display order
    pub async fn views(&self) -> Result<Vec<ToastView>> {
        self.request(Command::Views).await
    }

    pub async fn stats(&self) -> Result<RegistryStatsSnapshot> {
        self.request(Command::Stats).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::{Anchor, HeadlessHost};

    fn spawn_service(settings: Settings) -> (ToasterHandle, broadcast::Sender<()>, tokio::task::JoinHandle<()>) {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (service, handle) =
            ToasterService::new(&settings, Arc::new(HeadlessHost::new()), shutdown_rx).unwrap();
        let task = tokio::spawn(service.run());
        (handle, shutdown_tx, task)
    }

    #[tokio::test(start_paused = true)]
    async fn test_service_shutdown() {
        let (handle, shutdown_tx, task) = spawn_service(Settings::default());

        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown_tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("Task should complete")
            .expect("Task should not panic");

        assert!(matches!(handle.stats().await, Err(ToastError::ServiceClosed)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_toast_expires() {
        let (handle, _shutdown_tx, _task) = spawn_service(Settings::default());

        let id = handle.success("Saved", None, Some(1000)).await.unwrap();
        let views = handle.views().await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].id, id);
        assert_eq!(views[0].title, "Success");

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(handle.views().await.unwrap().is_empty());
        assert_eq!(handle.stats().await.unwrap().total_expired, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hover_keeps_toast_alive() {
        let (handle, _shutdown_tx, _task) = spawn_service(Settings::default());

        let id = handle.info("hi", Some("Title"), Some(1000)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        handle.gesture(Gesture::PointerEnter(id)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(2000)).await;
        let views = handle.views().await.unwrap();
        assert!(views[0].paused);

        handle.gesture(Gesture::PointerLeave(id)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(550)).await;
        assert_eq!(handle.views().await.unwrap().len(), 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.views().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_gesture_emits_exit_and_detach() {
        let (handle, _shutdown_tx, _task) = spawn_service(Settings::default());
        let mut events = handle.subscribe();

        let id = handle.error("Oops", None, Some(0)).await.unwrap();
        handle.gesture(Gesture::Close(id)).await.unwrap();
        assert!(!handle.remove(id).await.unwrap());

        let mut saw_exit = false;
        loop {
            match tokio::time::timeout(Duration::from_secs(1), events.recv()).await {
                Ok(Ok(ToastEvent::Exiting { id: exiting })) => {
                    assert_eq!(exiting, id);
                    saw_exit = true;
                }
                Ok(Ok(ToastEvent::Detached { id: detached })) => {
                    assert_eq!(detached, id);
                    break;
                }
                Ok(Ok(_)) => {}
                other => panic!("unexpected: {:?}", other.map(|r| r.map(|e| e.toast_id()))),
            }
        }
        assert!(saw_exit);
    }

    #[tokio::test]
    async fn test_missing_container_fails_startup() {
        let (_tx, rx) = broadcast::channel(1);
        let host = HeadlessHost::with_anchors([Anchor::Template, Anchor::ProgressBar]);
        let result = ToasterService::new(&Settings::default(), Arc::new(host), rx);
        assert!(matches!(result, Err(ToastError::MissingAnchor(_))));
    }
}
