use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use podium_deck_interface::Role;

use crate::endpoint::ControlEndpoint;
use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishStatus {
    Idle,
    Published(u32),
    Failed(String),
    Unauthorized,
}

/// Debounces local navigation and pushes the settled slide to the control
/// endpoint. Failures are reported through [`PublishStatus`] and never
/// retried; the next navigation carries the newest index anyway.
pub struct PresenterPublisher {
    role: Role,
    tx: Option<mpsc::UnboundedSender<u32>>,
    status: watch::Receiver<PublishStatus>,
    task: Option<JoinHandle<()>>,
}

impl PresenterPublisher {
    pub fn spawn<E>(role: Role, endpoint: E, debounce: Duration) -> Self
    where
        E: ControlEndpoint + 'static,
    {
        let (status_tx, status) = watch::channel(PublishStatus::Idle);

        let (tx, task) = match role {
            Role::Presenter => {
                let (tx, rx) = mpsc::unbounded_channel();
                let task = tokio::spawn(run(rx, endpoint, debounce, status_tx));
                (Some(tx), Some(task))
            }
            Role::Viewer => (None, None),
        };

        Self {
            role,
            tx,
            status,
            task,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// No-op unless this publisher was spawned for a presenter.
    pub fn set_slide(&self, slide: u32) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(slide);
        }
    }

    pub fn status(&self) -> PublishStatus {
        self.status.borrow().clone()
    }

    pub fn watch_status(&self) -> watch::Receiver<PublishStatus> {
        self.status.clone()
    }

    /// Flushes a pending slide, if any, then stops.
    pub async fn shutdown(mut self) {
        self.tx.take();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
            && e.is_panic()
        {
            tracing::error!(error = %e, "presenter_publisher_panicked");
        }
    }
}

impl Drop for PresenterPublisher {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

async fn run<E: ControlEndpoint>(
    mut rx: mpsc::UnboundedReceiver<u32>,
    endpoint: E,
    debounce: Duration,
    status: watch::Sender<PublishStatus>,
) {
    while let Some(mut slide) = rx.recv().await {
        let deadline = tokio::time::sleep(debounce);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => break,
                next = rx.recv() => match next {
                    Some(next) => {
                        slide = next;
                        deadline.as_mut().reset(Instant::now() + debounce);
                    }
                    None => break,
                },
            }
        }

        let next_status = match endpoint.publish_slide(slide).await {
            Ok(()) => {
                tracing::debug!(slide, "slide_publish_succeeded");
                PublishStatus::Published(slide)
            }
            Err(ClientError::Unauthorized) => {
                tracing::warn!(slide, "slide_publish_unauthorized");
                PublishStatus::Unauthorized
            }
            Err(e) => {
                tracing::warn!(slide, error = %e, "slide_publish_failed");
                PublishStatus::Failed(e.to_string())
            }
        };
        status.send_replace(next_status);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct RecordingEndpoint {
        published: Arc<Mutex<Vec<u32>>>,
        reject: bool,
    }

    impl RecordingEndpoint {
        fn published(&self) -> Vec<u32> {
            self.published.lock().unwrap().clone()
        }
    }

    impl ControlEndpoint for RecordingEndpoint {
        async fn publish_slide(&self, slide: u32) -> crate::Result<()> {
            if self.reject {
                return Err(ClientError::Unauthorized);
            }
            self.published.lock().unwrap().push(slide);
            Ok(())
        }
    }

    const DEBOUNCE: Duration = Duration::from_millis(50);

    #[tokio::test(start_paused = true)]
    async fn rapid_navigation_collapses_to_final_slide() {
        let endpoint = RecordingEndpoint::default();
        let publisher = PresenterPublisher::spawn(Role::Presenter, endpoint.clone(), DEBOUNCE);

        publisher.set_slide(1);
        tokio::time::sleep(Duration::from_millis(10)).await;
        publisher.set_slide(2);
        tokio::time::sleep(Duration::from_millis(10)).await;
        publisher.set_slide(1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(endpoint.published(), vec![1]);
        assert_eq!(publisher.status(), PublishStatus::Published(1));
    }

    #[tokio::test(start_paused = true)]
    async fn separated_navigation_publishes_each() {
        let endpoint = RecordingEndpoint::default();
        let publisher = PresenterPublisher::spawn(Role::Presenter, endpoint.clone(), DEBOUNCE);

        publisher.set_slide(1);
        tokio::time::sleep(Duration::from_millis(100)).await;
        publisher.set_slide(2);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(endpoint.published(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn viewer_never_publishes() {
        let endpoint = RecordingEndpoint::default();
        let publisher = PresenterPublisher::spawn(Role::Viewer, endpoint.clone(), DEBOUNCE);

        publisher.set_slide(3);
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(endpoint.published().is_empty());
        assert_eq!(publisher.status(), PublishStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn unauthorized_is_surfaced_and_not_retried() {
        let endpoint = RecordingEndpoint {
            reject: true,
            ..Default::default()
        };
        let publisher = PresenterPublisher::spawn(Role::Presenter, endpoint.clone(), DEBOUNCE);

        publisher.set_slide(4);
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(publisher.status(), PublishStatus::Unauthorized);
        assert!(endpoint.published().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_flushes_pending_slide() {
        let endpoint = RecordingEndpoint::default();
        let publisher = PresenterPublisher::spawn(Role::Presenter, endpoint.clone(), DEBOUNCE);

        publisher.set_slide(7);
        publisher.shutdown().await;

        assert_eq!(endpoint.published(), vec![7]);
    }
}
