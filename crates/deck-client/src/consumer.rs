use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message, client::IntoClientRequest};
use tokio_util::sync::CancellationToken;
use url::Url;

use podium_deck_interface::StreamEvent;

use crate::backoff::ReconnectPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Reconnecting { attempt: u32, retry_in: Duration },
    Closed,
}

/// Where a consumer connects, plus the optional presenter credential.
#[derive(Debug, Clone)]
pub struct StreamTarget {
    url: Url,
    bearer: Option<String>,
}

impl StreamTarget {
    pub fn new(url: Url) -> Self {
        Self { url, bearer: None }
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn bearer(&self) -> Option<&str> {
        self.bearer.as_deref()
    }

    fn request(&self) -> Result<tungstenite::handshake::client::Request, tungstenite::Error> {
        let mut request = self.url.as_str().into_client_request()?;
        if let Some(token) = &self.bearer {
            let value = format!("Bearer {token}")
                .parse()
                .map_err(|e| tungstenite::Error::HttpFormat(tungstenite::http::Error::from(e)))?;
            request.headers_mut().insert("authorization", value);
        }
        Ok(request)
    }
}

/// Append-only log of received events. Readers keep their own cursor.
#[derive(Debug)]
pub struct EventLog {
    events: Mutex<Vec<StreamEvent>>,
    len_tx: watch::Sender<usize>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            len_tx: watch::Sender::new(0),
        }
    }
}

impl EventLog {
    fn entries(&self) -> MutexGuard<'_, Vec<StreamEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn push(&self, event: StreamEvent) {
        let len = {
            let mut events = self.entries();
            events.push(event);
            events.len()
        };
        self.len_tx.send_replace(len);
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries at and after `cursor`. A cursor past the end yields nothing.
    pub fn since(&self, cursor: usize) -> Vec<StreamEvent> {
        let events = self.entries();
        events.get(cursor..).map(<[_]>::to_vec).unwrap_or_default()
    }

    /// Waits until the log holds more than `cursor` entries.
    pub async fn changed(&self, cursor: usize) {
        let mut rx = self.len_tx.subscribe();
        let _ = rx.wait_for(|len| *len > cursor).await;
    }
}

enum SessionEnd {
    Disconnected,
    Cancelled,
}

/// Background listener for one deck stream.
///
/// Exactly one connection attempt is in flight at a time. Network failures
/// never surface to the caller; they show up in [`ConnectionStatus`].
pub struct StreamConsumer {
    log: Arc<EventLog>,
    status: watch::Receiver<ConnectionStatus>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl StreamConsumer {
    pub fn connect(target: StreamTarget, policy: ReconnectPolicy) -> Self {
        let log = Arc::new(EventLog::default());
        let (status_tx, status) = watch::channel(ConnectionStatus::Connecting);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run(
            target,
            policy,
            log.clone(),
            status_tx,
            cancel.clone(),
        ));

        Self {
            log,
            status,
            cancel,
            task: Mutex::new(Some(task)),
        }
    }

    pub fn events(&self) -> &Arc<EventLog> {
        &self.log
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status.borrow().clone()
    }

    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    pub fn is_connected(&self) -> bool {
        matches!(*self.status.borrow(), ConnectionStatus::Connected)
    }

    /// Stops the listener and waits for it. Safe to call repeatedly.
    pub async fn teardown(&self) {
        self.cancel.cancel();

        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(task) = task
            && let Err(e) = task.await
            && e.is_panic()
        {
            tracing::error!(error = %e, "deck_stream_task_panicked");
        }
    }
}

impl Drop for StreamConsumer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    target: StreamTarget,
    policy: ReconnectPolicy,
    log: Arc<EventLog>,
    status: watch::Sender<ConnectionStatus>,
    cancel: CancellationToken,
) {
    let mut delays = policy.backoff();
    let mut attempt: u32 = 0;

    loop {
        if attempt == 0 {
            status.send_replace(ConnectionStatus::Connecting);
        }

        let connected = match target.request() {
            Ok(request) => tokio::select! {
                _ = cancel.cancelled() => break,
                result = tokio_tungstenite::connect_async(request) => result,
            },
            Err(e) => Err(e),
        };

        match connected {
            Ok((ws, _)) => {
                attempt = 0;
                delays = policy.backoff();
                status.send_replace(ConnectionStatus::Connected);
                tracing::info!(url = %target.url, "deck_stream_connected");

                match pump(ws, &log, &cancel).await {
                    SessionEnd::Cancelled => break,
                    SessionEnd::Disconnected => {
                        tracing::warn!(url = %target.url, "deck_stream_disconnected");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(url = %target.url, error = %e, attempt, "deck_stream_connect_failed");
            }
        }

        attempt = attempt.saturating_add(1);
        let retry_in = delays.next().unwrap_or(policy.max);
        status.send_replace(ConnectionStatus::Reconnecting { attempt, retry_in });

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(retry_in) => {}
        }
    }

    status.send_replace(ConnectionStatus::Closed);
    tracing::info!(url = %target.url, "deck_stream_closed");
}

async fn pump<S>(
    mut ws: tokio_tungstenite::WebSocketStream<S>,
    log: &EventLog,
    cancel: &CancellationToken,
) -> SessionEnd
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = ws.close(None).await;
                return SessionEnd::Cancelled;
            }
            msg = ws.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<StreamEvent>(text.as_str()) {
                        Ok(event) => log.push(event),
                        Err(e) => tracing::warn!(error = %e, payload = %text.as_str(), "deck_stream_invalid_event"),
                    }
                }
                Some(Ok(Message::Close(_))) | None => return SessionEnd::Disconnected,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(error = %e, "deck_stream_read_failed");
                    return SessionEnd::Disconnected;
                }
            }
        }
    }
}
