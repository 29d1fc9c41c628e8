//! Desk-side subscriber for QR check-in events
//!
//! Holds one push connection to `/events/subscribe` and, whenever a `qrcode` event
//! arrives while QR navigation is enabled, navigates to the scanned
//! student's record. The connection reconnects with backoff on its own.

use anyhow::Result;
use common::broadcast::QrScan;
use eventsource_client::{self as es, Client};
use futures_util::stream::StreamExt;
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tracing::{debug, info, warn};

/// Channel carrying badge scans
pub const QR_EVENT: &str = "qrcode";

/// Connection lifecycle of one subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        f.write_str(label)
    }
}

/// Runtime switch for following scans; read at the moment each event arrives
#[derive(Debug, Clone)]
pub struct QrNavigation(Arc<AtomicBool>);

impl QrNavigation {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.0.store(enabled, Ordering::Relaxed);
    }
}

/// Where a followed scan leads
pub trait Navigator: Send {
    fn navigate(&mut self, path: &str);
}

/// Navigator that announces the student page on the log
pub struct LogNavigator {
    base_url: String,
}

impl LogNavigator {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Navigator for LogNavigator {
    fn navigate(&mut self, path: &str) {
        info!("Opening {}{}", self.base_url, path);
    }
}

/// Page of a student record
pub fn student_path(student_id: &str) -> String {
    format!("/students/{}", student_id)
}

/// Tracks connection state and routes incoming events
pub struct Subscriber<N> {
    state: ConnectionState,
    navigation: QrNavigation,
    navigator: N,
}

impl<N: Navigator> Subscriber<N> {
    pub fn new(navigation: QrNavigation, navigator: N) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            navigation,
            navigator,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn transition(&mut self, next: ConnectionState) {
        if self.state != next {
            info!("Event stream {} -> {}", self.state, next);
            self.state = next;
        }
    }

    /// Handle one event; returns the path navigated to, if any
    pub fn on_event(&mut self, event_type: &str, data: &str) -> Option<String> {
        self.transition(ConnectionState::Connected);

        if event_type != QR_EVENT {
            debug!("Ignoring {} event", event_type);
            return None;
        }

        if !self.navigation.is_enabled() {
            debug!("QR navigation disabled, ignoring scan");
            return None;
        }

        let scan: QrScan = match serde_json::from_str(data) {
            Ok(scan) => scan,
            Err(e) => {
                warn!("Malformed {} payload: {}", QR_EVENT, e);
                return None;
            }
        };

        let path = student_path(&scan.student_id);
        self.navigator.navigate(&path);
        Some(path)
    }
}

/// Connection settings for [`listen`]
#[derive(Debug, Clone)]
pub struct ListenOptions {
    pub base_url: String,
    pub session_token: String,
    pub retry_delay: Duration,
    pub max_retry_delay: Duration,
}

/// Redirects to the login page, 401 and 403 all mean the session is gone
fn is_session_rejection(err: &es::Error) -> bool {
    match err {
        es::Error::UnexpectedResponse(status) => {
            let code = status.as_u16();
            (300..400).contains(&code) || code == 401 || code == 403
        }
        es::Error::MaxRedirectLimitReached(_) => true,
        _ => false,
    }
}

/// Follow the event stream until the server closes it for good.
///
/// Fails without retrying when the server rejects the session.
pub async fn listen<N: Navigator>(
    options: &ListenOptions,
    subscriber: &mut Subscriber<N>,
) -> Result<()> {
    let url = format!(
        "{}/events/subscribe",
        options.base_url.trim_end_matches('/')
    );

    let client = es::ClientBuilder::for_url(&url)?
        .method("POST".to_string())
        .header("Cookie", &format!("auth-session={}", options.session_token))?
        .redirect_limit(0)
        .reconnect(
            es::ReconnectOptions::reconnect(true)
                .retry_initial(true)
                .delay(options.retry_delay)
                .backoff_factor(2)
                .delay_max(options.max_retry_delay)
                .build(),
        )
        .build();

    subscriber.transition(ConnectionState::Connecting);
    let mut stream = client.stream();
    // The client retries unexpected statuses immediately; pace those here
    let mut backoff = options.retry_delay;

    loop {
        match stream.next().await {
            Some(Ok(es::SSE::Event(event))) => {
                backoff = options.retry_delay;
                subscriber.on_event(&event.event_type, &event.data);
            }
            Some(Ok(_)) => {
                // Keep-alive comment
                backoff = options.retry_delay;
                subscriber.transition(ConnectionState::Connected);
            }
            Some(Err(e)) if is_session_rejection(&e) => {
                subscriber.transition(ConnectionState::Disconnected);
                anyhow::bail!("Session rejected by the server ({}), sign in again", e);
            }
            Some(Err(es::Error::UnexpectedResponse(status))) => {
                warn!(
                    "Event stream answered {}, retrying in {:?}",
                    status, backoff
                );
                subscriber.transition(ConnectionState::Connecting);
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(options.max_retry_delay);
            }
            // A closed client reports StreamClosed on every poll
            Some(Err(es::Error::StreamClosed)) | None => {
                subscriber.transition(ConnectionState::Disconnected);
                return Ok(());
            }
            Some(Err(e)) => {
                warn!("Event stream error: {}", e);
                subscriber.transition(ConnectionState::Connecting);
            }
        }
    }
}
