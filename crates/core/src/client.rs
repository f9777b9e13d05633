//! # Generation Client
//!
//! Issues the generation request and runs the read loop for its response.
//!
//! ## Architecture
//!
//! ```text
//! Caller                              Read-loop Task
//!     │                                    │
//!     ├─── start_generation ─────────────▶ │ POST request
//!     │                                    ├── chunk ─▶ frames ─▶ EventRouter
//!     │ ◀──── StreamSession (per frame) ───┤
//!     │                                    ├── ...
//!     │ ◀──── StreamSession (terminal) ────┘
//!     │
//!     └── cancel() at any point
//! ```
//!
//! Frames are handled strictly in arrival order, one at a time. There is no
//! automatic retry: a failed session is restarted by calling
//! `start_generation` again.

use crate::config::ClientConfig;
use crate::error::{GenerationError, Result};
use crate::models::GenerationRequest;
use crate::session::{EventRouter, SessionUpdate, StreamSession};
use crate::stream::frames;
use futures::{Stream, StreamExt};
use reqwest::header::ACCEPT;
use std::fmt::Display;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

/// Handle for one in-flight generation
pub struct GenerationHandle {
    /// One snapshot per processed frame
    pub updates: mpsc::Receiver<StreamSession>,
    /// Cancels the read loop
    pub cancel: CancellationToken,
    /// Resolves to the terminal session
    pub task: JoinHandle<StreamSession>,
}

impl GenerationHandle {
    /// Abandon the generation
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Stop observing and wait for the terminal session
    pub async fn finish(self) -> Result<StreamSession, JoinError> {
        let GenerationHandle { updates, task, .. } = self;
        drop(updates);
        task.await
    }
}

/// Client for the streaming generation endpoint
#[derive(Debug, Clone)]
pub struct GenerationClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl GenerationClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().connect_timeout(config.connect_timeout());
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Start a generation on a background task
    pub fn start_generation(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationHandle> {
        validate(&request)?;

        let (updates_tx, updates_rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let cancel = CancellationToken::new();

        let client = self.clone();
        let token = cancel.clone();
        let task = tokio::spawn(async move { client.run(request, updates_tx, token).await });

        Ok(GenerationHandle {
            updates: updates_rx,
            cancel,
            task,
        })
    }

    /// Run a generation to completion on the current task
    #[tracing::instrument(skip_all, fields(keyword = %request.keyword))]
    pub async fn run(
        &self,
        request: GenerationRequest,
        updates: mpsc::Sender<StreamSession>,
        cancel: CancellationToken,
    ) -> StreamSession {
        let mut router = EventRouter::new(request.ui_language);
        router.start();
        publish(&updates, &router, &cancel).await;
        tracing::info!(url = %self.config.generation_url(), "Generation started");

        let response = tokio::select! {
            _ = cancel.cancelled() => {
                router.apply(SessionUpdate::Cancelled);
                publish(&updates, &router, &cancel).await;
                return router.into_session();
            }
            response = self.send(&request) => response,
        };

        match response {
            Ok(response) => {
                consume_into(&mut router, Box::pin(response.bytes_stream()), &updates, &cancel).await
            }
            Err(e) => {
                tracing::error!(error = %e, "Generation request failed");
                router.apply(SessionUpdate::Failed(e.to_string()));
                publish(&updates, &router, &cancel).await;
            }
        }

        let session = router.into_session();
        tracing::info!(phase = ?session.phase(), view = ?session.view(), "Generation ended");
        session
    }

    async fn send(&self, request: &GenerationRequest) -> Result<reqwest::Response> {
        let response = self
            .http
            .post(self.config.generation_url())
            .header(ACCEPT, "text/event-stream")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }
        Ok(response)
    }
}

fn validate(request: &GenerationRequest) -> Result<()> {
    if request.keyword.trim().is_empty() {
        return Err(GenerationError::InvalidRequest(
            "keyword must not be empty".to_string(),
        ));
    }
    if request.target_language.trim().is_empty() {
        return Err(GenerationError::InvalidRequest(
            "target language must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Hand a snapshot to the observer
///
/// A closed or stalled observer never holds the loop: the send gives way to
/// cancellation and the snapshot is dropped.
async fn publish(
    updates: &mpsc::Sender<StreamSession>,
    router: &EventRouter,
    cancel: &CancellationToken,
) {
    tokio::select! {
        biased;
        _ = updates.send(router.session().clone()) => {}
        _ = cancel.cancelled() => {
            tracing::debug!("Dropping snapshot for cancelled generation");
        }
    }
}

/// Drive a chunk stream through a started router until the session ends
///
/// Transport errors and a body that ends before `done`/`error` both fail
/// the session. Cancellation is checked while waiting for each chunk.
pub async fn consume_into<S, B, E>(
    router: &mut EventRouter,
    chunks: S,
    updates: &mpsc::Sender<StreamSession>,
    cancel: &CancellationToken,
) where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut frames = std::pin::pin!(frames(chunks));

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Generation cancelled");
                router.apply(SessionUpdate::Cancelled);
                publish(updates, router, cancel).await;
                return;
            }
            next = frames.next() => next,
        };

        match next {
            Some(Ok(frame)) => {
                tracing::debug!(bytes = frame.len(), "Frame received");
                if router.dispatch(&frame) {
                    publish(updates, router, cancel).await;
                }
            }
            Some(Err(e)) => {
                tracing::error!(error = %e, "Stream read failed");
                router.apply(SessionUpdate::Failed(format!("transport error: {}", e)));
                publish(updates, router, cancel).await;
                return;
            }
            None => {
                if !router.session().is_terminal() {
                    tracing::warn!("Stream ended without a terminal envelope");
                    router.apply(SessionUpdate::Failed(GenerationError::StreamClosed.to_string()));
                    publish(updates, router, cancel).await;
                }
                return;
            }
        }

        if router.session().is_terminal() {
            return;
        }
    }
}

/// Run a chunk stream through a fresh session, e.g. a recorded response body
pub async fn consume_stream<S, B, E>(
    chunks: S,
    router: EventRouter,
    updates: &mpsc::Sender<StreamSession>,
    cancel: &CancellationToken,
) -> StreamSession
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut router = router;
    router.start();
    publish(updates, &router, cancel).await;
    consume_into(&mut router, chunks, updates, cancel).await;
    router.into_session()
}
