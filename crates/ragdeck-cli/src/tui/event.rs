//! Event handling for the TUI.

use std::time::Duration;

use crossterm::event::{KeyEvent, KeyEventKind, MouseEvent};
use futures::{FutureExt, StreamExt};
use ragdeck_core::api::{Document, HealthStatus};
use ragdeck_core::graph::GraphData;
use ragdeck_core::session::SessionEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Events that can occur in the application.
#[derive(Debug, Clone)]
pub enum Event {
    /// A key was pressed
    Key(KeyEvent),
    /// Mouse input (clicks select graph nodes)
    Mouse(MouseEvent),
    /// The terminal was resized
    Resize(u16, u16),
    /// A tick occurred (for animations/updates)
    Tick,
    /// Progress of the query behind transcript entry `id`
    Session { id: Uuid, event: SessionEvent },
    /// A graph fetch finished
    GraphLoaded(Result<GraphData, String>),
    /// A health check finished
    Health(HealthStatus),
    /// A document list fetch finished
    Documents(Result<Vec<Document>, String>),
    /// An upload finished; `Ok` carries the backend message
    Uploaded(Result<String, String>),
    /// A delete finished
    Deleted(Result<String, String>),
}

/// Handles events from various sources.
///
/// Terminal input and ticks come from one spawned task, which is aborted
/// when the handler is dropped.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    tx: mpsc::UnboundedSender<Event>,
    task: JoinHandle<()>,
}

impl EventHandler {
    /// Create a new event handler.
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();

        let task = tokio::spawn(async move {
            let mut reader = crossterm::event::EventStream::new();
            let mut interval = tokio::time::interval(tick_rate);

            loop {
                let crossterm_event = reader.next().fuse();
                let tick = interval.tick();

                let event = tokio::select! {
                    maybe_event = crossterm_event => match maybe_event {
                        Some(Ok(crossterm::event::Event::Key(key)))
                            if key.kind == KeyEventKind::Press => Event::Key(key),
                        Some(Ok(crossterm::event::Event::Mouse(mouse))) => Event::Mouse(mouse),
                        Some(Ok(crossterm::event::Event::Resize(w, h))) => Event::Resize(w, h),
                        Some(_) => continue,
                        None => break,
                    },
                    _ = tick => Event::Tick,
                };

                if event_tx.send(event).is_err() {
                    break;
                }
            }
        });

        Self { rx, tx, task }
    }

    /// Get the next event.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Get the sender for events produced by background work.
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        self.task.abort();
    }
}
