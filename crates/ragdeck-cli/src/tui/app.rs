//! Application state and main event loop.

use std::io::Stdout;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Position;
use ratatui::prelude::*;
use tokio::sync::mpsc;
use uuid::Uuid;

use ragdeck_core::api::{Document, HealthStatus, QueryMode, RagApi, UploadKind};
use ragdeck_core::graph::{AdapterOptions, GraphData, GraphNode, NetworkView};
use ragdeck_core::session::{QueryController, QueryMetrics, SessionEvent, Transcript};
use ragdeck_core::{validate_upload, Config};

use super::commands::SlashCommand;
use super::components::backdrop::Backdrop;
use super::event::{Event, EventHandler};
use super::ui;

/// Physics steps run per tick while the graph settles.
const LAYOUT_STEPS_PER_TICK: usize = 25;

/// Oldest notices are dropped beyond this.
const NOTICE_HISTORY: usize = 50;

/// The selected tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectedTab {
    #[default]
    Chat,
    Graph,
    Documents,
}

impl SelectedTab {
    pub const ALL: [SelectedTab; 3] = [Self::Chat, Self::Graph, Self::Documents];

    pub fn next(self) -> Self {
        match self {
            Self::Chat => Self::Graph,
            Self::Graph => Self::Documents,
            Self::Documents => Self::Chat,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Self::Chat => Self::Documents,
            Self::Graph => Self::Chat,
            Self::Documents => Self::Graph,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Chat => "Chat",
            Self::Graph => "Graph",
            Self::Documents => "Documents",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Chat => 0,
            Self::Graph => 1,
            Self::Documents => 2,
        }
    }
}

/// Input mode for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// A transient message shown in the status bar.
#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
    pub expires_at: Instant,
}

/// Main application state.
pub struct App {
    pub config: Config,
    api: Arc<dyn RagApi>,
    controller: QueryController<Arc<dyn RagApi>>,
    /// Currently selected tab
    pub selected_tab: SelectedTab,
    /// Current input mode
    pub input_mode: InputMode,
    /// Input buffer for user typing
    pub input_buffer: String,
    /// Chat history
    pub transcript: Transcript,
    /// Retrieval mode for the next query
    pub mode: QueryMode,
    /// Whether the next query streams
    pub stream: bool,
    /// Transcript entry of the query in flight, set before its task starts
    in_flight: Option<Uuid>,
    /// Metrics of the last completed query
    pub last_metrics: Option<QueryMetrics>,
    /// Last graph successfully fetched
    pub graph: Option<GraphData>,
    /// Rendering lifecycle of the graph
    pub view: NetworkView,
    pub graph_options: AdapterOptions,
    pub graph_loading: bool,
    /// Side panel on the chat tab
    pub show_graph_panel: bool,
    /// Node picked with the mouse
    pub selected_node: Option<GraphNode>,
    pub documents: Vec<Document>,
    pub documents_loading: bool,
    pub doc_selected: usize,
    pub health: Option<HealthStatus>,
    last_health_check: Option<Instant>,
    /// Every notice raised this session, newest last
    pub notices: Vec<Notice>,
    pub show_help: bool,
    pub backdrop: Backdrop,
    /// Screen area of the graph canvas in the last layout
    pub graph_area: Option<Rect>,
    /// Scroll offset for chat
    pub scroll_offset: usize,
    /// Whether the app should quit
    pub should_quit: bool,
}

impl App {
    /// Create a new app instance.
    pub fn new(config: Config, api: Arc<dyn RagApi>) -> Self {
        let view = NetworkView::new(config.graph.physics.clone(), 0.0, 0.0);
        Self {
            controller: QueryController::new(Arc::clone(&api)),
            api,
            selected_tab: SelectedTab::Chat,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            transcript: Transcript::new(),
            mode: config.query.mode,
            stream: config.query.stream,
            in_flight: None,
            last_metrics: None,
            graph: None,
            view,
            graph_options: config.graph.adapter_options(),
            graph_loading: false,
            show_graph_panel: true,
            selected_node: None,
            documents: Vec::new(),
            documents_loading: false,
            doc_selected: 0,
            health: None,
            last_health_check: None,
            notices: Vec::new(),
            show_help: false,
            backdrop: Backdrop::default(),
            graph_area: None,
            scroll_offset: 0,
            should_quit: false,
            config,
        }
    }

    /// Run the main event loop.
    pub async fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut events = EventHandler::new(Duration::from_millis(self.config.ui.tick_rate_ms));
        let tx = events.sender();

        let size = terminal.size()?;
        self.layout_changed(Rect::new(0, 0, size.width, size.height));

        self.spawn_health_check(&tx);
        self.spawn_graph_fetch(&tx);
        self.spawn_documents_fetch(&tx);

        loop {
            terminal.draw(|frame| ui::render(self, frame))?;
            self.view.mark_drawn();

            if let Some(event) = events.next().await {
                self.handle_event(event, &tx);
            }

            if self.should_quit {
                break;
            }
        }

        // Dropping the handler aborts the input/tick task; the view goes with
        // the app.
        drop(events);
        self.view.destroy();
        Ok(())
    }

    /// Apply one event to the state.
    pub fn handle_event(&mut self, event: Event, tx: &mpsc::UnboundedSender<Event>) {
        match event {
            Event::Key(key) => self.handle_key_event(key, tx),
            Event::Mouse(mouse) => self.handle_mouse_event(mouse),
            Event::Resize(width, height) => self.layout_changed(Rect::new(0, 0, width, height)),
            Event::Tick => self.on_tick(tx),
            Event::Session { id, event } => self.handle_session_event(id, event),
            Event::GraphLoaded(result) => self.handle_graph_loaded(result),
            Event::Health(health) => self.health = Some(health),
            Event::Documents(result) => {
                self.documents_loading = false;
                match result {
                    Ok(docs) => {
                        self.documents = docs;
                        self.doc_selected = self.doc_selected.min(self.documents.len().saturating_sub(1));
                    }
                    Err(e) => self.notify_error(format!("Could not load documents: {e}")),
                }
            }
            Event::Uploaded(result) => match result {
                Ok(message) => {
                    self.notify(format!("Upload accepted: {message}"));
                    self.spawn_documents_fetch(tx);
                }
                Err(e) => self.notify_error(format!("Upload failed: {e}")),
            },
            Event::Deleted(result) => match result {
                Ok(message) => {
                    self.notify(message);
                    self.spawn_documents_fetch(tx);
                    self.spawn_graph_fetch(tx);
                }
                Err(e) => self.notify_error(format!("Delete failed: {e}")),
            },
        }
    }

    fn on_tick(&mut self, tx: &mpsc::UnboundedSender<Event>) {
        self.backdrop.advance();

        for _ in 0..LAYOUT_STEPS_PER_TICK {
            if self.view.tick() {
                break;
            }
        }

        let interval = Duration::from_secs(self.config.ui.health_interval_secs);
        if self
            .last_health_check
            .is_some_and(|last| last.elapsed() >= interval)
        {
            self.spawn_health_check(tx);
        }
    }

    /// Recompute screen regions after a resize.
    pub fn layout_changed(&mut self, area: Rect) {
        self.backdrop.resize(area.width);
        self.graph_area = ui::graph_canvas_area(self, area);
        match self.graph_area {
            Some(canvas) => {
                let (width, height) = surface_size(canvas);
                self.view.resize(width, height);
            }
            None => self.view.resize(0.0, 0.0),
        }
    }

    // =========================================================================
    // Notices
    // =========================================================================

    pub fn notify(&mut self, text: impl Into<String>) {
        self.push_notice(text.into(), NoticeKind::Info);
    }

    pub fn notify_error(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::warn!(notice = %text, "error shown to user");
        self.push_notice(text, NoticeKind::Error);
    }

    fn push_notice(&mut self, text: String, kind: NoticeKind) {
        if self.notices.len() >= NOTICE_HISTORY {
            self.notices.remove(0);
        }
        self.notices.push(Notice {
            text,
            kind,
            expires_at: Instant::now() + Duration::from_secs(self.config.ui.notice_secs),
        });
    }

    /// The notice to show right now, if any.
    pub fn current_notice(&self) -> Option<&Notice> {
        self.notices
            .last()
            .filter(|n| n.expires_at > Instant::now())
    }

    // =========================================================================
    // Background Work
    // =========================================================================

    fn spawn_health_check(&mut self, tx: &mpsc::UnboundedSender<Event>) {
        self.last_health_check = Some(Instant::now());
        let api = Arc::clone(&self.api);
        let tx = tx.clone();
        tokio::spawn(async move {
            let health = api.check_health().await;
            let _ = tx.send(Event::Health(health));
        });
    }

    fn spawn_graph_fetch(&mut self, tx: &mpsc::UnboundedSender<Event>) {
        if self.graph_loading {
            return;
        }
        self.graph_loading = true;
        let api = Arc::clone(&self.api);
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_graph().await.map_err(|e| e.to_string());
            let _ = tx.send(Event::GraphLoaded(result));
        });
    }

    fn spawn_documents_fetch(&mut self, tx: &mpsc::UnboundedSender<Event>) {
        self.documents_loading = true;
        let api = Arc::clone(&self.api);
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = api
                .list_documents()
                .await
                .map(|response| response.data.unwrap_or_default())
                .map_err(|e| e.to_string());
            let _ = tx.send(Event::Documents(result));
        });
    }

    fn spawn_upload(&mut self, files: Vec<PathBuf>, kind: UploadKind, tx: &mpsc::UnboundedSender<Event>) {
        let files = match validate_upload(&files, &self.config.upload) {
            Ok(files) => files,
            Err(e) => {
                self.notify_error(e.to_string());
                return;
            }
        };

        self.notify(format!("Uploading {} file(s)...", files.len()));
        let api = Arc::clone(&self.api);
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = api
                .upload_files(&files, kind)
                .await
                .map(|response| response.message_or_default().to_string())
                .map_err(|e| e.to_string());
            let _ = tx.send(Event::Uploaded(result));
        });
    }

    fn spawn_delete(&mut self, doc_id: String, tx: &mpsc::UnboundedSender<Event>) {
        let api = Arc::clone(&self.api);
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = api
                .delete_document(&doc_id)
                .await
                .map(|_| format!("Deleted {doc_id}"))
                .map_err(|e| e.to_string());
            let _ = tx.send(Event::Deleted(result));
        });
    }

    /// Send the input as a query, tracked by a new transcript entry.
    fn submit_query(&mut self, query: String, tx: &mpsc::UnboundedSender<Event>) {
        if query.trim().is_empty() {
            self.notify_error("Query must not be empty");
            return;
        }
        if self.is_query_running() {
            self.notify_error("A query is already running");
            return;
        }

        let id = self.transcript.begin(query.clone());
        self.in_flight = Some(id);
        self.scroll_offset = 0;

        let controller = self.controller.clone();
        let (mode, stream) = (self.mode, self.stream);
        let tx = tx.clone();
        tokio::spawn(async move {
            let (session_tx, mut session_rx) = mpsc::unbounded_channel();
            let forward_tx = tx.clone();
            let forward = tokio::spawn(async move {
                while let Some(event) = session_rx.recv().await {
                    if forward_tx.send(Event::Session { id, event }).is_err() {
                        break;
                    }
                }
            });

            let result = controller.submit(&query, mode, stream, Some(session_tx)).await;
            let _ = forward.await;

            // Rejections happen before any event is emitted.
            if let Err(e @ (ragdeck_core::SessionError::EmptyQuery | ragdeck_core::SessionError::Busy)) = result {
                let _ = tx.send(Event::Session {
                    id,
                    event: SessionEvent::Failed {
                        message: e.to_string(),
                        partial: String::new(),
                    },
                });
            }
        });
    }

    // =========================================================================
    // Event Handlers
    // =========================================================================

    fn handle_session_event(&mut self, id: Uuid, event: SessionEvent) {
        match event {
            SessionEvent::Chunk { response, .. } => {
                self.transcript.apply_response(id, response);
            }
            SessionEvent::Completed(exchange) => {
                self.finish_in_flight(id);
                self.transcript.finish(id, Some(exchange.metrics));
                self.last_metrics = Some(exchange.metrics);
            }
            SessionEvent::Failed { message, .. } => {
                self.finish_in_flight(id);
                self.transcript.fail(id, message.clone());
                self.notify_error(message);
            }
        }
    }

    fn finish_in_flight(&mut self, id: Uuid) {
        if self.in_flight == Some(id) {
            self.in_flight = None;
        }
    }

    /// A failed fetch keeps the previous graph on screen.
    fn handle_graph_loaded(&mut self, result: Result<GraphData, String>) {
        self.graph_loading = false;
        match result {
            Ok(data) => {
                self.selected_node = None;
                self.graph = Some(data.clone());
                if let Err(e) = self.view.update(data, self.graph_options) {
                    self.notify_error(format!("Could not render graph: {e}"));
                }
            }
            Err(e) => self.notify_error(format!("Could not load graph: {e}")),
        }
    }

    fn set_graph_options(&mut self, options: AdapterOptions) {
        self.graph_options = options;
        let data = self.graph.clone().unwrap_or_default();
        self.selected_node = None;
        if let Err(e) = self.view.update(data, options) {
            self.notify_error(format!("Could not render graph: {e}"));
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent, tx: &mpsc::UnboundedSender<Event>) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        if self.show_help {
            self.show_help = false;
            return;
        }
        match self.input_mode {
            InputMode::Normal => self.handle_normal_mode_key(key, tx),
            InputMode::Editing => self.handle_editing_mode_key(key, tx),
        }
    }

    /// Handle key in normal mode.
    fn handle_normal_mode_key(&mut self, key: KeyEvent, tx: &mpsc::UnboundedSender<Event>) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab | KeyCode::Right => {
                self.selected_tab = self.selected_tab.next();
                self.layout_changed_current();
            }
            KeyCode::BackTab | KeyCode::Left => {
                self.selected_tab = self.selected_tab.previous();
                self.layout_changed_current();
            }
            KeyCode::Char('1') => self.select_tab(SelectedTab::Chat),
            KeyCode::Char('2') => self.select_tab(SelectedTab::Graph),
            KeyCode::Char('3') => self.select_tab(SelectedTab::Documents),
            KeyCode::Char('i') | KeyCode::Enter => {
                self.input_mode = InputMode::Editing;
            }
            KeyCode::Char('m') => {
                self.mode = self.mode.next();
                self.notify(format!("Mode: {}", self.mode));
            }
            KeyCode::Char('s') => {
                self.stream = !self.stream;
                self.notify(if self.stream { "Streaming on" } else { "Streaming off" });
            }
            KeyCode::Char('?') => self.show_help = true,
            code => match self.selected_tab {
                SelectedTab::Chat => self.handle_chat_key(code),
                SelectedTab::Graph => self.handle_graph_key(code, tx),
                SelectedTab::Documents => self.handle_documents_key(code, tx),
            },
        }
    }

    fn handle_chat_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.scroll_offset = self.scroll_offset.saturating_add(1);
            }
            KeyCode::Char('g') => {
                self.show_graph_panel = !self.show_graph_panel;
                self.layout_changed_current();
            }
            _ => {}
        }
    }

    fn handle_graph_key(&mut self, code: KeyCode, tx: &mpsc::UnboundedSender<Event>) {
        match code {
            KeyCode::Char('r') => self.spawn_graph_fetch(tx),
            KeyCode::Char('l') => self.set_graph_options(AdapterOptions {
                show_labels: !self.graph_options.show_labels,
                ..self.graph_options
            }),
            KeyCode::Char('h') => self.set_graph_options(AdapterOptions {
                hide_isolated: !self.graph_options.hide_isolated,
                ..self.graph_options
            }),
            KeyCode::Esc => self.selected_node = None,
            _ => {}
        }
    }

    fn handle_documents_key(&mut self, code: KeyCode, tx: &mpsc::UnboundedSender<Event>) {
        match code {
            KeyCode::Char('r') => self.spawn_documents_fetch(tx),
            KeyCode::Char('j') | KeyCode::Down => {
                if self.doc_selected + 1 < self.documents.len() {
                    self.doc_selected += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.doc_selected = self.doc_selected.saturating_sub(1);
            }
            _ => {}
        }
    }

    /// Handle key in editing mode.
    fn handle_editing_mode_key(&mut self, key: KeyEvent, tx: &mpsc::UnboundedSender<Event>) {
        match key.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Enter => {
                self.submit_input(tx);
            }
            KeyCode::Char(c) => {
                self.input_buffer.push(c);
            }
            KeyCode::Backspace => {
                self.input_buffer.pop();
            }
            _ => {}
        }
    }

    /// Submit the current input as a query or slash command.
    fn submit_input(&mut self, tx: &mpsc::UnboundedSender<Event>) {
        if SlashCommand::is_command(&self.input_buffer) {
            let input = std::mem::take(&mut self.input_buffer);
            match SlashCommand::parse(&input) {
                Ok(command) => self.run_command(command, tx),
                Err(e) => self.notify_error(e.to_string()),
            }
            self.input_mode = InputMode::Normal;
            return;
        }

        // The submit control is disabled while a query runs; keep the text.
        if self.is_query_running() {
            self.notify_error("A query is already running");
            return;
        }

        let input = std::mem::take(&mut self.input_buffer);
        self.submit_query(input, tx);
        self.input_mode = InputMode::Normal;
    }

    fn run_command(&mut self, command: SlashCommand, tx: &mpsc::UnboundedSender<Event>) {
        match command {
            SlashCommand::Upload(files) => self.spawn_upload(files, UploadKind::Initial, tx),
            SlashCommand::UploadIncremental(files) => {
                self.spawn_upload(files, UploadKind::Incremental, tx)
            }
            SlashCommand::Delete(doc_id) => self.spawn_delete(doc_id, tx),
            SlashCommand::Refresh => self.spawn_graph_fetch(tx),
            SlashCommand::Docs => {
                self.select_tab(SelectedTab::Documents);
                self.spawn_documents_fetch(tx);
            }
            SlashCommand::Help => self.show_help = true,
        }
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let Some(area) = self.graph_area else {
            return;
        };
        if !area.contains(Position::new(mouse.column, mouse.row)) {
            return;
        }

        let (x, y) = cell_to_surface(area, mouse.column, mouse.row);
        let mut picked = None;
        if self.view.click(x, y, |node| picked = Some(node.clone())) {
            self.selected_node = picked;
        }
    }

    fn select_tab(&mut self, tab: SelectedTab) {
        self.selected_tab = tab;
        self.layout_changed_current();
    }

    /// Re-run the layout for the current terminal size after a tab or panel
    /// change moved the graph canvas.
    fn layout_changed_current(&mut self) {
        if let Ok((width, height)) = crossterm::terminal::size() {
            self.layout_changed(Rect::new(0, 0, width, height));
        }
    }

    pub fn is_query_running(&self) -> bool {
        self.in_flight.is_some() || self.controller.is_busy()
    }
}

/// Surface size of a canvas area. Terminal cells are about twice as tall as
/// wide, so rows count double.
pub fn surface_size(area: Rect) -> (f64, f64) {
    (area.width as f64, area.height as f64 * 2.0)
}

/// Center of a terminal cell in surface coordinates.
pub fn cell_to_surface(area: Rect, column: u16, row: u16) -> (f64, f64) {
    let x = (column - area.x) as f64 + 0.5;
    let y = ((row - area.y) as f64 + 0.5) * 2.0;
    (x, y)
}
