use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{Local, NaiveDate};
use crossterm::{event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind}, execute, terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen}};
use ratatui::{backend::CrosstermBackend, Terminal, widgets::{Block, Borders, List, ListItem, Paragraph, ListState, Wrap}, layout::{Layout, Constraint, Direction}, style::{Style, Modifier, Color}};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use todo_sim::{
    telemetry, Ack, ConfiguredFailure, CreateTodo, DateRange, Envelope, InMemoryTodoRepository, SimulatedTodoService,
    SimulationConfig, Subtask, SubtaskDraft, Todo, TodoFilter, TodoId, TodoResult, TodoService, UpdateTodo,
};

type Service = SimulatedTodoService<InMemoryTodoRepository, ConfiguredFailure>;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    if let Ok(path) = std::env::var("TODO_LOG_FILE") {
        telemetry::init_file(&PathBuf::from(path))?;
    }
    let config = SimulationConfig::from_env()?;
    tracing::info!(?config, "starting");
    let service = Arc::new(SimulatedTodoService::from_config(InMemoryTodoRepository::seeded(), &config));

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, service).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    res
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode { View, Create, Edit, Search, Range, ConfirmDelete }

#[derive(Clone, Copy, PartialEq, Eq)]
enum ActiveField { Title, Description, Subtasks, DueDate }

impl ActiveField {
    fn next(self) -> Self {
        match self {
            ActiveField::Title => ActiveField::Description,
            ActiveField::Description => ActiveField::Subtasks,
            ActiveField::Subtasks => ActiveField::DueDate,
            ActiveField::DueDate => ActiveField::Title,
        }
    }

    fn label(self) -> &'static str {
        match self {
            ActiveField::Title => "Title",
            ActiveField::Description => "Description",
            ActiveField::Subtasks => "Subtasks (;-separated)",
            ActiveField::DueDate => "Due (YYYY-MM-DD)",
        }
    }
}

/// Completed boundary call, tagged with the generation it was issued under.
enum Outcome {
    Loaded(u64, TodoResult<Envelope<Vec<Todo>>>),
    Saved(TodoResult<Envelope<Todo>>),
    Deleted(TodoId, TodoResult<Ack>),
}

#[derive(Default)]
struct Draft { title: String, description: String, subtasks: String, due: String }

impl Draft {
    fn from_todo(todo: &Todo) -> Self {
        Self {
            title: todo.title.clone(),
            description: todo.description.clone(),
            subtasks: todo.subtasks.iter().map(|s| s.text.as_str()).collect::<Vec<_>>().join("; "),
            due: todo.due_date.map(|d| d.to_string()).unwrap_or_default(),
        }
    }

    fn field_mut(&mut self, field: ActiveField) -> &mut String {
        match field {
            ActiveField::Title => &mut self.title,
            ActiveField::Description => &mut self.description,
            ActiveField::Subtasks => &mut self.subtasks,
            ActiveField::DueDate => &mut self.due,
        }
    }

    fn field(&self, field: ActiveField) -> &str {
        match field {
            ActiveField::Title => &self.title,
            ActiveField::Description => &self.description,
            ActiveField::Subtasks => &self.subtasks,
            ActiveField::DueDate => &self.due,
        }
    }

    fn subtask_texts(&self) -> Vec<String> {
        self.subtasks.split(';').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
    }

    fn due_date(&self) -> Result<Option<NaiveDate>, String> {
        let due = self.due.trim();
        if due.is_empty() { return Ok(None); }
        NaiveDate::parse_from_str(due, "%Y-%m-%d").map(Some).map_err(|_| format!("invalid due date `{due}`"))
    }
}

struct App {
    service: Arc<Service>,
    tx: UnboundedSender<Outcome>,
    todos: Vec<Todo>,
    visible: Vec<Todo>,
    selected: usize,
    last_tick: Instant,
    mode: Mode,
    list_state: ListState,
    filter: TodoFilter,
    field: ActiveField,
    draft: Draft,
    editing: Option<TodoId>,
    input: String,
    in_flight: usize,
    load_generation: u64,
    error: Option<String>,
    notice: Option<String>,
}

impl App {
    fn dispatch<Fut>(&mut self, fut: Fut)
    where
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(fut.await);
        });
    }

    fn load(&mut self) {
        self.load_generation += 1;
        let generation = self.load_generation;
        let service = self.service.clone();
        self.error = None;
        self.dispatch(async move { Outcome::Loaded(generation, service.get_all().await) });
    }

    fn apply(&mut self, outcome: Outcome) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match outcome {
            // A newer reload superseded this one.
            Outcome::Loaded(generation, _) if generation < self.load_generation => {}
            Outcome::Loaded(_, Ok(envelope)) => self.todos = envelope.payload,
            Outcome::Saved(Ok(envelope)) => {
                let todo = envelope.payload;
                match self.todos.iter_mut().find(|t| t.id == todo.id) {
                    Some(slot) => *slot = todo,
                    None => self.todos.push(todo),
                }
                self.notice = Some(envelope.message);
            }
            Outcome::Deleted(id, Ok(ack)) => {
                self.todos.retain(|t| t.id != id);
                self.notice = Some(ack.message);
            }
            Outcome::Loaded(_, Err(e)) | Outcome::Saved(Err(e)) | Outcome::Deleted(_, Err(e)) => {
                tracing::warn!(error = %e, "request failed");
                self.error = Some(e.to_string());
            }
        }
        self.recompute_filtered();
    }

    fn recompute_filtered(&mut self) {
        self.visible = self.filter.apply(&self.todos);
        // Clamp selection within filtered bounds
        let len = self.visible.len();
        if len == 0 { self.selected = 0; self.list_state.select(None); }
        else { if self.selected >= len { self.selected = len - 1; } self.list_state.select(Some(self.selected)); }
    }

    fn current(&self) -> Option<&Todo> { self.visible.get(self.selected) }

    fn toggle_complete(&mut self) {
        let Some(todo) = self.current() else { return };
        let (id, completed) = (todo.id.clone(), !todo.completed);
        let service = self.service.clone();
        self.dispatch(async move { Outcome::Saved(service.update(id, UpdateTodo::completed(completed)).await) });
    }

    fn toggle_subtask(&mut self, index: usize) {
        let Some(todo) = self.current() else { return };
        if index >= todo.subtasks.len() { return; }
        let id = todo.id.clone();
        let drafts: Vec<SubtaskDraft> = todo
            .subtasks
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let mut d = SubtaskDraft::from(s);
                if i == index { d.completed = !d.completed; }
                d
            })
            .collect();
        let service = self.service.clone();
        self.dispatch(async move { Outcome::Saved(service.update(id, UpdateTodo::subtasks(drafts)).await) });
    }

    fn delete_current(&mut self) {
        let Some(todo) = self.current() else { return };
        let id = todo.id.clone();
        let service = self.service.clone();
        self.dispatch(async move {
            let result = service.delete(id.clone()).await;
            Outcome::Deleted(id, result)
        });
    }

    fn submit_draft(&mut self) {
        let due = match self.draft.due_date() {
            Ok(due) => due,
            Err(message) => { self.error = Some(message); return; }
        };
        let service = self.service.clone();
        match self.editing.clone() {
            None => {
                let mut input = CreateTodo::new(self.draft.title.clone(), self.draft.description.clone())
                    .with_subtasks(self.draft.subtask_texts());
                input.due_date = due;
                if let Err(e) = input.clone().validate() { self.error = Some(e.to_string()); return; }
                self.dispatch(async move { Outcome::Saved(service.create(input).await) });
            }
            Some(id) => {
                let existing = self.todos.iter().find(|t| t.id == id).map(|t| t.subtasks.clone()).unwrap_or_default();
                let subtasks = rebind_subtasks(&existing, self.draft.subtask_texts());
                let patch = UpdateTodo {
                    title: Some(self.draft.title.clone()),
                    description: Some(self.draft.description.clone()),
                    completed: None,
                    subtasks: Some(subtasks),
                    due_date: Some(due),
                };
                if let Err(e) = patch.clone().validate() { self.error = Some(e.to_string()); return; }
                self.dispatch(async move { Outcome::Saved(service.update(id, patch).await) });
            }
        }
        self.mode = Mode::View;
        self.editing = None;
        self.draft = Draft::default();
    }

    fn filter_summary(&self) -> String {
        let range = match &self.filter.date_range {
            None => "any".to_string(),
            Some(r) => format!(
                "{}..{}",
                r.start.map(|d| d.to_string()).unwrap_or_default(),
                r.end.map(|d| d.to_string()).unwrap_or_default()
            ),
        };
        format!("search=\"{}\"  status={}  due={}", self.filter.query, self.filter.status.label(), range)
    }
}

/// Maps edited subtask texts back onto the todo's existing subtasks.
///
/// Each existing subtask is claimed at most once: exact text matches first,
/// then the subtask at the same position, so an edited text keeps its id and
/// completion. Anything left over becomes a new subtask.
fn rebind_subtasks(existing: &[Subtask], texts: Vec<String>) -> Vec<SubtaskDraft> {
    let mut claimed = vec![false; existing.len()];
    let mut slots: Vec<Option<usize>> = texts
        .iter()
        .map(|text| {
            let hit = existing.iter().enumerate().position(|(j, s)| !claimed[j] && &s.text == text);
            if let Some(j) = hit { claimed[j] = true; }
            hit
        })
        .collect();
    for (i, slot) in slots.iter_mut().enumerate() {
        if slot.is_none() && i < existing.len() && !claimed[i] {
            claimed[i] = true;
            *slot = Some(i);
        }
    }
    texts
        .into_iter()
        .zip(slots)
        .map(|(text, slot)| match slot {
            Some(j) => SubtaskDraft { text, ..SubtaskDraft::from(&existing[j]) },
            None => SubtaskDraft::new(text),
        })
        .collect()
}

fn list_line(todo: &Todo, today: NaiveDate) -> String {
    let mark = if todo.completed { "[x]" } else { "[ ]" };
    let mut line = format!("{} {}", mark, todo.title);
    let (done, total) = todo.subtask_progress();
    if total > 0 { line.push_str(&format!("  ({done}/{total})")); }
    if let Some(due) = todo.due_date { line.push_str(&format!("  due {due}")); }
    if todo.is_overdue(today) { line.push_str("  OVERDUE"); }
    line
}

fn detail_text(todo: &Todo, today: NaiveDate) -> String {
    let status = if todo.completed { "Completed" } else if todo.is_overdue(today) { "Pending (overdue)" } else { "Pending" };
    let due = todo.due_date.map(|d| d.format("%b %-d, %Y").to_string()).unwrap_or_else(|| "(none)".to_string());
    let mut text = format!(
        "Title:\n{}\n\nStatus: {}\nDue: {}\nProgress: {}%\n\nDescription:\n{}\n",
        todo.title, status, due, todo.completion_percentage(), todo.description
    );
    if !todo.subtasks.is_empty() {
        text.push_str("\nSubtasks:\n");
        for (i, s) in todo.subtasks.iter().enumerate() {
            text.push_str(&format!("{} [{}] {}\n", i + 1, if s.completed { "x" } else { " " }, s.text));
        }
    }
    text.push_str(&format!("\nCreated: {}\nUpdated: {}", todo.created_at.format("%Y-%m-%d %H:%M"), todo.updated_at.format("%Y-%m-%d %H:%M")));
    text
}

async fn run_app(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, service: Arc<Service>) -> Result<()> {
    let tick_rate = Duration::from_millis(100);
    let (tx, mut rx): (UnboundedSender<Outcome>, UnboundedReceiver<Outcome>) = unbounded_channel();
    let mut app = App {
        service, tx, todos: vec![], visible: vec![], selected: 0, last_tick: Instant::now(), mode: Mode::View,
        list_state: ListState::default(), filter: TodoFilter::default(), field: ActiveField::Title,
        draft: Draft::default(), editing: None, input: String::new(), in_flight: 0, load_generation: 0,
        error: None, notice: None,
    };
    app.load();

    loop {
        let today = Local::now().date_naive();
        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(1),
                    Constraint::Length(3),
                    Constraint::Length(3),
                ])
                .split(f.size());

            let header = Paragraph::new("Enter: toggle  1-9: subtask  n: new  e: edit  d: delete  /: search  f: status  r: dates  c: clear  g: reload  x: dismiss  q: quit")
                .block(Block::default().borders(Borders::ALL).title("todo-sim"));
            f.render_widget(header, chunks[0]);

            let middle = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[1]);

            let list_items: Vec<ListItem> = app.visible.iter().map(|t| {
                let item = ListItem::new(list_line(t, today));
                if t.is_overdue(today) { item.style(Style::default().fg(Color::Red)) } else { item }
            }).collect();
            let empty_hint = if app.todos.is_empty() { "no todos yet" } else { "no matches" };
            let scope = if app.filter.is_active() { "filtered" } else { "all" };
            let title = if app.visible.is_empty() && app.in_flight == 0 {
                format!("todos [{}/{} {}] ({})", app.visible.len(), app.todos.len(), scope, empty_hint)
            } else {
                format!("todos [{}/{} {}]", app.visible.len(), app.todos.len(), scope)
            };
            let list = List::new(list_items)
                .block(Block::default().borders(Borders::ALL).title(title))
                .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD | Modifier::REVERSED))
                .highlight_symbol(">> ");
            f.render_stateful_widget(list, middle[0], &mut app.list_state);

            let detail = app.current().map(|t| detail_text(t, today)).unwrap_or_default();
            let details = Paragraph::new(detail)
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title("details"));
            f.render_widget(details, middle[1]);

            let input_text = match app.mode {
                Mode::View => app.filter_summary(),
                Mode::Create | Mode::Edit => format!("{}: {}_  |  (Tab to switch, Enter to save, Esc to cancel)", app.field.label(), app.draft.field(app.field)),
                Mode::Search => format!("Search: {}_  |  (Enter to apply, Esc to cancel)", app.input),
                Mode::Range => format!("Due range START..END: {}_  |  (empty clears, Enter to apply, Esc to cancel)", app.input),
                Mode::ConfirmDelete => format!("Delete \"{}\"? (y/n)", app.current().map(|t| t.title.as_str()).unwrap_or("")),
            };
            let input = Paragraph::new(input_text)
                .block(Block::default().borders(Borders::ALL).title(match app.mode {
                    Mode::View => "filters", Mode::Create => "create", Mode::Edit => "edit",
                    Mode::Search => "search", Mode::Range => "date range", Mode::ConfirmDelete => "confirm",
                }));
            f.render_widget(input, chunks[2]);

            let (status_text, status_style) = if let Some(err) = &app.error {
                (format!("Error: {err}  (x to dismiss, g to retry loading)"), Style::default().fg(Color::Red))
            } else if app.in_flight > 0 {
                (format!("Loading... ({} request(s) in flight)", app.in_flight), Style::default().fg(Color::Yellow))
            } else {
                (app.notice.clone().unwrap_or_default(), Style::default().fg(Color::Green))
            };
            let status = Paragraph::new(status_text).style(status_style)
                .block(Block::default().borders(Borders::ALL).title("status"));
            f.render_widget(status, chunks[3]);
        })?;

        while let Ok(outcome) = rx.try_recv() { app.apply(outcome); }

        let timeout = tick_rate.saturating_sub(app.last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                // Only act on key presses; ignore repeats and releases to prevent duplicate input
                if key.kind != KeyEventKind::Press { continue; }
                match app.mode {
                    Mode::View => match key.code {
                        KeyCode::Char('q') => break,
                        KeyCode::Up => { if app.selected > 0 { app.selected -= 1; app.list_state.select(Some(app.selected)); } }
                        KeyCode::Down => { if app.selected + 1 < app.visible.len() { app.selected += 1; app.list_state.select(Some(app.selected)); } }
                        KeyCode::Enter | KeyCode::Char(' ') => app.toggle_complete(),
                        KeyCode::Char(c @ '1'..='9') => app.toggle_subtask(c as usize - '1' as usize),
                        KeyCode::Char('n') => {
                            app.mode = Mode::Create;
                            app.field = ActiveField::Title;
                            app.editing = None;
                            app.draft = Draft::default();
                        }
                        KeyCode::Char('e') => {
                            if let Some(todo) = app.current() {
                                let (id, draft) = (todo.id.clone(), Draft::from_todo(todo));
                                app.mode = Mode::Edit;
                                app.field = ActiveField::Title;
                                app.editing = Some(id);
                                app.draft = draft;
                            }
                        }
                        KeyCode::Char('d') => { if app.current().is_some() { app.mode = Mode::ConfirmDelete; } }
                        KeyCode::Char('/') => { app.input = app.filter.query.clone(); app.mode = Mode::Search; }
                        KeyCode::Char('f') => { app.filter.status = app.filter.status.next(); app.recompute_filtered(); }
                        KeyCode::Char('r') => { app.input.clear(); app.mode = Mode::Range; }
                        KeyCode::Char('c') => { app.filter = TodoFilter::default(); app.recompute_filtered(); }
                        KeyCode::Char('g') => app.load(),
                        KeyCode::Char('x') => { app.error = None; app.notice = None; }
                        _ => {}
                    },
                    Mode::Create | Mode::Edit => match key.code {
                        KeyCode::Esc => { app.mode = Mode::View; app.editing = None; app.draft = Draft::default(); }
                        KeyCode::Enter => app.submit_draft(),
                        KeyCode::Backspace => { app.draft.field_mut(app.field).pop(); }
                        KeyCode::Char(c) => app.draft.field_mut(app.field).push(c),
                        KeyCode::Tab => { app.field = app.field.next(); }
                        _ => {}
                    },
                    Mode::Search => match key.code {
                        KeyCode::Esc => { app.mode = Mode::View; app.input.clear(); }
                        KeyCode::Enter => {
                            app.filter.query = std::mem::take(&mut app.input);
                            app.mode = Mode::View;
                            app.recompute_filtered();
                        }
                        KeyCode::Backspace => { app.input.pop(); }
                        KeyCode::Char(c) => app.input.push(c),
                        _ => {}
                    },
                    Mode::Range => match key.code {
                        KeyCode::Esc => { app.mode = Mode::View; app.input.clear(); }
                        KeyCode::Enter => {
                            let raw = std::mem::take(&mut app.input);
                            if raw.trim().is_empty() {
                                app.filter.date_range = None;
                            } else {
                                match DateRange::parse(&raw) {
                                    Ok(range) => app.filter.date_range = Some(range),
                                    Err(e) => app.error = Some(format!("invalid date range `{raw}`: {e}")),
                                }
                            }
                            app.mode = Mode::View;
                            app.recompute_filtered();
                        }
                        KeyCode::Backspace => { app.input.pop(); }
                        KeyCode::Char(c) => app.input.push(c),
                        _ => {}
                    },
                    Mode::ConfirmDelete => match key.code {
                        KeyCode::Char('y') | KeyCode::Enter => { app.delete_current(); app.mode = Mode::View; }
                        _ => { app.mode = Mode::View; }
                    },
                }
            }
        }
        if app.last_tick.elapsed() >= tick_rate {
            app.last_tick = Instant::now();
        }
    }
    Ok(())
}
