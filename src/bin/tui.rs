use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind}, execute, terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen}};
use ratatui::{backend::CrosstermBackend, Terminal, widgets::{Block, Borders, List, ListItem, Paragraph, ListState}, layout::{Layout, Constraint, Direction}, style::{Style, Modifier, Color}};

use todo_list_api::{
    application::todo_item_service::{ListFilter, TodoItemService, TodoItemServiceImpl},
    config::Config,
    domain::{repository::TodoItemRepository, todo_item::{TodoItem, TodoItemId, ValidationResult}},
    infrastructure::sqlite_repo::SqliteTodoItemRepository,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    let repo = SqliteTodoItemRepository::connect(&config.database_url).await?;
    repo.init().await?;
    let service = TodoItemServiceImpl::new(repo);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, service, config.database_url).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    res
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode { View, Create, Edit }

#[derive(Clone, Copy, PartialEq, Eq)]
enum Filter { All, Incomplete, Complete }

impl Filter {
    fn next(self) -> Self {
        match self { Filter::All => Filter::Incomplete, Filter::Incomplete => Filter::Complete, Filter::Complete => Filter::All }
    }

    fn label(self) -> &'static str {
        match self { Filter::All => "All", Filter::Incomplete => "Incomplete", Filter::Complete => "Complete" }
    }

    fn list_filter(self) -> ListFilter {
        match self {
            Filter::All => ListFilter::default(),
            Filter::Incomplete => ListFilter { include_complete: false, include_incomplete: true },
            Filter::Complete => ListFilter { include_complete: true, include_incomplete: false },
        }
    }
}

struct App<R: TodoItemRepository> {
    service: TodoItemServiceImpl<R>,
    items: Vec<TodoItem>,
    selected: usize,
    last_tick: Instant,
    mode: Mode,
    list_state: ListState,
    filter: Filter,
    draft: String,
    status: String,
}

impl<R: TodoItemRepository> App<R> {
    async fn load(&mut self) -> Result<()> {
        self.items = self.service.list_items(self.filter.list_filter()).await?;
        let len = self.items.len();
        if len == 0 { self.selected = 0; self.list_state.select(None); }
        else { if self.selected >= len { self.selected = len - 1; } self.list_state.select(Some(self.selected)); }
        Ok(())
    }

    fn current(&self) -> Option<&TodoItem> { self.items.get(self.selected) }

    fn report(&mut self, action: &str, result: ValidationResult) {
        self.status = if result.is_valid { format!("{action}: ok") } else { format!("{action}: {}", result.message) };
    }
}

async fn run_app<R: TodoItemRepository>(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, service: TodoItemServiceImpl<R>, database_url: String) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut app = App { service, items: vec![], selected: 0, last_tick: Instant::now(), mode: Mode::View, list_state: ListState::default(), filter: Filter::All, draft: String::new(), status: String::new() };
    app.load().await?;

    loop {
        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(1),
                    Constraint::Length(3),
                ])
                .split(f.size());

            let header = Paragraph::new("Todo items (Enter: toggle complete, n: new, e: edit, f: filter, q: quit)  |  New/Edit: type description, Enter to save, Esc to cancel")
                .block(Block::default().borders(Borders::ALL).title("todo-list-tui"));
            f.render_widget(header, chunks[0]);

            let list_items: Vec<ListItem> = app.items.iter().map(|t| {
                let mark = if t.is_completed { "[x]" } else { "[ ]" };
                ListItem::new(format!("{} {}", mark, t.description))
            }).collect();
            let list = List::new(list_items)
                .block(Block::default().borders(Borders::ALL).title(format!("items [{}]", app.filter.label())))
                .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD | Modifier::REVERSED))
                .highlight_symbol(">> ");
            f.render_stateful_widget(list, chunks[1], &mut app.list_state);

            let footer_text = match app.mode {
                Mode::View if app.status.is_empty() => format!("DATABASE_URL={}  |  Filter=[{}]", database_url, app.filter.label()),
                Mode::View => app.status.clone(),
                Mode::Create | Mode::Edit => format!("Description: {}_  |  (Enter to save, Esc to cancel)", app.draft),
            };
            let footer = Paragraph::new(footer_text)
                .block(Block::default().borders(Borders::ALL).title(match app.mode { Mode::View => "info", Mode::Create => "create", Mode::Edit => "edit" }));
            f.render_widget(footer, chunks[2]);
        })?;

        let timeout = tick_rate.saturating_sub(app.last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                // Only act on key presses; ignore repeats and releases to prevent duplicate input
                if key.kind != KeyEventKind::Press { continue; }
                match app.mode {
                    Mode::View => match key.code {
                        KeyCode::Char('q') => break,
                        KeyCode::Up => { if app.selected > 0 { app.selected -= 1; app.list_state.select(Some(app.selected)); } }
                        KeyCode::Down => { if app.selected + 1 < app.items.len() { app.selected += 1; app.list_state.select(Some(app.selected)); } }
                        KeyCode::Enter => {
                            if let Some(item) = app.current().cloned() {
                                let toggled = TodoItem { is_completed: !item.is_completed, ..item };
                                let result = app.service.edit_item(toggled.id, toggled).await?;
                                app.report("toggle", result);
                                app.load().await?;
                            }
                        }
                        KeyCode::Char('n') => {
                            app.mode = Mode::Create;
                            app.draft.clear();
                        }
                        KeyCode::Char('e') => {
                            if let Some(item) = app.current() {
                                app.draft = item.description.clone();
                                app.mode = Mode::Edit;
                            }
                        }
                        KeyCode::Char('f') => {
                            app.filter = app.filter.next();
                            app.load().await?;
                        }
                        _ => {}
                    },
                    Mode::Create | Mode::Edit => match key.code {
                        KeyCode::Esc => { app.mode = Mode::View; app.draft.clear(); }
                        KeyCode::Enter => {
                            let description = app.draft.trim().to_string();
                            if description.is_empty() {
                                app.status = "description is required".to_string();
                            } else if app.mode == Mode::Create {
                                let result = app.service.create_item(Some(TodoItem::new(TodoItemId::empty(), description, false))).await?;
                                app.report("create", result);
                            } else if let Some(item) = app.current().cloned() {
                                let edited = TodoItem { description, ..item };
                                let result = app.service.edit_item(edited.id, edited).await?;
                                app.report("edit", result);
                            }
                            app.mode = Mode::View;
                            app.draft.clear();
                            app.load().await?;
                        }
                        KeyCode::Backspace => { app.draft.pop(); }
                        KeyCode::Char(c) => app.draft.push(c),
                        _ => {}
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
