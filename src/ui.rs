use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::collections::VecDeque;
use std::io;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::error::report;
use crate::input::LineEditor;
use crate::models::{Feature, PopupMode};
use crate::reminders::{spawn_poller, Notification};
use crate::todo::{TodoError, TodoList};
use crate::toolbox::Toolbox;

const COLUMNS: usize = 2;

pub struct App {
    toolbox: Toolbox,
    runtime: Handle,
    notifications: UnboundedReceiver<Notification>,
    pub selected: usize,
    pub log: Vec<String>,
    // Lines scrolled up from the newest entry.
    pub log_scroll: usize,
    pub popup_mode: PopupMode,
    pub input: LineEditor,
    pub todo: Option<TodoList>,
    pub todo_list_state: ListState,
    pub alerts: VecDeque<Notification>,
    pub should_quit: bool,
}

impl App {
    pub fn new(toolbox: Toolbox, runtime: Handle, notifications: UnboundedReceiver<Notification>) -> Self {
        App {
            toolbox,
            runtime,
            notifications,
            selected: 0,
            log: Vec::new(),
            log_scroll: 0,
            popup_mode: PopupMode::None,
            input: LineEditor::new(),
            todo: None,
            todo_list_state: ListState::default(),
            alerts: VecDeque::new(),
            should_quit: false,
        }
    }

    pub fn log_line(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
        self.log_scroll = 0;
    }

    pub fn selected_feature(&self) -> Feature {
        Feature::ALL[self.selected]
    }

    pub fn move_selection(&mut self, code: KeyCode) {
        let last = Feature::ALL.len() - 1;
        self.selected = match code {
            KeyCode::Right if self.selected % COLUMNS == 0 && self.selected < last => self.selected + 1,
            KeyCode::Left if self.selected % COLUMNS == 1 => self.selected - 1,
            KeyCode::Down if self.selected + COLUMNS <= last => self.selected + COLUMNS,
            KeyCode::Up if self.selected >= COLUMNS => self.selected - COLUMNS,
            _ => self.selected,
        };
    }

    pub fn activate(&mut self, feature: Feature) {
        match feature {
            Feature::TodoList => self.open_todo_window(),
            _ => match feature.prompt() {
                Some(_) => {
                    self.input.clear();
                    self.popup_mode = PopupMode::Prompt(feature);
                }
                None => self.run_feature(feature, ""),
            },
        }
    }

    /// Runs on the UI thread; network features block until they finish so
    /// results land in the log in click order.
    fn run_feature(&mut self, feature: Feature, input: &str) {
        let lines = self.runtime.block_on(self.toolbox.run(feature, input));
        for line in lines {
            self.log_line(line);
        }
    }

    pub fn submit_prompt(&mut self) {
        match self.popup_mode {
            PopupMode::Prompt(feature) => {
                let input = self.input.take();
                self.popup_mode = PopupMode::None;
                self.run_feature(feature, &input);
            }
            PopupMode::TodoAdd => {
                let text = self.input.take();
                self.popup_mode = PopupMode::TodoWindow;
                self.add_task(&text);
            }
            PopupMode::None | PopupMode::TodoWindow => {}
        }
    }

    pub fn close_popup(&mut self) {
        self.input.clear();
        self.popup_mode = match self.popup_mode {
            PopupMode::TodoAdd => PopupMode::TodoWindow,
            PopupMode::TodoWindow => {
                self.todo = None;
                PopupMode::None
            }
            _ => PopupMode::None,
        };
    }

    pub fn open_todo_window(&mut self) {
        match TodoList::open(self.toolbox.todo_store().clone()) {
            Ok(list) => {
                self.todo_list_state
                    .select(if list.is_empty() { None } else { Some(0) });
                self.todo = Some(list);
                self.popup_mode = PopupMode::TodoWindow;
            }
            Err(e) => {
                let line = report(&e);
                self.log_line(line);
            }
        }
    }

    pub fn next_task(&mut self) {
        let len = self.todo.as_ref().map_or(0, TodoList::len);
        if len == 0 {
            return;
        }
        let i = match self.todo_list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.todo_list_state.select(Some(i));
    }

    pub fn previous_task(&mut self) {
        let len = self.todo.as_ref().map_or(0, TodoList::len);
        if len == 0 {
            return;
        }
        let i = match self.todo_list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.todo_list_state.select(Some(i));
    }

    pub fn toggle_selected_task(&mut self) {
        let outcome = match (self.todo.as_mut(), self.todo_list_state.selected()) {
            (Some(list), Some(i)) => list.toggle(i),
            _ => return,
        };
        match outcome {
            Ok(_) => self.log_line("Task updated"),
            Err(e) => {
                let line = report(&e);
                self.log_line(line);
            }
        }
    }

    fn add_task(&mut self, text: &str) {
        let Some(list) = self.todo.as_mut() else {
            return;
        };
        let line = match list.add(text) {
            Ok(task) => format!("Task added: {}", task.text),
            Err(TodoError::EmptyTask) => return,
            Err(e) => report(&e),
        };
        let last = list.len().checked_sub(1);
        self.todo_list_state.select(last);
        self.log_line(line);
    }

    pub fn drain_notifications(&mut self) {
        while let Ok(notification) = self.notifications.try_recv() {
            self.log_line(notification.to_string());
            self.alerts.push_back(notification);
        }
    }

    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if !self.alerts.is_empty() {
            if matches!(code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.alerts.pop_front();
            }
            return;
        }

        match self.popup_mode {
            PopupMode::Prompt(_) | PopupMode::TodoAdd => self.handle_input_key(code, modifiers),
            PopupMode::TodoWindow => self.handle_todo_key(code),
            PopupMode::None => self.handle_main_key(code),
        }
    }

    fn handle_input_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        match code {
            KeyCode::Esc => self.close_popup(),
            KeyCode::Enter => self.submit_prompt(),
            KeyCode::Backspace => self.input.delete_char(),
            KeyCode::Delete => self.input.delete_forward(),
            KeyCode::Left => self.input.move_cursor_left(),
            KeyCode::Right => self.input.move_cursor_right(),
            KeyCode::Home => self.input.move_to_start(),
            KeyCode::End => self.input.move_to_end(),
            KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.insert_char(c)
            }
            _ => {}
        }
    }

    fn handle_todo_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc | KeyCode::Char('q') => self.close_popup(),
            KeyCode::Down | KeyCode::Char('j') => self.next_task(),
            KeyCode::Up | KeyCode::Char('k') => self.previous_task(),
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_selected_task(),
            KeyCode::Char('a') => {
                self.input.clear();
                self.popup_mode = PopupMode::TodoAdd;
            }
            _ => {}
        }
    }

    fn handle_main_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down => self.move_selection(code),
            KeyCode::Enter | KeyCode::Char(' ') => self.activate(self.selected_feature()),
            KeyCode::Char(c @ '1'..='9') => {
                self.selected = c as usize - '1' as usize;
                self.activate(self.selected_feature());
            }
            KeyCode::PageUp => {
                self.log_scroll = (self.log_scroll + 5).min(self.log.len().saturating_sub(1))
            }
            KeyCode::PageDown => self.log_scroll = self.log_scroll.saturating_sub(5),
            KeyCode::End => self.log_scroll = 0,
            _ => {}
        }
    }
}

pub fn run_tui(toolbox: Toolbox) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()?;

    let (tx, rx) = mpsc::unbounded_channel();
    let interval = Duration::from_secs(toolbox.config().poll_interval_secs);
    let poller = {
        let _guard = runtime.enter();
        spawn_poller(toolbox.reminders().clone(), toolbox.clock(), interval, tx)
    };
    log::info!("Reminder poller started, interval {:?}", interval);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(toolbox, runtime.handle().clone(), rx);
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    poller.abort();

    if let Err(err) = res {
        log::error!("TUI loop failed: {err:?}");
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        app.drain_notifications();
        terminal.draw(|f| ui(f, app))?;

        // Poll with a timeout so reminders show up without a key press.
        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code, key.modifiers);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn ui(f: &mut Frame, app: &mut App) {
    let rows = Feature::ALL.len().div_ceil(COLUMNS);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(rows as u16 * 3),
                Constraint::Min(5),
            ]
            .as_ref(),
        )
        .split(f.area());

    let title = Paragraph::new(Line::from(Span::styled(
        "Smart Utility Bot",
        Style::default().add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL))
    .style(Style::default().fg(Color::Cyan));
    f.render_widget(title, chunks[0]);

    render_buttons(f, app, chunks[1], rows);
    render_log(f, app, chunks[2]);

    match app.popup_mode {
        PopupMode::Prompt(feature) => {
            if let Some((title, label)) = feature.prompt() {
                render_prompt(f, &app.input, title, label);
            }
        }
        PopupMode::TodoWindow => render_todo(f, app),
        PopupMode::TodoAdd => {
            render_todo(f, app);
            render_prompt(f, &app.input, "Add Task", "Enter new task:");
        }
        PopupMode::None => {}
    }

    if let Some(alert) = app.alerts.front() {
        let area = centered_rect(40, 20, f.area());
        f.render_widget(Clear, area);
        let content = Paragraph::new(format!("{}\n\nPress ENTER to dismiss", alert.message))
            .block(
                Block::default()
                    .title(format!("Reminder ({})", alert.at))
                    .borders(Borders::ALL)
                    .style(Style::default().bg(Color::DarkGray)),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: false })
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
        f.render_widget(content, area);
    }
}

// Helper function to create centered rectangles for popups
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn render_buttons(f: &mut Frame, app: &App, area: Rect, rows: usize) {
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(3); rows])
        .split(area);

    for (row, row_area) in row_areas.iter().enumerate() {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
            .split(*row_area);

        for col in 0..COLUMNS {
            let index = row * COLUMNS + col;
            let Some(feature) = Feature::ALL.get(index) else {
                continue;
            };
            let style = if index == app.selected {
                Style::default()
                    .bg(Color::LightGreen)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let button = Paragraph::new(format!("{}. {}", index + 1, feature.label()))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL))
                .style(style);
            f.render_widget(button, cells[col]);
        }
    }
}

fn render_log(f: &mut Frame, app: &App, area: Rect) {
    let visible = area.height.saturating_sub(2) as usize;
    let bottom = app.log.len().saturating_sub(app.log_scroll);
    let top = bottom.saturating_sub(visible);

    let lines: Vec<Line> = app.log[top..bottom]
        .iter()
        .map(|entry| {
            let color = if entry.starts_with("Reminder:") {
                Color::Yellow
            } else {
                Color::White
            };
            Line::from(Span::styled(entry.clone(), Style::default().fg(color)))
        })
        .collect();

    let title = if app.log_scroll > 0 {
        format!("Log (scrolled {} up, End to follow)", app.log_scroll)
    } else {
        "Log - arrows: select | Enter/1-9: open | PgUp/PgDn: scroll | q: quit".to_string()
    };

    let log = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    f.render_widget(log, area);
}

fn render_prompt(f: &mut Frame, input: &LineEditor, title: &str, label: &str) {
    let area = centered_rect(60, 25, f.area());
    f.render_widget(Clear, area);

    let (before, under, after) = input.split_at_cursor();
    let cursor = under.map(String::from).unwrap_or_else(|| " ".to_string());
    let input_line = Line::from(vec![
        Span::raw(before.to_string()),
        Span::styled(cursor, Style::default().bg(Color::Cyan).fg(Color::Black)),
        Span::raw(after.to_string()),
    ]);

    let content = Paragraph::new(vec![
        Line::from(label.to_string()),
        Line::from(""),
        input_line,
        Line::from(""),
        Line::from(Span::styled(
            "ENTER: OK | ESC: Cancel",
            Style::default().fg(Color::Gray),
        )),
    ])
    .block(
        Block::default()
            .title(title.to_string())
            .borders(Borders::ALL)
            .style(Style::default().bg(Color::DarkGray)),
    )
    .style(Style::default().fg(Color::White));

    f.render_widget(content, area);
}

fn render_todo(f: &mut Frame, app: &mut App) {
    let area = centered_rect(60, 70, f.area());
    f.render_widget(Clear, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)].as_ref())
        .split(area);

    let items: Vec<ListItem> = app
        .todo
        .as_ref()
        .map(|list| list.tasks())
        .unwrap_or_default()
        .iter()
        .map(|task| {
            let (mark, color) = if task.done {
                ("[x] ", Color::Green)
            } else {
                ("[ ] ", Color::White)
            };
            ListItem::new(Line::from(vec![
                Span::styled(mark, Style::default().fg(Color::Cyan)),
                Span::styled(task.text.clone(), Style::default().fg(color)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("To-Do List")
                .style(Style::default().bg(Color::Black)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::LightGreen)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");
    f.render_stateful_widget(list, chunks[0], &mut app.todo_list_state);

    let help = Paragraph::new("Space: Toggle | a: Add New Task | Esc: Close")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::White).bg(Color::Black));
    f.render_widget(help, chunks[1]);
}
