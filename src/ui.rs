use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use expense_tracker::{
    Category, ExpenseBook, ExpenseDetails, ExpenseError, ExpenseId, Granularity, Origin,
    ProjectedRow, Projection, TrackerConfig,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Expenses,
    Categories,
    Timeline,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Expenses => Page::Categories,
            Page::Categories => Page::Timeline,
            Page::Timeline => Page::Expenses,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Expenses => Page::Timeline,
            Page::Categories => Page::Expenses,
            Page::Timeline => Page::Categories,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Expenses => "Expenses",
            Page::Categories => "By Category",
            Page::Timeline => "Timeline",
        }
    }
}

// ============================================================================
// FORM
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormField {
    Category,
    Amount,
    Date,
    Description,
}

impl FormField {
    fn next(&self) -> Self {
        match self {
            FormField::Category => FormField::Amount,
            FormField::Amount => FormField::Date,
            FormField::Date => FormField::Description,
            FormField::Description => FormField::Category,
        }
    }

    fn previous(&self) -> Self {
        match self {
            FormField::Category => FormField::Description,
            FormField::Amount => FormField::Category,
            FormField::Date => FormField::Amount,
            FormField::Description => FormField::Date,
        }
    }
}

/// Add/edit form; text fields stay raw until submit
#[derive(Debug, Clone)]
struct ExpenseForm {
    editing: Option<ExpenseId>,
    category: Category,
    amount: String,
    date: String,
    description: String,
    focus: FormField,
}

impl ExpenseForm {
    fn blank() -> Self {
        ExpenseForm {
            editing: None,
            category: Category::Food,
            amount: String::new(),
            date: chrono::Local::now().date_naive().format("%Y-%m-%d").to_string(),
            description: String::new(),
            focus: FormField::Category,
        }
    }

    fn for_edit(id: ExpenseId, details: &ExpenseDetails) -> Self {
        ExpenseForm {
            editing: Some(id),
            category: details.category,
            // Shortest exact form, so an untouched amount saves back unchanged
            amount: details.amount.to_string(),
            date: details.date.format("%Y-%m-%d").to_string(),
            description: details.description.clone(),
            focus: FormField::Amount,
        }
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Category => None,
            FormField::Amount => Some(&mut self.amount),
            FormField::Date => Some(&mut self.date),
            FormField::Description => Some(&mut self.description),
        }
    }

    fn details(&self) -> expense_tracker::Result<ExpenseDetails> {
        ExpenseDetails::parse(
            self.category.as_str(),
            &self.amount,
            &self.date,
            &self.description,
        )
    }
}

#[derive(Debug, Clone)]
enum Mode {
    Browse,
    Form(ExpenseForm),
    ConfirmDelete(ExpenseId),
    ConfirmClear,
    ImportPrompt(String),
}

#[derive(Debug, Clone)]
struct StatusMessage {
    text: String,
    is_error: bool,
}

// ============================================================================
// APP STATE
// ============================================================================

pub struct App {
    book: ExpenseBook,
    config: TrackerConfig,
    projection: Projection,
    pub state: TableState,
    pub current_page: Page,
    granularity: Granularity,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(book: ExpenseBook, config: TrackerConfig) -> Result<Self> {
        let projection = book.snapshot()?;
        let mut state = TableState::default();
        if !projection.is_empty() {
            state.select(Some(0));
        }

        Ok(Self {
            book,
            config,
            projection,
            state,
            current_page: Page::Expenses,
            granularity: Granularity::Month,
            mode: Mode::Browse,
            status: None,
        })
    }

    /// Reload the display set from the store (or the imported file)
    pub fn refresh(&mut self) {
        match self.book.snapshot() {
            Ok(projection) => self.projection = projection,
            Err(err) => {
                self.projection = Projection::from_expenses(Vec::new());
                self.report(&err);
            }
        }

        let len = self.projection.len();
        match self.state.selected() {
            _ if len == 0 => self.state.select(None),
            Some(i) if i >= len => self.state.select(Some(len - 1)),
            None => self.state.select(Some(0)),
            Some(_) => {}
        }
    }

    fn info(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
        });
    }

    fn report(&mut self, err: &ExpenseError) {
        self.status = Some(StatusMessage {
            text: err.user_message(),
            is_error: true,
        });
    }

    pub fn selected_row(&self) -> Option<&ProjectedRow> {
        self.state.selected().and_then(|i| self.projection.rows().get(i))
    }

    fn selected_id(&mut self) -> Option<ExpenseId> {
        match self.selected_row().map(|row| row.id) {
            Some(Some(id)) => Some(id),
            Some(None) => {
                self.info("Imported rows are read-only. Press 's' to return to saved data.");
                None
            }
            None => None,
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
        self.refresh();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
        self.refresh();
    }

    // ========================================================================
    // ACTIONS
    // ========================================================================

    fn start_add(&mut self) {
        if self.book.is_showing_import() {
            self.info("Return to saved data ('s') before adding expenses.");
            return;
        }
        self.mode = Mode::Form(ExpenseForm::blank());
    }

    fn start_edit(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        match self.book.begin_edit(id) {
            Ok(current) => self.mode = Mode::Form(ExpenseForm::for_edit(id, &current.details)),
            Err(err) => {
                self.report(&err);
                self.refresh();
            }
        }
    }

    fn submit_form(&mut self, form: ExpenseForm) {
        let details = match form.details() {
            Ok(details) => details,
            Err(err) => {
                self.report(&err);
                self.mode = Mode::Form(form);
                return;
            }
        };

        let result = match form.editing {
            Some(_) => self.book.confirm_edit(&details).map(|id| format!("Updated expense {}", id)),
            None => self.book.add(&details).map(|id| format!("Added expense {}", id)),
        };

        match result {
            Ok(text) => {
                self.info(text);
                self.mode = Mode::Browse;
            }
            // Keep the form so the user can fix the field or retry
            Err(err) if err.is_retryable() || matches!(err, ExpenseError::Validation { .. }) => {
                self.report(&err);
                self.mode = Mode::Form(form);
            }
            Err(err) => {
                self.report(&err);
                self.mode = Mode::Browse;
            }
        }
        self.refresh();
    }

    fn cancel_form(&mut self) {
        if self.book.session().is_editing() {
            self.info("Edit cancelled");
        }
        self.book.cancel_edit();
        self.mode = Mode::Browse;
    }

    fn request_delete(&mut self) {
        if let Some(id) = self.selected_id() {
            self.mode = Mode::ConfirmDelete(id);
        }
    }

    fn confirm_delete(&mut self, id: ExpenseId) {
        match self.book.remove(id) {
            Ok(()) => self.info(format!("Removed expense {}", id)),
            Err(err) => self.report(&err),
        }
        self.mode = Mode::Browse;
        self.refresh();
    }

    fn request_clear(&mut self) {
        if self.book.is_showing_import() {
            self.info("Return to saved data ('s') before clearing the store.");
            return;
        }
        self.mode = Mode::ConfirmClear;
    }

    fn confirm_clear(&mut self) {
        match self.book.clear() {
            Ok(removed) => self.info(format!("Cleared {} expenses", removed)),
            Err(err) => self.report(&err),
        }
        self.mode = Mode::Browse;
        self.refresh();
    }

    fn submit_import(&mut self, path: String) {
        let path = PathBuf::from(path.trim());
        match self.book.import(&path) {
            Ok(report) => self.info(format!(
                "Showing {} rows from {} ({} incomplete rows dropped)",
                report.rows.len(),
                path.display(),
                report.dropped
            )),
            Err(err) => self.report(&err),
        }
        self.mode = Mode::Browse;
        self.state.select(Some(0));
        self.refresh();
    }

    fn show_saved(&mut self) {
        if self.book.is_showing_import() {
            self.book.show_saved();
            self.info("Showing saved expenses");
            self.refresh();
        }
    }

    // ========================================================================
    // NAVIGATION
    // ========================================================================

    pub fn next(&mut self) {
        let len = self.projection.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.projection.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.projection.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => (i + 20).min(len - 1),
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let i = match self.state.selected() {
            Some(i) => i.saturating_sub(20),
            None => 0,
        };
        self.state.select(Some(i));
    }

    // ========================================================================
    // KEY HANDLING
    // ========================================================================

    /// Returns false when the app should exit
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let mode = std::mem::replace(&mut self.mode, Mode::Browse);
        match mode {
            Mode::Browse => return self.handle_browse_key(key),
            Mode::Form(form) => self.handle_form_key(form, key),
            Mode::ConfirmDelete(id) => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.confirm_delete(id),
                _ => self.info("Delete cancelled"),
            },
            Mode::ConfirmClear => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.confirm_clear(),
                _ => self.info("Clear cancelled"),
            },
            Mode::ImportPrompt(mut path) => match key.code {
                KeyCode::Esc => {}
                KeyCode::Enter => self.submit_import(path),
                KeyCode::Backspace => {
                    path.pop();
                    self.mode = Mode::ImportPrompt(path);
                }
                KeyCode::Char(c) => {
                    path.push(c);
                    self.mode = Mode::ImportPrompt(path);
                }
                _ => self.mode = Mode::ImportPrompt(path),
            },
        }
        true
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> bool {
        // A message lasts until the next key; then the key help comes back
        self.status = None;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Tab => self.next_page(),
            KeyCode::BackTab => self.previous_page(),
            KeyCode::Char('a') => self.start_add(),
            KeyCode::Char('e') | KeyCode::Enter => self.start_edit(),
            KeyCode::Char('d') | KeyCode::Delete => self.request_delete(),
            KeyCode::Char('C') => self.request_clear(),
            KeyCode::Char('i') => self.mode = Mode::ImportPrompt(String::new()),
            KeyCode::Char('s') => self.show_saved(),
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Char('g') => self.granularity = self.granularity.toggle(),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::PageDown => self.page_down(),
            KeyCode::PageUp => self.page_up(),
            KeyCode::Home => self.state.select(Some(0)),
            KeyCode::End => {
                if !self.projection.is_empty() {
                    self.state.select(Some(self.projection.len() - 1));
                }
            }
            _ => {}
        }
        true
    }

    fn handle_form_key(&mut self, mut form: ExpenseForm, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.cancel_form();
                return;
            }
            KeyCode::Enter => {
                self.submit_form(form);
                return;
            }
            KeyCode::Tab | KeyCode::Down => form.focus = form.focus.next(),
            KeyCode::BackTab | KeyCode::Up => form.focus = form.focus.previous(),
            KeyCode::Left if form.focus == FormField::Category => {
                form.category = form.category.previous()
            }
            KeyCode::Right if form.focus == FormField::Category => {
                form.category = form.category.next()
            }
            KeyCode::Backspace => {
                if let Some(text) = form.text_mut() {
                    text.pop();
                }
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(text) = form.text_mut() {
                    text.push(c);
                }
            }
            _ => {}
        }
        self.mode = Mode::Form(form);
    }
}

// ============================================================================
// TERMINAL LOOP
// ============================================================================

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if !app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Expenses => render_table(f, chunks[1], app),
        Page::Categories => render_categories(f, chunks[1], app),
        Page::Timeline => render_timeline(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);

    match &app.mode {
        Mode::Browse => {}
        Mode::Form(form) => render_form(f, form),
        Mode::ConfirmDelete(id) => {
            render_prompt(f, " Delete ", &format!("Delete expense {}? (y/n)", id))
        }
        Mode::ConfirmClear => render_prompt(
            f,
            " Clear ",
            "Delete ALL saved expenses? This cannot be undone. (y/n)",
        ),
        Mode::ImportPrompt(path) => render_prompt(f, " Import CSV / Excel ", &format!("Path: {}_", path)),
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Expenses, Page::Categories, Page::Timeline];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Count: {}", app.projection.len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Total: {}", app.config.format_amount(app.projection.total())),
        Style::default().fg(Color::Red),
    ));
    tab_spans.push(Span::raw("  |  "));
    let source = match app.projection.origin() {
        Origin::Store => Span::styled("saved data", Style::default().fg(Color::Green)),
        Origin::Import(path) => Span::styled(
            format!("imported: {}", path.display()),
            Style::default().fg(Color::Magenta),
        ),
    };
    tab_spans.push(source);

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Personal Expense Tracker "),
    );

    f.render_widget(header, area);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    Row::new(cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1)
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header = header_row(&["ID", "Date", "Category", "Amount", "Description"]);

    let rows: Vec<Row> = app
        .projection
        .rows()
        .iter()
        .map(|row| {
            let id = row.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
            Row::new(vec![
                Cell::from(id),
                Cell::from(row.details.date.format("%Y-%m-%d").to_string()),
                Cell::from(row.details.category.as_str()),
                Cell::from(app.config.format_amount(row.details.amount))
                    .style(Style::default().fg(Color::Red)),
                Cell::from(truncate(&row.details.description, 48)),
            ])
            .height(1)
        })
        .collect();

    let title = if app.projection.is_empty() {
        " Expenses - none yet, press 'a' to add ".to_string()
    } else {
        format!(" Expenses ({}) ", app.projection.len())
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(12),
            Constraint::Length(15),
            Constraint::Length(14),
            Constraint::Min(20),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_categories(f: &mut Frame, area: Rect, app: &App) {
    let totals = app.projection.category_totals();
    let grand_total = app.projection.total();

    let rows = totals.iter().map(|t| {
        let share = if grand_total > 0.0 {
            t.total / grand_total * 100.0
        } else {
            0.0
        };
        Row::new(vec![
            Cell::from(t.category.as_str()),
            Cell::from(format!("{}", t.count)),
            Cell::from(app.config.format_amount(t.total)).style(Style::default().fg(Color::Red)),
            Cell::from(format!("{:>5.1}% {}", share, bar(share, 100.0, 30))),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(15),
            Constraint::Length(10),
            Constraint::Length(14),
            Constraint::Min(20),
        ],
    )
    .header(header_row(&["Category", "Count", "Total", "Share"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Expenses by Category "),
    );

    f.render_widget(table, area);
}

fn render_timeline(f: &mut Frame, area: Rect, app: &App) {
    let totals = app.projection.period_totals(app.granularity);
    let max = totals.iter().map(|t| t.total).fold(0.0, f64::max);

    let rows = totals.iter().map(|t| {
        Row::new(vec![
            Cell::from(t.period.to_string()),
            Cell::from(format!("{}", t.count)),
            Cell::from(app.config.format_amount(t.total)).style(Style::default().fg(Color::Red)),
            Cell::from(bar(t.total, max, 40)).style(Style::default().fg(Color::Cyan)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(14),
            Constraint::Min(20),
        ],
    )
    .header(header_row(&["Period", "Count", "Total", "Trend"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" {} Expense Trend ('g' to switch) ", app.granularity.name())),
    );

    f.render_widget(table, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let line = match &app.status {
        Some(StatusMessage { text, is_error }) => {
            let color = if *is_error { Color::Red } else { Color::Green };
            Line::from(Span::styled(text.clone(), Style::default().fg(color)))
        }
        None => {
            let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));
            let mut spans = vec![
                key("a"),
                Span::raw(" Add | "),
                key("e"),
                Span::raw(" Edit | "),
                key("d"),
                Span::raw(" Delete | "),
                key("C"),
                Span::raw(" Clear | "),
                key("i"),
                Span::raw(" Import | "),
            ];
            if app.book.is_showing_import() {
                spans.push(key("s"));
                spans.push(Span::raw(" Saved data | "));
            }
            spans.push(key("Tab"));
            spans.push(Span::raw(" Page | "));
            spans.push(Span::styled("q", Style::default().fg(Color::Red)));
            spans.push(Span::raw(" Quit"));
            Line::from(spans)
        }
    };

    let status_bar = Paragraph::new(vec![line]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_form(f: &mut Frame, form: &ExpenseForm) {
    let area = centered_rect(60, 12, f.size());
    let title = match form.editing {
        Some(id) => format!(" Edit expense {} ", id),
        None => " Add expense ".to_string(),
    };

    let field = |label: &'static str, value: String, which: FormField| {
        let focused = form.focus == which;
        let label_style = if focused {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let cursor = if focused && which != FormField::Category { "_" } else { "" };
        Line::from(vec![
            Span::styled(format!("{:<13}", label), label_style),
            Span::raw(format!("{}{}", value, cursor)),
        ])
    };

    let content = vec![
        Line::from(""),
        field(
            "Category",
            format!("◀ {} ▶", form.category),
            FormField::Category,
        ),
        field("Amount", form.amount.clone(), FormField::Amount),
        field("Date", form.date.clone(), FormField::Date),
        field("Description", form.description.clone(), FormField::Description),
        Line::from(""),
        Line::from(Span::styled(
            "Tab next field | ←/→ category | Enter save | Esc cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let popup = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title),
    );

    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

fn render_prompt(f: &mut Frame, title: &str, text: &str) {
    let area = centered_rect(60, 5, f.size());
    let popup = Paragraph::new(vec![Line::from(""), Line::from(text.to_string())]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(title.to_string()),
    );

    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

/// Rect of `percent_x` width and `height` rows centered in `area`
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 {
        return String::new();
    }
    let filled = ((value / max) * width as f64).round() as usize;
    "█".repeat(filled.min(width))
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len - 3).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use expense_tracker::ExpenseStore;
    use tempfile::TempDir;

    fn details(amount: f64) -> ExpenseDetails {
        ExpenseDetails::new(
            Category::Food,
            amount,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            "Tapas",
        )
    }

    fn app_with(dir: &TempDir, rows: &[ExpenseDetails]) -> App {
        let store = ExpenseStore::open(dir.path().join("ui.db")).unwrap();
        for row in rows {
            store.create(row).unwrap();
        }
        App::new(ExpenseBook::new(store), TrackerConfig::default()).unwrap()
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_edit_form_keeps_exact_amount() {
        for amount in [0.125, 12.345, 7.0, 0.0] {
            let form = ExpenseForm::for_edit(ExpenseId::new(1), &details(amount));
            assert_eq!(form.details().unwrap(), details(amount));
        }
    }

    #[test]
    fn test_submitting_untouched_edit_saves_same_amount() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with(&dir, &[details(0.125)]);

        press(&mut app, KeyCode::Char('e'));
        assert!(matches!(app.mode, Mode::Form(_)));
        press(&mut app, KeyCode::Enter);

        assert!(matches!(app.mode, Mode::Browse));
        let saved = app.book.store().read_all().unwrap();
        assert_eq!(saved[0].details.amount, 0.125);
    }

    #[test]
    fn test_status_message_cleared_by_next_key() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with(&dir, &[details(1.0), details(2.0)]);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('n'));
        assert!(app.status.is_some());

        press(&mut app, KeyCode::Down);
        assert!(app.status.is_none());
    }

    #[test]
    fn test_cancelled_edit_leaves_session_idle() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with(&dir, &[details(3.0)]);

        press(&mut app, KeyCode::Char('e'));
        assert!(app.book.session().is_editing());
        press(&mut app, KeyCode::Esc);

        assert!(!app.book.session().is_editing());
        assert!(matches!(app.mode, Mode::Browse));
    }

    #[test]
    fn test_imported_rows_are_read_only() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("upload.csv");
        std::fs::write(&file, "Category,Amount,Date,Description\nFood,4,2024-02-01,Bagel\n").unwrap();
        let mut app = app_with(&dir, &[]);

        app.submit_import(file.display().to_string());
        assert_eq!(app.projection.len(), 1);

        press(&mut app, KeyCode::Char('e'));
        assert!(matches!(app.mode, Mode::Browse));
        assert!(app.status.is_some());
    }
}
