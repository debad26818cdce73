use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use maint_assign::{
    export_to_path, Facet, FilterSession, MaintenanceCatalog, RuleBook, RuleDraft,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, TableState, Tabs},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;

/// Rows shown in the vehicle preview
const PREVIEW_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Filters,
    Form,
    Rules,
}

impl Focus {
    pub fn next(&self) -> Self {
        match self {
            Focus::Filters => Focus::Form,
            Focus::Form => Focus::Rules,
            Focus::Rules => Focus::Filters,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Focus::Filters => Focus::Rules,
            Focus::Form => Focus::Filters,
            Focus::Rules => Focus::Form,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Focus::Filters => "Filters",
            Focus::Form => "Rule Form",
            Focus::Rules => "Saved Rules",
        }
    }
}

/// One tab per facet, then the year range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterTab {
    Facet(Facet),
    Years,
}

const TABS: [FilterTab; 7] = [
    FilterTab::Facet(Facet::Make),
    FilterTab::Facet(Facet::Model),
    FilterTab::Facet(Facet::Engine),
    FilterTab::Facet(Facet::Transmission),
    FilterTab::Facet(Facet::Drivetrain),
    FilterTab::Facet(Facet::Fuel),
    FilterTab::Years,
];

impl FilterTab {
    fn title(&self) -> &'static str {
        match self {
            FilterTab::Facet(facet) => facet.label(),
            FilterTab::Years => "Years",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearBound {
    From,
    To,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    MaintCode,
    Cost,
    Retail,
    FirstMonths,
    FirstKm,
    RepeatMonths,
    RepeatKm,
}

impl FormField {
    const ALL: [FormField; 7] = [
        FormField::MaintCode,
        FormField::Cost,
        FormField::Retail,
        FormField::FirstMonths,
        FormField::FirstKm,
        FormField::RepeatMonths,
        FormField::RepeatKm,
    ];

    fn label(&self) -> &'static str {
        match self {
            FormField::MaintCode => "Maintenance",
            FormField::Cost => "Cost",
            FormField::Retail => "Retail",
            FormField::FirstMonths => "First (months)",
            FormField::FirstKm => "First (km)",
            FormField::RepeatMonths => "Repeat (months)",
            FormField::RepeatKm => "Repeat (km)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Search,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

pub struct App {
    pub session: FilterSession,
    pub maintenance: MaintenanceCatalog,
    pub rules: RuleBook,
    pub draft: RuleDraft,
    pub output_path: PathBuf,
    pub focus: Focus,
    pub mode: Mode,
    pub tab: usize,
    pub list_state: ListState,
    pub search: [String; 6],
    pub year_bound: YearBound,
    pub form_field: usize,
    pub maint_index: Option<usize>,
    pub rules_state: TableState,
    pub status: (StatusKind, String),
}

impl App {
    pub fn new(session: FilterSession, maintenance: MaintenanceCatalog, output_path: PathBuf) -> Self {
        let mut list_state = ListState::default();
        if !session.availability().values(Facet::Make).is_empty() {
            list_state.select(Some(0));
        }

        Self {
            session,
            maintenance,
            rules: RuleBook::new(),
            draft: RuleDraft::default(),
            output_path,
            focus: Focus::Filters,
            mode: Mode::Normal,
            tab: 0,
            list_state,
            search: Default::default(),
            year_bound: YearBound::From,
            form_field: 0,
            maint_index: None,
            rules_state: TableState::default(),
            status: (StatusKind::Info, "Ready.".to_string()),
        }
    }

    pub fn current_tab(&self) -> FilterTab {
        TABS[self.tab]
    }

    fn current_facet(&self) -> Option<Facet> {
        match self.current_tab() {
            FilterTab::Facet(facet) => Some(facet),
            FilterTab::Years => None,
        }
    }

    /// Available values of the current facet that pass its search box
    pub fn visible_values(&self) -> Vec<String> {
        match self.current_facet() {
            Some(facet) => self
                .session
                .availability()
                .search(facet, &self.search[facet.index()])
                .into_iter()
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        }
    }

    fn set_status(&mut self, kind: StatusKind, message: impl Into<String>) {
        self.status = (kind, message.into());
    }

    /// Keep the list cursor inside the (possibly shrunk) visible list
    fn clamp_cursor(&mut self) {
        let len = self.visible_values().len();
        let selected = match (len, self.list_state.selected()) {
            (0, _) => None,
            (_, Some(i)) if i >= len => Some(len - 1),
            (_, Some(i)) => Some(i),
            (_, None) => Some(0),
        };
        self.list_state.select(selected);
    }

    // ------------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------------

    pub fn next_tab(&mut self) {
        self.tab = (self.tab + 1) % TABS.len();
        self.list_state.select(Some(0));
        self.clamp_cursor();
    }

    pub fn previous_tab(&mut self) {
        self.tab = (self.tab + TABS.len() - 1) % TABS.len();
        self.list_state.select(Some(0));
        self.clamp_cursor();
    }

    pub fn next(&mut self) {
        match self.focus {
            Focus::Filters if self.current_tab() == FilterTab::Years => {
                self.year_bound = YearBound::To;
            }
            Focus::Filters => {
                let len = self.visible_values().len();
                if len == 0 {
                    return;
                }
                let i = match self.list_state.selected() {
                    Some(i) if i >= len - 1 => 0,
                    Some(i) => i + 1,
                    None => 0,
                };
                self.list_state.select(Some(i));
            }
            Focus::Form => {
                self.form_field = (self.form_field + 1) % FormField::ALL.len();
            }
            Focus::Rules => {
                let len = self.rules.len();
                if len == 0 {
                    return;
                }
                let i = match self.rules_state.selected() {
                    Some(i) if i >= len - 1 => 0,
                    Some(i) => i + 1,
                    None => 0,
                };
                self.rules_state.select(Some(i));
            }
        }
    }

    pub fn previous(&mut self) {
        match self.focus {
            Focus::Filters if self.current_tab() == FilterTab::Years => {
                self.year_bound = YearBound::From;
            }
            Focus::Filters => {
                let len = self.visible_values().len();
                if len == 0 {
                    return;
                }
                let i = match self.list_state.selected() {
                    Some(0) | None => len - 1,
                    Some(i) => i - 1,
                };
                self.list_state.select(Some(i));
            }
            Focus::Form => {
                self.form_field = (self.form_field + FormField::ALL.len() - 1) % FormField::ALL.len();
            }
            Focus::Rules => {
                let len = self.rules.len();
                if len == 0 {
                    return;
                }
                let i = match self.rules_state.selected() {
                    Some(0) | None => len - 1,
                    Some(i) => i - 1,
                };
                self.rules_state.select(Some(i));
            }
        }
    }

    /// Space on a value: select or unselect it
    pub fn toggle_current(&mut self) {
        let Some(facet) = self.current_facet() else {
            return;
        };
        let values = self.visible_values();
        let Some(value) = self.list_state.selected().and_then(|i| values.get(i)) else {
            return;
        };

        self.session.toggle(facet, value);
        self.clamp_cursor();
    }

    /// Select every value currently visible (after search)
    pub fn select_all_visible(&mut self) {
        if let Some(facet) = self.current_facet() {
            let values = self.visible_values();
            self.session.select_only(facet, values);
            self.clamp_cursor();
        }
    }

    /// Clear the current facet, or reopen the full year range
    pub fn clear_current(&mut self) {
        match self.current_facet() {
            Some(facet) => self.session.clear(facet),
            None => self.session.set_years(Default::default()),
        }
        self.clamp_cursor();
    }

    /// Step the active year bound through the available years
    pub fn adjust_year(&mut self, delta: i64) {
        let years = self.session.availability().years().to_vec();
        if years.is_empty() {
            return;
        }

        let current = match self.year_bound {
            YearBound::From => self.session.state().years.from,
            YearBound::To => self.session.state().years.to,
        };
        let index = current
            .and_then(|y| years.iter().position(|&v| v >= y))
            .unwrap_or(match self.year_bound {
                YearBound::From => 0,
                YearBound::To => years.len() - 1,
            });
        let target = (index as i64 + delta).clamp(0, years.len() as i64 - 1) as usize;

        match self.year_bound {
            YearBound::From => self.session.set_year_from(Some(years[target])),
            YearBound::To => self.session.set_year_to(Some(years[target])),
        }
    }

    pub fn reset_filters(&mut self) {
        self.session.reset();
        self.search = Default::default();
        self.clamp_cursor();
        self.set_status(StatusKind::Info, "Filters reset.");
    }

    // ------------------------------------------------------------------------
    // Rule form
    // ------------------------------------------------------------------------

    pub fn current_field(&self) -> FormField {
        FormField::ALL[self.form_field]
    }

    fn field_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::MaintCode => None,
            FormField::Cost => Some(&mut self.draft.cost),
            FormField::Retail => Some(&mut self.draft.retail),
            FormField::FirstMonths => Some(&mut self.draft.first_months),
            FormField::FirstKm => Some(&mut self.draft.first_km),
            FormField::RepeatMonths => Some(&mut self.draft.repeat_months),
            FormField::RepeatKm => Some(&mut self.draft.repeat_km),
        }
    }

    fn field_value(&self, field: FormField) -> String {
        match field {
            FormField::MaintCode => self
                .maint_index
                .and_then(|i| self.maintenance.types().get(i))
                .map(|t| t.label())
                .unwrap_or_else(|| "— choose —".to_string()),
            FormField::Cost => self.draft.cost.clone(),
            FormField::Retail => self.draft.retail.clone(),
            FormField::FirstMonths => self.draft.first_months.clone(),
            FormField::FirstKm => self.draft.first_km.clone(),
            FormField::RepeatMonths => self.draft.repeat_months.clone(),
            FormField::RepeatKm => self.draft.repeat_km.clone(),
        }
    }

    /// Cycle through maintenance types; position 0 is "none chosen"
    pub fn cycle_maintenance(&mut self, delta: i64) {
        let count = self.maintenance.len() as i64;
        if count == 0 {
            return;
        }
        let position = self.maint_index.map(|i| i as i64 + 1).unwrap_or(0);
        let next = (position + delta).rem_euclid(count + 1);

        self.maint_index = if next == 0 { None } else { Some(next as usize - 1) };
        self.draft.maint_code = self
            .maint_index
            .and_then(|i| self.maintenance.types().get(i))
            .map(|t| t.code.clone())
            .unwrap_or_default();
    }

    pub fn save_rule(&mut self) {
        match self.rules.add(&self.draft, self.session.state()) {
            Ok(rule) => {
                let message = format!("Rule {} saved ({} → {}).", rule.rule_id, rule.maint_code, rule.scope_summary());
                self.set_status(StatusKind::Success, message);
                self.rules_state.select(Some(self.rules.len() - 1));
            }
            Err(err) => self.set_status(StatusKind::Error, err.to_string()),
        }
    }

    pub fn export(&mut self) {
        match export_to_path(self.rules.rules(), &self.output_path) {
            Ok(count) => {
                let message = format!("Exported {} rule(s) to {}", count, self.output_path.display());
                self.set_status(StatusKind::Success, message);
            }
            Err(err) => self.set_status(StatusKind::Error, format!("Export failed: {:#}", err)),
        }
    }

    // ------------------------------------------------------------------------
    // Keys
    // ------------------------------------------------------------------------

    /// Handle one key; returns true when the app should quit
    pub fn on_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        match self.mode {
            Mode::Search => {
                self.on_search_key(code);
                false
            }
            Mode::Editing => {
                self.on_edit_key(code);
                false
            }
            Mode::Normal => self.on_normal_key(code, modifiers),
        }
    }

    fn on_search_key(&mut self, code: KeyCode) {
        let Some(facet) = self.current_facet() else {
            self.mode = Mode::Normal;
            return;
        };
        match code {
            KeyCode::Enter | KeyCode::Esc => self.mode = Mode::Normal,
            KeyCode::Backspace => {
                self.search[facet.index()].pop();
            }
            KeyCode::Char(c) => self.search[facet.index()].push(c),
            _ => {}
        }
        self.list_state.select(Some(0));
        self.clamp_cursor();
    }

    fn on_edit_key(&mut self, code: KeyCode) {
        let field = self.current_field();
        match code {
            KeyCode::Enter | KeyCode::Esc => self.mode = Mode::Normal,
            KeyCode::Backspace => {
                if let Some(value) = self.field_mut(field) {
                    value.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(value) = self.field_mut(field) {
                    value.push(c);
                }
            }
            _ => {}
        }
    }

    fn on_normal_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab if modifiers.contains(KeyModifiers::SHIFT) => {
                self.focus = self.focus.previous()
            }
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.previous(),
            KeyCode::Char('s') => self.save_rule(),
            KeyCode::Char('e') => self.export(),
            KeyCode::Char('c') => self.reset_filters(),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            _ => match self.focus {
                Focus::Filters => self.on_filter_key(code),
                Focus::Form => self.on_form_key(code),
                Focus::Rules => {}
            },
        }
        false
    }

    fn on_filter_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Right => self.next_tab(),
            KeyCode::Left => self.previous_tab(),
            KeyCode::Char('+') | KeyCode::Char('=') if self.current_tab() == FilterTab::Years => {
                self.adjust_year(1)
            }
            KeyCode::Char('-') if self.current_tab() == FilterTab::Years => self.adjust_year(-1),
            KeyCode::Char(' ') => self.toggle_current(),
            KeyCode::Char('a') => self.select_all_visible(),
            KeyCode::Char('n') => self.clear_current(),
            KeyCode::Char('/') if self.current_facet().is_some() => self.mode = Mode::Search,
            _ => {}
        }
    }

    fn on_form_key(&mut self, code: KeyCode) {
        match (self.current_field(), code) {
            (FormField::MaintCode, KeyCode::Right) => self.cycle_maintenance(1),
            (FormField::MaintCode, KeyCode::Left) => self.cycle_maintenance(-1),
            (FormField::MaintCode, _) => {}
            (_, KeyCode::Enter) => self.mode = Mode::Editing,
            _ => {}
        }
    }
}

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
            if app.on_key(key.code, key.modifiers) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(38), // Filters
            Constraint::Percentage(62), // Preview, form, rules
        ])
        .split(chunks[1]);

    render_filters(f, columns[0], app);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(6),
            Constraint::Length(9),
            Constraint::Length(8),
        ])
        .split(columns[1]);

    render_preview(f, right[0], app);
    render_form(f, right[1], app);
    render_rules(f, right[2], app);

    render_status_bar(f, chunks[2], app);
}

fn focus_style(app: &App, focus: Focus) -> Style {
    if app.focus == focus {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let panels = [Focus::Filters, Focus::Form, Focus::Rules];

    let mut spans = vec![Span::styled(
        format!("maint-assign v{}  ", maint_assign::VERSION),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];
    for (i, panel) in panels.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" │ "));
        }

        let style = if *panel == app.focus {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        spans.push(Span::styled(panel.title(), style));
    }

    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("Vehicles: {}", app.session.catalog().len()),
        Style::default().fg(Color::White),
    ));
    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("Matching: {}", app.session.match_count()),
        Style::default().fg(Color::Green),
    ));
    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("Rules: {}", app.rules.len()),
        Style::default().fg(Color::Cyan),
    ));

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_filters(f: &mut Frame, area: Rect, app: &mut App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(focus_style(app, Focus::Filters))
        .title(" Filters ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Tabs
            Constraint::Length(1), // Search
            Constraint::Min(0),    // Values
        ])
        .split(inner);

    let titles: Vec<Line> = TABS
        .iter()
        .map(|tab| {
            let active = match tab {
                FilterTab::Facet(facet) => !app.session.state().selection.is_unrestricted(*facet),
                FilterTab::Years => false,
            };
            let marker = if active { "•" } else { "" };
            Line::from(format!("{}{}", tab.title(), marker))
        })
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.tab)
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, parts[0]);

    let Some(facet) = app.current_facet() else {
        render_years(f, parts[1].union(parts[2]), app);
        return;
    };

    let search = &app.search[facet.index()];
    let search_line = if app.mode == Mode::Search {
        Line::from(vec![
            Span::styled("Search: ", Style::default().fg(Color::Yellow)),
            Span::raw(search.clone()),
            Span::styled("▏", Style::default().fg(Color::Yellow)),
        ])
    } else if search.is_empty() {
        Line::from(Span::styled(
            "/ to search, Space toggle, a all, n none",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
    } else {
        Line::from(vec![
            Span::styled("Search: ", Style::default().fg(Color::DarkGray)),
            Span::raw(search.clone()),
        ])
    };
    f.render_widget(Paragraph::new(search_line), parts[1]);

    let values = app.visible_values();
    let total = app.session.availability().values(facet).len();
    let selection = &app.session.state().selection;

    let items: Vec<ListItem> = if values.is_empty() {
        vec![ListItem::new(Span::styled(
            "No values available.",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        values
            .iter()
            .map(|v| {
                let checked = selection.contains(facet, v);
                let mark = if checked { "[x] " } else { "[ ] " };
                let style = if checked {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(vec![Span::styled(mark, style), Span::raw(v.clone())]))
            })
            .collect()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .title(format!(" {} shown / {} ", values.len(), total)),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");

    f.render_stateful_widget(list, parts[2], &mut app.list_state);
}

fn render_years(f: &mut Frame, area: Rect, app: &App) {
    let range = app.session.state().years;
    let bound_style = |bound: YearBound| {
        if app.year_bound == bound {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan)
        }
    };
    let show = |year: Option<i32>| year.map(|y| y.to_string()).unwrap_or_else(|| "—".to_string());

    let available = match app.session.availability().year_bounds() {
        Some((min, max)) => format!("{} – {} ({} years)", min, max, app.session.availability().years().len()),
        None => "No years available.".to_string(),
    };

    let content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  From: ", bound_style(YearBound::From)),
            Span::raw(show(range.from)),
        ]),
        Line::from(vec![
            Span::styled("  To:   ", bound_style(YearBound::To)),
            Span::raw(show(range.to)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Available: ", Style::default().fg(Color::DarkGray)),
            Span::raw(available),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "  ↑/↓ choose bound, +/- change year, n full range",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
    ];

    f.render_widget(Paragraph::new(content), area);
}

fn render_preview(f: &mut Frame, area: Rect, app: &App) {
    let header_cells = ["Year", "Make", "Model", "Engine", "Trans", "Drive", "Fuel"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows: Vec<Row> = app
        .session
        .matched()
        .take(PREVIEW_LIMIT)
        .map(|v| {
            Row::new(vec![
                Cell::from(v.year.map(|y| y.to_string()).unwrap_or_default()),
                Cell::from(truncate(&v.make, 14)),
                Cell::from(truncate(&v.model, 18)),
                Cell::from(truncate(&v.engine, 14)),
                Cell::from(truncate(&v.transmission, 10)),
                Cell::from(truncate(&v.drivetrain, 8)),
                Cell::from(truncate(&v.fuel, 10)),
            ])
            .height(1)
        })
        .collect();

    let title = if app.session.match_count() == 0 {
        " Matching vehicles - no results ".to_string()
    } else {
        format!(
            " Matching vehicles - {} (showing {}) ",
            app.session.match_count(),
            app.session.match_count().min(PREVIEW_LIMIT)
        )
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(15),
            Constraint::Length(19),
            Constraint::Length(15),
            Constraint::Length(11),
            Constraint::Length(9),
            Constraint::Length(11),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    );

    f.render_widget(table, area);
}

fn render_form(f: &mut Frame, area: Rect, app: &App) {
    let lines: Vec<Line> = FormField::ALL
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let selected = app.focus == Focus::Form && i == app.form_field;
            let editing = selected && app.mode == Mode::Editing;

            let label_style = if selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Cyan)
            };
            let hint = match (field, selected, editing) {
                (FormField::MaintCode, true, _) => "  ←/→",
                (_, true, true) => "▏",
                (_, true, false) => "  Enter to edit",
                _ => "",
            };

            Line::from(vec![
                Span::styled(format!(" {:<16}", field.label()), label_style),
                Span::raw(app.field_value(*field)),
                Span::styled(hint, Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();

    let form = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(focus_style(app, Focus::Form))
            .title(format!(" New rule #{} (s to save) ", app.rules.next_id())),
    );

    f.render_widget(form, area);
}

fn render_rules(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["ID", "Code", "Cost", "Retail", "Years", "Applies to"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows: Vec<Row> = app
        .rules
        .rules()
        .iter()
        .map(|rule| {
            Row::new(vec![
                Cell::from(rule.rule_id.to_string()),
                Cell::from(rule.maint_code.clone()),
                Cell::from(rule.cost.clone()),
                Cell::from(rule.retail.clone()),
                Cell::from(rule.year_span()),
                Cell::from(rule.scope_summary()).style(Style::default().fg(Color::Green)),
            ])
            .height(1)
        })
        .collect();

    let title = if app.rules.is_empty() {
        " Saved rules - none yet ".to_string()
    } else {
        format!(" Saved rules - {} (e to export) ", app.rules.len())
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(10),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(11),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(focus_style(app, Focus::Rules))
            .title(title),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.rules_state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let (kind, message) = &app.status;
    let color = match kind {
        StatusKind::Info => Color::Cyan,
        StatusKind::Success => Color::Green,
        StatusKind::Error => Color::Red,
    };

    let mut status_spans = vec![Span::styled(format!(" {} ", message), Style::default().fg(color))];

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Panel | "));
    status_spans.push(Span::styled("←/→", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Filter | "));
    status_spans.push(Span::styled("c", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Reset | "));
    status_spans.push(Span::styled("s", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Save | "));
    status_spans.push(Span::styled("e", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Export | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
