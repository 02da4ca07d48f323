use crate::error::GatewayError;
use crate::format::{format_currency, format_percent, format_units, format_with_commas};
use crate::gateway::FundsGateway;
use crate::history::{chart_points, nav_bounds};
use crate::holding::{next_local_id, FormField, HoldingForm};
use crate::listing::{SortKey, SortState};
use crate::refresh::{Poller, Ticket};
use crate::route::Route;
use crate::store::PortfolioStore;
use crate::views::{
    self, DashboardState, FundDetailState, FundsAction, FundsState, LoadStatus, Payload,
    PortfolioAction, PortfolioMode, PortfolioState, ViewState,
};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Cell, Chart, Clear, Dataset, GraphType, List, ListItem, Paragraph,
        Row, Table, TableState, Tabs, Wrap,
    },
    Frame, Terminal,
};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tui_big_text::{BigText, PixelSize};

/// Settings the terminal front end needs from the configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base_url: String,
    pub currency: String,
    pub refresh_interval: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppMode {
    Normal,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NetworkStatus {
    Connected,
    Disconnected,
    Pending,
}

/// Messages from background tasks. Each carries the generation of the view
/// that asked for it, so results for an unmounted view are ignored.
#[derive(Debug)]
pub enum AppEvent {
    RefreshDue(u64),
    Loaded {
        generation: u64,
        ticket: Ticket,
        outcome: Result<Payload, GatewayError>,
    },
    Categories {
        generation: u64,
        outcome: Result<Vec<String>, GatewayError>,
    },
}

enum Dialog {
    Form,
    ConfirmDelete,
}

pub struct App {
    pub view: ViewState,
    pub mode: AppMode,
    pub should_quit: bool,
    pub error_message: Option<String>,
    pub currency: String,
    api_base_url: String,
    refresh_interval: Duration,
    gateway: Arc<dyn FundsGateway>,
    store: Arc<dyn PortfolioStore>,
    generation: u64,
    // dropping it stops the mounted view's timer
    _poller: Option<Poller>,
    sender: mpsc::UnboundedSender<AppEvent>,
    events: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    pub fn new(
        gateway: Arc<dyn FundsGateway>,
        store: Arc<dyn PortfolioStore>,
        settings: Settings,
    ) -> App {
        let (sender, events) = mpsc::unbounded_channel();
        App {
            view: ViewState::default(),
            mode: AppMode::Normal,
            should_quit: false,
            error_message: None,
            currency: settings.currency,
            api_base_url: settings.api_base_url,
            refresh_interval: settings.refresh_interval,
            gateway,
            store,
            generation: 0,
            _poller: None,
            sender,
            events,
        }
    }

    /// Unmounts the current view and mounts the one at `route`: its timer
    /// starts and its first fetch goes out.
    pub fn navigate(&mut self, route: Route) {
        self.generation += 1;
        self.mode = AppMode::Normal;
        self.view = ViewState::mount(&route);
        tracing::info!(%route, generation = self.generation, "mounting view");

        let generation = self.generation;
        self._poller = Some(Poller::start(
            self.refresh_interval,
            self.sender.clone(),
            move || AppEvent::RefreshDue(generation),
        ));

        if route == Route::Funds {
            self.fetch_categories();
        }
        self.refresh();
    }

    pub fn refresh(&mut self) {
        let (view, ticket) = std::mem::take(&mut self.view).begin_fetch();
        self.view = view;

        let route = self.view.route();
        let gateway = Arc::clone(&self.gateway);
        let sender = self.sender.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let outcome = views::load(gateway.as_ref(), &route).await;
            let event = AppEvent::Loaded {
                generation,
                ticket,
                outcome,
            };
            if sender.send(event).is_err() {
                tracing::debug!(%route, "event loop gone, dropping fetch result");
            }
        });
    }

    fn fetch_categories(&self) {
        let gateway = Arc::clone(&self.gateway);
        let sender = self.sender.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let outcome = gateway.categories().await;
            let event = AppEvent::Categories {
                generation,
                outcome,
            };
            if sender.send(event).is_err() {
                tracing::debug!("event loop gone, dropping categories");
            }
        });
    }

    pub fn try_receive_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
        }
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::RefreshDue(generation) if generation == self.generation => self.refresh(),
            AppEvent::Loaded {
                generation,
                ticket,
                outcome,
            } if generation == self.generation => {
                self.update_view(|view| view.receive(ticket, outcome));
                if let ViewState::Portfolio(state) = &self.view {
                    self.store.observe(&state.portfolio.items);
                }
            }
            AppEvent::Categories {
                generation,
                outcome,
            } if generation == self.generation => match outcome {
                Ok(categories) => self.update_funds(FundsAction::Categories(categories)),
                Err(e) => tracing::warn!(error = %e, "could not load categories"),
            },
            other => tracing::debug!(?other, "dropping event of an unmounted view"),
        }
    }

    pub fn network_status(&self) -> NetworkStatus {
        let status = self.view.status();
        if status.error.is_some() {
            NetworkStatus::Disconnected
        } else if status.last_updated.is_some() {
            NetworkStatus::Connected
        } else {
            NetworkStatus::Pending
        }
    }

    fn update_view(&mut self, f: impl FnOnce(ViewState) -> ViewState) {
        let view = std::mem::take(&mut self.view);
        self.view = f(view);
    }

    fn update_funds(&mut self, action: FundsAction) {
        self.update_view(|view| match view {
            ViewState::Funds(state) => ViewState::Funds(state.update(action)),
            other => other,
        });
    }

    fn update_portfolio(&mut self, action: PortfolioAction) {
        self.update_view(|view| match view {
            ViewState::Portfolio(state) => ViewState::Portfolio(state.update(action)),
            other => other,
        });
    }

    pub fn next_tab(&mut self) {
        let tabs = Route::nav_entries();
        let current_index = self.view.route().nav_index();
        self.navigate(tabs[(current_index + 1) % tabs.len()].clone());
    }

    pub fn previous_tab(&mut self) {
        let tabs = Route::nav_entries();
        let current_index = self.view.route().nav_index();
        self.navigate(tabs[(current_index + tabs.len() - 1) % tabs.len()].clone());
    }

    fn open_selected_fund(&mut self) {
        let id = match &self.view {
            ViewState::Funds(state) => state.selected_fund().map(|fund| fund.id.clone()),
            _ => None,
        };
        if let Some(id) = id {
            self.navigate(Route::FundDetail(id));
        }
    }

    fn dialog(&self) -> Option<Dialog> {
        match &self.view {
            ViewState::Portfolio(state) => match state.mode {
                PortfolioMode::Browse => None,
                PortfolioMode::Form(_) => Some(Dialog::Form),
                PortfolioMode::ConfirmDelete(_) => Some(Dialog::ConfirmDelete),
            },
            _ => None,
        }
    }

    /// Validates the open dialog and sends its change to the store. Invalid
    /// forms stay open behind an error popup.
    async fn submit_dialog(&mut self) {
        let pending = match &self.view {
            ViewState::Portfolio(state) => state.pending_mutation(next_local_id()),
            _ => None,
        };
        let mutation = match pending {
            Some(Ok(mutation)) => mutation,
            Some(Err(e)) => {
                self.error_message = Some(e.to_string());
                return;
            }
            None => return,
        };

        match mutation.apply(self.store.as_ref()).await {
            Ok(ack) => self.update_view(|view| match view {
                ViewState::Portfolio(state) => ViewState::Portfolio(state.acknowledged(ack)),
                other => other,
            }),
            Err(e) => {
                tracing::error!(error = %e, "portfolio change rejected");
                self.error_message = Some(e.to_string());
                self.update_portfolio(PortfolioAction::Cancel);
            }
        }
    }

    pub async fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        // any key dismisses the error popup
        if self.error_message.take().is_some() {
            return;
        }
        if self.mode == AppMode::Search {
            self.handle_search_key(key.code);
            return;
        }
        match self.dialog() {
            Some(Dialog::Form) => self.handle_form_key(key.code).await,
            Some(Dialog::ConfirmDelete) => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => self.submit_dialog().await,
                KeyCode::Char('n') | KeyCode::Esc => self.update_portfolio(PortfolioAction::Cancel),
                _ => {}
            },
            None => self.handle_normal_key(key.code),
        }
    }

    fn handle_search_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.update_funds(FundsAction::ClearSearch);
                self.mode = AppMode::Normal;
            }
            KeyCode::Enter => self.mode = AppMode::Normal,
            KeyCode::Backspace => self.update_funds(FundsAction::EraseSearch),
            KeyCode::Char(c) => self.update_funds(FundsAction::TypeSearch(c)),
            _ => {}
        }
    }

    async fn handle_form_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => self.update_portfolio(PortfolioAction::Cancel),
            KeyCode::Enter => self.submit_dialog().await,
            KeyCode::Tab | KeyCode::Down => self.update_portfolio(PortfolioAction::FocusNext),
            KeyCode::BackTab | KeyCode::Up => self.update_portfolio(PortfolioAction::FocusPrevious),
            KeyCode::Backspace => self.update_portfolio(PortfolioAction::Erase),
            KeyCode::Char(c) => self.update_portfolio(PortfolioAction::Type(c)),
            _ => {}
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            // Vim navigation - hjkl
            KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab => self.previous_tab(),
            KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => self.next_tab(),
            KeyCode::Char('r') => self.refresh(),
            _ => match self.view.route() {
                Route::Funds => self.handle_funds_key(code),
                Route::FundDetail(_) => {
                    if matches!(code, KeyCode::Char('b') | KeyCode::Backspace) {
                        self.navigate(Route::Funds);
                    }
                }
                Route::Portfolio => self.handle_portfolio_key(code),
                Route::Dashboard => {}
            },
        }
    }

    fn handle_funds_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('j') | KeyCode::Down => self.update_funds(FundsAction::SelectNext),
            KeyCode::Char('k') | KeyCode::Up => self.update_funds(FundsAction::SelectPrevious),
            KeyCode::Char('/') => self.mode = AppMode::Search,
            KeyCode::Char('c') => self.update_funds(FundsAction::CycleCategory),
            KeyCode::Char(c @ '1'..='4') => {
                let index = c as usize - '1' as usize;
                self.update_funds(FundsAction::SortBy(SortKey::all()[index]));
            }
            KeyCode::Enter => self.open_selected_fund(),
            _ => {}
        }
    }

    fn handle_portfolio_key(&mut self, code: KeyCode) {
        let action = match code {
            KeyCode::Char('j') | KeyCode::Down => PortfolioAction::SelectNext,
            KeyCode::Char('k') | KeyCode::Up => PortfolioAction::SelectPrevious,
            KeyCode::Char('a') => PortfolioAction::OpenAdd,
            KeyCode::Char('e') => PortfolioAction::OpenEdit,
            KeyCode::Char('d') => PortfolioAction::RequestDelete,
            _ => return,
        };
        self.update_portfolio(action);
    }
}

pub async fn run_tui(
    gateway: Arc<dyn FundsGateway>,
    store: Arc<dyn PortfolioStore>,
    settings: Settings,
    route: Route,
) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(gateway, store, settings);
    app.navigate(route);

    let res = run_app(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        // Apply results from background fetches and timers (non-blocking)
        app.try_receive_events();

        if crossterm::event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key).await;
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_tabs(f, chunks[0], app);

    match &app.view {
        ViewState::Dashboard(state) => render_dashboard(f, chunks[1], state, &app.currency),
        ViewState::Funds(state) => render_funds(f, chunks[1], state, app.mode),
        ViewState::FundDetail(state) => render_fund_detail(f, chunks[1], state),
        ViewState::Portfolio(state) => render_portfolio(f, chunks[1], state, &app.currency),
    }

    render_help(f, chunks[2], app);

    if let ViewState::Portfolio(state) = &app.view {
        match &state.mode {
            PortfolioMode::Form(form) => render_holding_form(f, form),
            PortfolioMode::ConfirmDelete(id) => render_delete_confirmation(f, state, *id),
            PortfolioMode::Browse => {}
        }
    }

    if let Some(error) = &app.error_message {
        render_error_popup(f, error);
    }
}

fn render_tabs(f: &mut Frame, area: Rect, app: &App) {
    let route = app.view.route();
    let tab_titles: Vec<Line> = Route::nav_entries()
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let style = if i == route.nav_index() {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(Span::styled(r.title(), style))
        })
        .collect();

    let status = app.view.status();
    let network_indicator = match app.network_status() {
        NetworkStatus::Connected => "🟢",
        NetworkStatus::Pending => "🟡",
        NetworkStatus::Disconnected => "🔴",
    };
    let refresh_indicator = if status.loading { " 🔄" } else { "" };
    let title = format!(
        "MF Tracker {} {}{} | updated {}",
        network_indicator,
        app.api_base_url,
        refresh_indicator,
        status.last_updated_label()
    );

    let tabs = Tabs::new(tab_titles)
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(Color::White))
        .highlight_style(Style::default().fg(Color::Yellow))
        .select(route.nav_index());

    f.render_widget(tabs, area);
}

fn render_help(f: &mut Frame, area: Rect, app: &App) {
    let help_text = match (&app.view, app.mode) {
        (ViewState::Funds(_), AppMode::Search) => "Search: type to filter | Enter (done) | Esc (clear)",
        (ViewState::Funds(_), AppMode::Normal) => {
            "j/k (select) | Enter (open) | / (search) | c (category) | 1-4 (sort) | r (refresh) | h/l (tabs) | q (quit)"
        }
        (ViewState::FundDetail(_), _) => "b (back to funds) | r (refresh) | h/l (tabs) | q (quit)",
        (ViewState::Portfolio(state), _) => match state.mode {
            PortfolioMode::Form(_) => "Tab/Shift-Tab (field) | Enter (save) | Esc (cancel)",
            PortfolioMode::ConfirmDelete(_) => "y (delete) | n (keep)",
            PortfolioMode::Browse => {
                "j/k (select) | a (add) | e (edit) | d (delete) | r (refresh) | h/l (tabs) | q (quit)"
            }
        },
        (ViewState::Dashboard(_), _) => "r (refresh) | h/l (tabs) | q (quit)",
    };

    let help = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL).title("Help"))
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center);
    f.render_widget(help, area);
}

fn signed_color(value: f64) -> Color {
    if value >= 0.0 {
        Color::Green
    } else {
        Color::Red
    }
}

// A failed first fetch still draws the view, empty; only the header shows
// the failure.
fn awaiting_first_load(status: &LoadStatus) -> bool {
    status.last_updated.is_none() && status.error.is_none()
}

fn render_message(f: &mut Frame, area: Rect, title: &str, message: &str, color: Color) {
    let paragraph = Paragraph::new(message.to_string())
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .style(Style::default().fg(color))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn render_dashboard(f: &mut Frame, area: Rect, state: &DashboardState, currency: &str) {
    if awaiting_first_load(&state.status) {
        render_loading(f, area);
        return;
    }

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Length(5),
            Constraint::Min(0),
        ])
        .split(area);

    let totals = state.totals();

    // Total portfolio value, symbols spelled out for the block font
    let big_text_value = format!("{} {}", format_with_commas(totals.current_value), currency);
    let big_text = BigText::builder()
        .pixel_size(PixelSize::Quadrant)
        .style(
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
        .lines(vec![big_text_value.clone().into()])
        .build();

    let big_text_widget = Block::default()
        .borders(Borders::ALL)
        .title(format!("Portfolio Value ({currency})"))
        .title_alignment(Alignment::Center);
    f.render_widget(big_text_widget, main_chunks[0]);

    let inner = main_chunks[0].inner(Margin {
        horizontal: 1,
        vertical: 1,
    });
    let big_text_width = big_text_value.len() as u16 * 4;
    let centered_area = if big_text_width < inner.width {
        let margin = (inner.width - big_text_width) / 2;
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(margin),
                Constraint::Min(0),
                Constraint::Length(margin),
            ])
            .split(inner)[1]
    } else {
        inner
    };
    f.render_widget(big_text, centered_area);

    let stat_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(33),
            Constraint::Percentage(34),
        ])
        .split(main_chunks[1]);

    let invested = Paragraph::new(vec![
        Line::from(format_currency(totals.invested, currency)),
        Line::from(Span::styled(
            format!("{} holdings", state.portfolio.items.len()),
            Style::default().fg(Color::Gray),
        )),
    ])
    .block(Block::default().borders(Borders::ALL).title("Invested"))
    .alignment(Alignment::Center);
    f.render_widget(invested, stat_chunks[0]);

    let gain_style = Style::default().fg(signed_color(totals.gain_loss));
    let gain = Paragraph::new(vec![
        Line::from(Span::styled(format_currency(totals.gain_loss, currency), gain_style)),
        Line::from(Span::styled(format_percent(totals.gain_loss_percent), gain_style)),
    ])
    .block(Block::default().borders(Borders::ALL).title("Gain/Loss"))
    .alignment(Alignment::Center);
    f.render_widget(gain, stat_chunks[1]);

    let market_lines = match &state.summary {
        Some(summary) => {
            let status_color = if summary.market_status == "Open" {
                Color::Green
            } else {
                Color::Yellow
            };
            vec![
                Line::from(vec![
                    Span::styled(summary.market_status.clone(), Style::default().fg(status_color)),
                    Span::raw(format!(" | {} funds", summary.total_funds)),
                ]),
                Line::from(Span::styled(
                    summary.last_updated_display(),
                    Style::default().fg(Color::Gray),
                )),
            ]
        }
        None => vec![Line::from("N/A")],
    };
    let market = Paragraph::new(market_lines)
        .block(Block::default().borders(Borders::ALL).title("Market"))
        .alignment(Alignment::Center);
    f.render_widget(market, stat_chunks[2]);

    let list_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(main_chunks[2]);

    let top: Vec<ListItem> = state
        .summary
        .iter()
        .flat_map(|summary| summary.top_performing.iter())
        .map(|fund| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<30}", fund.name), Style::default().fg(Color::Cyan)),
                Span::raw(format!("{:>10.2}  ", fund.nav)),
                Span::styled(fund.category.clone(), Style::default().fg(Color::Gray)),
            ]))
        })
        .collect();
    let top_list = List::new(top)
        .block(Block::default().borders(Borders::ALL).title("Top Performing"))
        .style(Style::default().fg(Color::White));
    f.render_widget(top_list, list_chunks[0]);

    let header = Row::new(["Name", "Code", "NAV"].map(|h| {
        Cell::from(h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    }));
    let rows = state.recent_funds().iter().map(|fund| {
        Row::new(vec![
            Cell::from(fund.name.clone()),
            Cell::from(fund.code.clone()),
            Cell::from(format!("{:.2}", fund.nav)),
        ])
    });
    let recent = Table::new(
        rows,
        [
            Constraint::Percentage(60),
            Constraint::Percentage(20),
            Constraint::Percentage(20),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title("Recent Funds"))
    .style(Style::default().fg(Color::White));
    f.render_widget(recent, list_chunks[1]);
}

fn column_title(key: SortKey, sort: SortState) -> String {
    let title = match key {
        SortKey::Name => "Name",
        SortKey::Code => "Code",
        SortKey::Nav => "NAV",
        SortKey::Category => "Category",
    };
    if key == sort.key {
        format!("{title} {}", sort.direction.arrow())
    } else {
        title.to_string()
    }
}

fn render_funds(f: &mut Frame, area: Rect, state: &FundsState, mode: AppMode) {
    if awaiting_first_load(&state.status) {
        render_loading(f, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let visible = state.visible();

    let search_style = if mode == AppMode::Search {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    };
    let cursor = if mode == AppMode::Search { "▌" } else { "" };
    let controls = Paragraph::new(Line::from(vec![
        Span::styled("Search: ", Style::default().fg(Color::Gray)),
        Span::styled(format!("{}{cursor}", state.search), search_style),
        Span::styled("   Category: ", Style::default().fg(Color::Gray)),
        Span::styled(state.category.label().to_string(), Style::default().fg(Color::Cyan)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Showing {} of {} funds", visible.len(), state.funds.len())),
    );
    f.render_widget(controls, chunks[0]);

    let header_cells = SortKey::all().iter().map(|key| {
        Cell::from(column_title(*key, state.sort)).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = Row::new(header_cells).height(1).bottom_margin(1);

    let rows = visible.iter().map(|fund| {
        Row::new(vec![
            Cell::from(fund.name.clone()),
            Cell::from(fund.code.clone()),
            Cell::from(fund.category.clone()),
            Cell::from(format!("{:.2}", fund.nav)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(50),
            Constraint::Percentage(15),
            Constraint::Percentage(25),
            Constraint::Percentage(10),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title("Mutual Funds"))
    .style(Style::default().fg(Color::White))
    .row_highlight_style(Style::default().bg(Color::DarkGray));

    let mut table_state = TableState::default();
    if !visible.is_empty() {
        table_state.select(Some(state.selected));
    }
    f.render_stateful_widget(table, chunks[1], &mut table_state);
}

fn render_fund_detail(f: &mut Frame, area: Rect, state: &FundDetailState) {
    let Some(detail) = &state.detail else {
        match &state.status.error {
            Some(error) => render_message(
                f,
                area,
                "Fund Detail",
                &format!("{error}\n\nPress b to go back to funds"),
                Color::Red,
            ),
            None => render_loading(f, area),
        }
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(10),
            Constraint::Length(6),
        ])
        .split(area);

    let fund = &detail.fund;
    let heading = Paragraph::new(vec![
        Line::from(Span::styled(
            fund.name.clone(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(format!("Code {}  ", fund.code), Style::default().fg(Color::Gray)),
            Span::styled(format!("NAV {:.4}", fund.nav), Style::default().fg(Color::Green)),
            Span::styled(format!("  as of {}", fund.nav_date), Style::default().fg(Color::Gray)),
        ]),
    ])
    .block(Block::default().borders(Borders::ALL).title("Fund Detail"));
    f.render_widget(heading, chunks[0]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(chunks[1]);

    let metadata: Vec<ListItem> = fund
        .metadata()
        .iter()
        .map(|(label, value)| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{label:<15}"), Style::default().fg(Color::Gray)),
                Span::raw(value.to_string()),
            ]))
        })
        .collect();
    let metadata_list = List::new(metadata)
        .block(Block::default().borders(Borders::ALL).title("Details"))
        .style(Style::default().fg(Color::White));
    f.render_widget(metadata_list, middle[0]);

    render_nav_chart(f, middle[1], state);

    let scheme_lines: Vec<Line> = if detail.scheme_info.is_empty() {
        vec![Line::from(Span::styled(
            "No scheme information",
            Style::default().fg(Color::Gray),
        ))]
    } else {
        detail
            .scheme_info
            .iter()
            .map(|(key, value)| {
                Line::from(vec![
                    Span::styled(format!("{key}: "), Style::default().fg(Color::Gray)),
                    Span::raw(value.clone()),
                ])
            })
            .collect()
    };
    let scheme = Paragraph::new(scheme_lines)
        .block(Block::default().borders(Borders::ALL).title("Scheme Information"))
        .wrap(Wrap { trim: true });
    f.render_widget(scheme, chunks[2]);
}

fn render_nav_chart(f: &mut Frame, area: Rect, state: &FundDetailState) {
    let series = state.series();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("NAV History (last {} days)", series.len()));

    let (Some((low, high)), Some(first), Some(last)) =
        (nav_bounds(&series), series.first(), series.last())
    else {
        let empty = Paragraph::new("No NAV history available")
            .block(block)
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        f.render_widget(empty, area);
        return;
    };

    let points = chart_points(&series);
    let dataset = Dataset::default()
        .name("NAV")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&points);

    let x_max = (series.len().saturating_sub(1)).max(1) as f64;
    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, x_max])
                .labels(vec![first.date.clone(), last.date.clone()]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([low, high])
                .labels(vec![format!("{low:.2}"), format!("{high:.2}")]),
        );
    f.render_widget(chart, area);
}

fn render_portfolio(f: &mut Frame, area: Rect, state: &PortfolioState, currency: &str) {
    if awaiting_first_load(&state.status) && !state.edited {
        render_loading(f, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let totals = state.portfolio.totals();
    let gain_style = Style::default().fg(signed_color(totals.gain_loss));
    let summary = Paragraph::new(Line::from(vec![
        Span::styled("Value ", Style::default().fg(Color::Gray)),
        Span::raw(format_currency(totals.current_value, currency)),
        Span::styled("   Invested ", Style::default().fg(Color::Gray)),
        Span::raw(format_currency(totals.invested, currency)),
        Span::styled("   Gain/Loss ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!(
                "{} ({})",
                format_currency(totals.gain_loss, currency),
                format_percent(totals.gain_loss_percent)
            ),
            gain_style,
        ),
    ]))
    .block(Block::default().borders(Borders::ALL).title("Portfolio"))
    .alignment(Alignment::Center);
    f.render_widget(summary, chunks[0]);

    if state.portfolio.is_empty() {
        render_message(
            f,
            chunks[1],
            "Holdings",
            "No holdings yet. Press a to add one.",
            Color::Gray,
        );
        return;
    }

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[1]);

    let header_cells = ["Fund", "Units", "NAV", "Invested", "Current", "Gain/Loss", "%"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });
    let header = Row::new(header_cells).height(1).bottom_margin(1);

    let rows = state.portfolio.items.iter().map(|item| {
        let color = signed_color(item.gain_loss);
        Row::new(vec![
            Cell::from(item.fund_name.clone()),
            Cell::from(format_units(item.units)),
            Cell::from(format!("{:.2}", item.nav)),
            Cell::from(format_currency(item.invested_amount, currency)),
            Cell::from(format_currency(item.current_value, currency)),
            Cell::from(format_currency(item.gain_loss, currency)).style(Style::default().fg(color)),
            Cell::from(format_percent(item.gain_loss_percent)).style(Style::default().fg(color)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(28),
            Constraint::Percentage(10),
            Constraint::Percentage(10),
            Constraint::Percentage(14),
            Constraint::Percentage(14),
            Constraint::Percentage(14),
            Constraint::Percentage(10),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title("Holdings"))
    .style(Style::default().fg(Color::White))
    .row_highlight_style(Style::default().bg(Color::DarkGray));

    let mut table_state = TableState::default();
    table_state.select(Some(state.selected));
    f.render_stateful_widget(table, body[0], &mut table_state);

    render_allocation(f, body[1], state);
}

fn render_allocation(f: &mut Frame, area: Rect, state: &PortfolioState) {
    let total = state.portfolio.get_total_value();
    let items: Vec<ListItem> = state
        .portfolio
        .allocation()
        .iter()
        .map(|slice| {
            let share = slice.share(total);
            let color = Color::Rgb(slice.color.0, slice.color.1, slice.color.2);
            let bar = "█".repeat(((share * 20.0).round() as usize).max(1));
            ListItem::new(vec![
                Line::from(Span::styled(slice.name.clone(), Style::default().fg(color))),
                Line::from(vec![
                    Span::styled(format!("{bar:<20}"), Style::default().fg(color)),
                    Span::raw(format!(" {:>6.2}%", share * 100.0)),
                ]),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Allocation"))
        .style(Style::default().fg(Color::White));
    f.render_widget(list, area);
}

fn render_loading(f: &mut Frame, area: Rect) {
    let loading_text = Paragraph::new("Loading data...")
        .block(Block::default().borders(Borders::ALL).title("Loading"))
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center);

    f.render_widget(loading_text, area);
}

fn render_holding_form(f: &mut Frame, form: &HoldingForm) {
    let popup_area = centered_rect(60, 60, f.area());
    f.render_widget(Clear, popup_area);

    let title = if form.editing.is_some() {
        " Edit Holding "
    } else {
        " Add Holding "
    };
    let main_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title)
        .title_alignment(Alignment::Center)
        .style(Style::default().bg(Color::Black));
    f.render_widget(main_block, popup_area);

    let mut constraints: Vec<Constraint> = FormField::all().iter().map(|_| Constraint::Length(3)).collect();
    constraints.push(Constraint::Min(0));
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .margin(1)
        .split(popup_area);

    for (i, field) in FormField::all().iter().enumerate() {
        let focused = *field == form.focus;
        let border = if focused { Color::Yellow } else { Color::Gray };
        let cursor = if focused { "▌" } else { "" };
        let input = Paragraph::new(format!("{}{cursor}", form.value(*field)))
            .style(Style::default().fg(Color::White))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border))
                    .title(format!(" {} ", field.label())),
            );
        f.render_widget(input, popup_layout[i]);
    }

    let instructions = Paragraph::new("Enter: Save | Esc: Cancel | Tab: Next field")
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center);
    f.render_widget(instructions, popup_layout[FormField::all().len()]);
}

fn render_delete_confirmation(f: &mut Frame, state: &PortfolioState, id: i64) {
    let popup_area = centered_rect(50, 20, f.area());
    f.render_widget(Clear, popup_area);

    let name = state
        .portfolio
        .get(id)
        .map(|item| item.fund_name.as_str())
        .unwrap_or("this holding");
    let paragraph = Paragraph::new(format!("Delete {name}?\n\ny: Delete | n: Cancel"))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Confirm Delete ")
                .style(Style::default().fg(Color::Yellow)),
        )
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, popup_area);
}

fn render_error_popup(f: &mut Frame, error: &str) {
    let popup_area = centered_rect(60, 20, f.area());
    f.render_widget(Clear, popup_area);

    let error_paragraph = Paragraph::new(error)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Error")
                .style(Style::default().fg(Color::Red)),
        )
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    f.render_widget(error_paragraph, popup_area);
}

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
