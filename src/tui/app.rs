use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyCode};
use futures_util::StreamExt;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{Receiver, Sender};
use tracing::error;

use crate::{
    portfolio::{display_cased, Asset, NewAsset, PnlSign, PortfolioSummary},
    ApiCommand, AppEvent,
};

const NOTIFICATION_TTL: Duration = Duration::from_secs(5);
const EMPTY_STATE_MESSAGE: &str = "No assets in your portfolio yet. Press 'a' to add one.";
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load assets. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient banner. A new notification overwrites the current one and
/// restarts the dismissal clock.
#[derive(Debug, Clone)]
struct Notification {
    message: String,
    kind: NoticeKind,
    shown_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormField {
    Name,
    Quantity,
    BuyingPrice,
}

impl FormField {
    fn next(self) -> Self {
        match self {
            FormField::Name => FormField::Quantity,
            FormField::Quantity => FormField::BuyingPrice,
            FormField::BuyingPrice => FormField::Name,
        }
    }

    fn prev(self) -> Self {
        match self {
            FormField::Name => FormField::BuyingPrice,
            FormField::Quantity => FormField::Name,
            FormField::BuyingPrice => FormField::Quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Focus {
    Table,
    Form(FormField),
    // name is resolved when the prompt opens so a concurrent reload cannot
    // change what the confirmation claims to delete
    ConfirmDelete { id: i64, name: String },
}

pub struct App {
    should_quit: bool,
    rx: Receiver<AppEvent>,
    commands: Sender<ApiCommand>,
    assets: Vec<Asset>,
    summary: Option<PortfolioSummary>,
    form: NewAsset,
    focus: Focus,
    selected: usize,
    notification: Option<Notification>,
}

impl App {
    pub fn new(rx: Receiver<AppEvent>, commands: Sender<ApiCommand>) -> Self {
        Self {
            should_quit: false,
            rx,
            commands,
            assets: vec![],
            summary: None,
            form: NewAsset::default(),
            focus: Focus::Table,
            selected: 0,
            notification: None,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = ratatui::init();
        let _ = terminal.clear();

        let mut events = EventStream::new();

        let period = Duration::from_secs_f64(1.0 / 20.0);
        let mut interval = tokio::time::interval(period);

        // initial sync with the backend
        self.send(ApiCommand::LoadAssets);

        while !self.should_quit {
            tokio::select! {
                _ = interval.tick() => {
                    self.expire_notification();
                    terminal.draw(|frame| self.render(frame))?;
                },
                Some(Ok(event)) = events.next() => self.handle_events(event),
                Some(event) = self.rx.recv() => self.handle_app_event(event),
            }
        }

        Ok(())
    }

    fn send(&mut self, command: ApiCommand) {
        if let Err(err) = self.commands.try_send(command) {
            error!("Command channel unavailable: {err}");
            self.notify(
                "Unable to reach the backend worker. Please restart.".to_string(),
                NoticeKind::Error,
            );
        }
    }

    fn notify(&mut self, message: String, kind: NoticeKind) {
        self.notification = Some(Notification {
            message,
            kind,
            shown_at: Instant::now(),
        });
    }

    fn expire_notification(&mut self) {
        if let Some(notification) = &self.notification {
            if notification.shown_at.elapsed() >= NOTIFICATION_TTL {
                self.notification = None;
            }
        }
    }

    fn selected_asset(&self) -> Option<&Asset> {
        self.assets.get(self.selected)
    }

    fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Assets(response) => {
                self.assets = response.assets;
                self.summary = Some(response.summary);
                if self.selected >= self.assets.len() {
                    self.selected = self.assets.len().saturating_sub(1);
                }
            }
            AppEvent::LoadFailed(message) => {
                self.assets.clear();
                self.selected = 0;
                self.notify(message, NoticeKind::Error);
            }
            AppEvent::AssetCreated { message } => {
                self.notify(message, NoticeKind::Success);
                self.form = NewAsset::default();
                self.send(ApiCommand::LoadAssets);
            }
            AppEvent::CreateFailed { message } => {
                self.notify(message, NoticeKind::Error);
            }
            AppEvent::AssetDeleted { message } => {
                self.notify(message, NoticeKind::Success);
                self.send(ApiCommand::LoadAssets);
            }
            AppEvent::DeleteFailed { message } => {
                self.notify(message, NoticeKind::Error);
            }
        }
    }

    fn handle_events(&mut self, event: Event) {
        if let Some(key) = event.as_key_press_event() {
            self.handle_key(key.code);
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        match self.focus.clone() {
            Focus::Table => self.handle_table_key(code),
            Focus::Form(field) => self.handle_form_key(field, code),
            Focus::ConfirmDelete { id, .. } => self.handle_confirm_key(id, code),
        }
    }

    fn handle_table_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('a') => self.focus = Focus::Form(FormField::Name),
            KeyCode::Char('r') => self.send(ApiCommand::LoadAssets),
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => {
                if self.selected + 1 < self.assets.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(asset) = self.selected_asset() {
                    self.focus = Focus::ConfirmDelete {
                        id: asset.id,
                        name: display_cased(&asset.name),
                    };
                }
            }
            _ => {}
        }
    }

    fn handle_form_key(&mut self, field: FormField, code: KeyCode) {
        match code {
            KeyCode::Esc => self.focus = Focus::Table,
            KeyCode::Tab | KeyCode::Down => self.focus = Focus::Form(field.next()),
            KeyCode::BackTab | KeyCode::Up => self.focus = Focus::Form(field.prev()),
            KeyCode::Enter => {
                self.send(ApiCommand::CreateAsset(self.form.clone()));
            }
            KeyCode::Backspace => {
                self.form_field_mut(field).pop();
            }
            KeyCode::Char(c) => {
                self.form_field_mut(field).push(c);
            }
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, id: i64, code: KeyCode) {
        match code {
            KeyCode::Char('y') | KeyCode::Enter => {
                self.send(ApiCommand::DeleteAsset(id));
                self.focus = Focus::Table;
            }
            KeyCode::Char('n') | KeyCode::Esc => self.focus = Focus::Table,
            _ => {}
        }
    }

    fn form_field_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Name => &mut self.form.name,
            FormField::Quantity => &mut self.form.quantity,
            FormField::BuyingPrice => &mut self.form.buying_price_per_unit,
        }
    }

    fn render(&self, frame: &mut Frame) {
        let [banner_area, header_area, form_area, summary_area, table_area, footer_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(6),
                Constraint::Fill(1),
                Constraint::Length(3),
            ])
            .areas(frame.area());

        self.render_banner(frame, banner_area);
        self.render_header(frame, header_area);
        self.render_form(frame, form_area);
        self.render_summary(frame, summary_area);
        self.render_table(frame, table_area);
        self.render_footer(frame, footer_area);
    }

    fn render_banner(&self, frame: &mut Frame, area: Rect) {
        if let Some(notification) = &self.notification {
            let style = match notification.kind {
                NoticeKind::Success => Style::default().fg(Color::Black).bg(Color::Green),
                NoticeKind::Error => Style::default().fg(Color::White).bg(Color::Red),
            };
            let p = Paragraph::new(Line::from(notification.message.clone())).style(style);
            frame.render_widget(p, area);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("Asset Portfolio Tracker")
            .borders(Borders::ALL);
        frame.render_widget(block, area);
    }

    fn render_form(&self, frame: &mut Frame, area: Rect) {
        let [name_area, quantity_area, price_area] = Layout::horizontal([
            Constraint::Fill(2),
            Constraint::Fill(1),
            Constraint::Fill(1),
        ])
        .areas(area);

        let inputs = [
            (name_area, "Name", &self.form.name, FormField::Name),
            (
                quantity_area,
                "Quantity",
                &self.form.quantity,
                FormField::Quantity,
            ),
            (
                price_area,
                "Buying price per unit ($)",
                &self.form.buying_price_per_unit,
                FormField::BuyingPrice,
            ),
        ];

        for (input_area, title, value, field) in inputs {
            let active = self.focus == Focus::Form(field);
            let block = Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(if active {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                });
            let text = if active {
                format!("{value}_")
            } else {
                value.clone()
            };
            frame.render_widget(Paragraph::new(text).block(block), input_area);
        }
    }

    fn render_summary(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().title("Summary").borders(Borders::ALL);
        let Some(summary) = &self.summary else {
            frame.render_widget(block, area);
            return;
        };

        let pnl_style = sign_style(PnlSign::classify(&summary.overall_profit_loss_percentage));
        let lines = vec![
            Line::from(vec![
                Span::raw("Total current value: "),
                Span::styled(
                    summary.total_portfolio_current_value.clone(),
                    Style::default().fg(Color::Yellow),
                ),
            ]),
            Line::from(vec![
                Span::raw("Total buying value:  "),
                Span::styled(
                    summary.total_portfolio_buying_value.clone(),
                    Style::default().fg(Color::Yellow),
                ),
            ]),
            Line::from(vec![
                Span::raw("Overall profit/loss: "),
                Span::styled(summary.overall_profit_loss_usd.clone(), pnl_style),
                Span::raw(" ("),
                Span::styled(summary.overall_profit_loss_percentage.clone(), pnl_style),
                Span::raw(")"),
            ]),
        ];
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_table(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().title("Assets").borders(Borders::ALL);

        if self.assets.is_empty() {
            let p = Paragraph::new(Line::from(EMPTY_STATE_MESSAGE)).block(block);
            frame.render_widget(p, area);
            return;
        }

        let header = Row::new(vec![
            "Name",
            "Quantity",
            "Buy price",
            "Current price",
            "Buy value",
            "Current value",
            "P/L ($)",
            "P/L (%)",
        ])
        .style(Style::default().add_modifier(Modifier::BOLD));

        let rows: Vec<Row> = self
            .assets
            .iter()
            .enumerate()
            .map(|(i, asset)| {
                let sign = PnlSign::classify(&asset.profit_loss_percentage);
                let cells: Vec<Cell> = asset_cells(asset)
                    .into_iter()
                    .enumerate()
                    .map(|(col, text)| match col {
                        0 => Cell::from(text).style(Style::default().fg(Color::Blue)),
                        // the two profit/loss columns carry the sign color
                        6 | 7 => Cell::from(text).style(sign_style(sign)),
                        _ => Cell::from(text),
                    })
                    .collect();
                let row = Row::new(cells);
                if i == self.selected {
                    row.style(Style::default().add_modifier(Modifier::REVERSED))
                } else {
                    row
                }
            })
            .collect();

        let widths = [
            Constraint::Fill(2),
            Constraint::Fill(1),
            Constraint::Fill(1),
            Constraint::Fill(1),
            Constraint::Fill(1),
            Constraint::Fill(1),
            Constraint::Fill(1),
            Constraint::Fill(1),
        ];
        let table = Table::new(rows, widths).header(header).block(block);
        frame.render_widget(table, area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL);
        let line = match &self.focus {
            Focus::ConfirmDelete { name, .. } => Line::from(Span::styled(
                format!("Delete {name}? (y/n)"),
                Style::default().fg(Color::Red),
            )),
            Focus::Form(_) => Line::from(
                "Tab: next field / Enter: add asset / Esc: back to table",
            ),
            Focus::Table => Line::from(
                "Up/Down: select / a: add / d: delete / r: reload / q: quit",
            ),
        };
        frame.render_widget(Paragraph::new(line).block(block), area);
    }
}

/// The eight table columns for one asset, in display order.
fn asset_cells(asset: &Asset) -> [String; 8] {
    [
        display_cased(&asset.name),
        asset.quantity.clone(),
        asset.buying_price_per_unit.clone(),
        asset.current_price_per_unit.clone(),
        asset.buying_value_usd.clone(),
        asset.current_value_usd.clone(),
        asset.profit_loss_usd.clone(),
        asset.profit_loss_percentage.clone(),
    ]
}

fn sign_style(sign: PnlSign) -> Style {
    match sign {
        PnlSign::Profit => Style::default().fg(Color::Green),
        PnlSign::Loss => Style::default().fg(Color::Red),
        PnlSign::Even => Style::default().fg(Color::DarkGray),
    }
}
