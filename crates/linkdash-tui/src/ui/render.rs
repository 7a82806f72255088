use std::time::Instant;

use chrono::Utc;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::app::{App, AppState, Focus, NoticeKind};
use crate::utils::{format_clicks, format_expiry, mask, truncate_string};

use super::styles;

/// Width of the copy indicator column
const COPY_COLUMN_WIDTH: u16 = 3;

/// Width of the clicks column
const CLICKS_COLUMN_WIDTH: u16 = 10;

/// Width of the delete confirmation overlay
const DELETE_OVERLAY_WIDTH: u16 = 60;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(4), // Create form
            Constraint::Min(6),    // Link table
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    if app.is_authenticated() {
        render_create_form(frame, app, chunks[1]);
        render_link_table(frame, app, chunks[2]);
    }
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    match app.state {
        AppState::LoggingIn => render_login_overlay(frame, app),
        AppState::EditingLink => render_edit_overlay(frame, app),
        AppState::ConfirmingDelete => render_delete_overlay(frame, app),
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::Normal | AppState::Quitting => {}
    }

    // Notices sit above everything else
    if app.notice.is_some() {
        render_notice_overlay(frame, app);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  linkdash";
    let right = if app.is_authenticated() {
        format!(
            "{}  [?] Help",
            format_expiry(app.session.expires_at(), Utc::now())
        )
    } else {
        "[?] Help".to_string()
    };

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize)
                .saturating_sub(title.len() + right.chars().count() + 2),
        )),
        Span::styled(right, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn input_line<'a>(label: &'a str, value: &str, focused: bool, width: usize) -> Line<'a> {
    let cursor = if focused { "▌" } else { "" };
    let shown = if value.chars().count() > width {
        // Keep the tail visible while typing
        let skip = value.chars().count() - width;
        value.chars().skip(skip).collect::<String>()
    } else {
        value.to_string()
    };
    Line::from(vec![
        Span::styled(label, styles::muted_style()),
        Span::styled(format!("{}{}", shown, cursor), styles::input_style(focused)),
    ])
}

fn render_create_form(frame: &mut Frame, app: &App, area: Rect) {
    let form_focused = matches!(app.focus, Focus::Slug | Focus::Url);
    let field_width = (area.width as usize).saturating_sub(12);

    let lines = vec![
        input_line(
            " Slug: ",
            &app.slug_input,
            app.focus == Focus::Slug,
            field_width,
        ),
        input_line(
            " URL:  ",
            &app.url_input,
            app.focus == Focus::Url,
            field_width,
        ),
    ];

    let title = if app.busy { " New link (saving...) " } else { " New link " };
    let block = Block::default()
        .title(Span::styled(title, styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(form_focused));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_link_table(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Table;
    let now = Instant::now();

    let block = Block::default()
        .title(Span::styled(
            format!(" Links ({}) ", app.links.len()),
            styles::title_style(),
        ))
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    if app.links.is_empty() {
        let message = if app.loading { "  Loading links..." } else { "  No links yet." };
        let paragraph = Paragraph::new(Line::from(Span::styled(message, styles::muted_style())))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let inner_width = area.width.saturating_sub(2) as usize;
    let slug_width = (inner_width / 4).clamp(8, 32);
    let url_width = inner_width
        .saturating_sub(slug_width + (COPY_COLUMN_WIDTH + CLICKS_COLUMN_WIDTH) as usize + 4)
        .max(8);

    let header = Row::new(vec![
        Cell::from("Slug"),
        Cell::from(""),
        Cell::from("Destination"),
        Cell::from("Clicks"),
    ])
    .style(styles::header_style());

    let rows: Vec<Row> = app
        .links
        .iter()
        .map(|link| {
            let indicator = if app.copy_feedback_active(&link.slug, now) {
                Span::styled("✓", styles::success_style())
            } else {
                Span::styled("⧉", styles::muted_style())
            };
            Row::new(vec![
                Cell::from(truncate_string(&link.slug, slug_width)),
                Cell::from(indicator),
                Cell::from(truncate_string(&link.url, url_width)),
                Cell::from(format_clicks(link.clicks)),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Length(slug_width as u16),
        Constraint::Length(COPY_COLUMN_WIDTH),
        Constraint::Min(8),
        Constraint::Length(CLICKS_COLUMN_WIDTH),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(if focused {
            styles::selected_style()
        } else {
            Style::default()
        })
        .highlight_symbol("▶ ");

    let mut state = TableState::default().with_selected(Some(app.selection));
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match (app.state, app.focus) {
        (AppState::LoggingIn, _) => "[Enter] login | [Esc] quit",
        (_, Focus::Table) => "[c]opy [o]pen [e]dit [d]elete | [r]eload [L]ogout [q]uit",
        _ => "[Tab] next field | [Enter] create | [Esc] table",
    };

    let left_text = match (&app.status_message, app.loading) {
        (Some(msg), _) => format!(" {} ", msg),
        (None, true) => " Loading... ".to_string(),
        (None, false) => String::new(),
    };
    let right_text = format!(" {} ", shortcuts);

    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let height = if app.login_error.is_some() { 11 } else { 9 };
    let area = centered_rect_fixed(48, height, frame.area());

    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("   Admin login", styles::title_style())),
        Line::from(""),
    ];

    let password_masked = truncate_string(&mask(&app.login_password), 24);
    lines.push(Line::from(vec![
        Span::styled("   Password: [", styles::muted_style()),
        Span::styled(
            format!("{:<24}▌", password_masked),
            styles::selected_style(),
        ),
        Span::styled("]", styles::muted_style()),
    ]));
    lines.push(Line::from(""));

    let button = if app.busy { "  Logging in...  " } else { " ▶ Login ◀ " };
    lines.push(Line::from(vec![
        Span::raw("            ["),
        Span::styled(button, styles::list_item_style()),
        Span::raw("]"),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("   {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_edit_overlay(frame: &mut Frame, app: &App) {
    let Some(edit) = app.edit.as_ref() else {
        return;
    };
    let area = centered_rect_fixed(70, 9, frame.area());
    frame.render_widget(Clear, area);

    let field_width = (area.width as usize).saturating_sub(12);
    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(" Slug: ", styles::muted_style()),
            Span::styled(edit.slug.clone(), styles::highlight_style()),
        ]),
        input_line(" URL:  ", &edit.url_input, true, field_width),
        Line::from(""),
        Line::from(vec![
            Span::styled(" Press ", styles::muted_style()),
            Span::styled("[Enter]", styles::help_key_style()),
            Span::styled(" to save, ", styles::muted_style()),
            Span::styled("[Esc]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let title = if app.busy { " Edit link (saving...) " } else { " Edit link " };
    let block = Block::default()
        .title(Span::styled(title, styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_delete_overlay(frame: &mut Frame, app: &App) {
    let slug = app.pending_delete.as_deref().unwrap_or_default();
    let short_url = app.short_url(slug);

    // The full short URL wraps, so grow the box to fit it
    let text_width = DELETE_OVERLAY_WIDTH.saturating_sub(5) as usize;
    let url_rows = short_url.chars().count().div_ceil(text_width).max(1) as u16;
    let area = centered_rect_fixed(DELETE_OVERLAY_WIDTH, 8 + url_rows, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Delete this link?",
            styles::highlight_style(),
        )),
        Line::from(vec![
            Span::styled("   Slug: ", styles::muted_style()),
            Span::styled(slug.to_string(), styles::highlight_style()),
        ]),
        Line::from(Span::styled(
            format!("   {}", short_url),
            styles::list_item_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to delete, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_notice_overlay(frame: &mut Frame, app: &App) {
    let Some(notice) = app.notice.as_ref() else {
        return;
    };
    let (title, style) = match notice.kind {
        NoticeKind::Info => (" Notice ", styles::highlight_style()),
        NoticeKind::Success => (" Done ", styles::success_style()),
        NoticeKind::Error => (" Error ", styles::error_style()),
    };

    let message_lines = notice.message.lines().count() as u16;
    let area = centered_rect_fixed(56, message_lines + 6, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![Line::from("")];
    lines.extend(
        notice
            .message
            .lines()
            .map(|l| Line::from(Span::styled(format!("  {}", l), style))),
    );
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  Press ", styles::muted_style()),
        Span::styled("[Enter]", styles::help_key_style()),
        Span::styled(" to continue", styles::muted_style()),
    ]));

    let block = Block::default()
        .title(Span::styled(title, style))
        .borders(Borders::ALL)
        .border_style(style);

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 23, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled(
            format!("  linkdash {}", version),
            styles::title_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("Tab", "Next field (slug, URL, table)"),
        help_line("Shift+Tab", "Previous field"),
        help_line("↑/↓ j/k", "Move through links"),
        help_line("PgUp/PgDn", "Jump a page"),
        help_line("Esc", "Back to the table"),
        Line::from(""),
        Line::from(Span::styled(" Links", styles::highlight_style())),
        help_line("Enter", "Create link (in the form)"),
        help_line("c", "Copy short link"),
        help_line("o", "Open short link in browser"),
        help_line("e", "Edit destination"),
        help_line("d", "Delete link"),
        help_line("r", "Reload list"),
        Line::from(""),
        help_line("L", "Log out"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkdash_core::auth::MemoryTokenStore;
    use linkdash_core::Config;
    use linkdash_mock::fixture_links;
    use ratatui::{backend::TestBackend, Terminal};

    fn dashboard(config: Config) -> App {
        let mut app =
            App::new(config, Box::new(MemoryTokenStore::with_token("opaque-token"))).unwrap();
        app.links = fixture_links();
        app
    }

    fn draw(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_dashboard_shows_every_slug() {
        let app = dashboard(Config::default());
        assert!(app.is_authenticated());

        let screen = draw(&app, 80, 24);
        assert!(screen.contains("Links (2)"));
        for link in fixture_links() {
            assert!(screen.contains(&link.slug), "missing slug {}", link.slug);
        }
        assert!(screen.contains("https://example.com/docs"));
    }

    #[test]
    fn test_delete_overlay_names_the_slug() {
        let mut app = dashboard(Config::default());
        app.pending_delete = Some("promo".to_string());
        app.state = AppState::ConfirmingDelete;

        let screen = draw(&app, 120, 30);
        assert!(screen.contains("Delete this link?"));
        assert!(screen.contains("Slug: promo"));
    }

    #[test]
    fn test_delete_overlay_wraps_long_short_url() {
        let config = Config {
            short_domain: format!("https://{}.example", "s".repeat(70)),
            ..Config::default()
        };
        let mut app = dashboard(config);
        app.pending_delete = Some("promo".to_string());
        app.state = AppState::ConfirmingDelete;

        let screen = draw(&app, 120, 30);
        assert!(screen.contains("Slug: promo"));
        assert!(screen.contains("example/promo"));
    }

    #[test]
    fn test_centered_rect_fixed() {
        let outer = Rect::new(0, 0, 100, 40);
        assert_eq!(centered_rect_fixed(40, 10, outer), Rect::new(30, 15, 40, 10));
        // Clamped to the available area
        let small = Rect::new(0, 0, 20, 5);
        assert_eq!(centered_rect_fixed(40, 10, small), Rect::new(0, 0, 20, 5));
    }

    #[test]
    fn test_input_line_keeps_tail_visible() {
        let line = input_line("URL: ", "https://example.com/long", false, 8);
        assert_eq!(line.spans[1].content, "com/long");
        let focused = input_line("URL: ", "abc", true, 8);
        assert_eq!(focused.spans[1].content, "abc▌");
    }
}
