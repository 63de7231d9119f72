//! Rendering of the TUI panes.

use std::sync::Arc;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, List, Paragraph, Sparkline};

use crate::config::QueryMode;
use crate::tree::CiteNode;
use crate::utils::safe_truncate_chars;

use super::app::{App, Focus};

pub(super) fn draw(frame: &mut Frame, app: &App) {
    let [form_area, middle, bottom] = Layout::vertical([
        Constraint::Length(8),
        Constraint::Percentage(45),
        Constraint::Min(6),
    ])
    .areas(frame.area());

    draw_form(frame, app, form_area);

    let [logs_area, net_area] =
        Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(middle);
    draw_lines(frame, logs_area, "Logs", &app.logs);
    draw_network(frame, app, net_area);

    let [pdf_area, tree_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(bottom);
    draw_lines(frame, pdf_area, "PDFs", &app.pdfs);
    draw_tree(frame, app, tree_area);
}

fn draw_form(frame: &mut Frame, app: &App, area: Rect) {
    let focused = |focus: Focus| {
        if app.form.focus == focus {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        }
    };
    let mode = match app.form.mode {
        QueryMode::Id => "ID",
        QueryMode::Author => "Author",
        QueryMode::Title => "Title",
    };
    let safe = if app.form.safe { "[x]" } else { "[ ]" };
    let status = if app.running.load(std::sync::atomic::Ordering::SeqCst) {
        "crawling..."
    } else {
        "idle"
    };

    let lines = vec![
        Line::styled(
            format!("Search by: < {mode} >  (left/right to change)"),
            focused(Focus::Mode),
        ),
        Line::styled(format!("Query:     {}", app.form.query), focused(Focus::Query)),
        Line::styled(format!("Depth:     {}", app.form.depth), focused(Focus::Depth)),
        Line::styled(format!("PDF dir:   {}", app.form.dir), focused(Focus::Dir)),
        Line::styled(format!("Safe mode: {safe}  (space to toggle)"), focused(Focus::Safe)),
        Line::raw(format!("[{status}]  enter: start   tab: next field   esc: quit")),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(Block::bordered().title("arxiv citation tree")),
        area,
    );
}

fn draw_lines(frame: &mut Frame, area: Rect, title: &str, lines: &[String]) {
    // Keep the latest lines in view.
    let visible = (area.height.saturating_sub(2) as usize).max(1);
    let start = lines.len().saturating_sub(visible);
    let items: Vec<String> = lines[start..].to_vec();
    frame.render_widget(List::new(items).block(Block::bordered().title(title.to_string())), area);
}

fn draw_network(frame: &mut Frame, app: &App, area: Rect) {
    let [spark_area, last_area] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(4)]).areas(area);
    frame.render_widget(
        Sparkline::default()
            .block(Block::bordered().title("Network IO"))
            .data(&app.net_points)
            .style(Style::default().fg(Color::Cyan)),
        spark_area,
    );
    let last = app
        .net_last
        .as_ref()
        .map(|event| format!("{} B  {}", event.size, safe_truncate_chars(&event.message, 256)))
        .unwrap_or_else(|| "no traffic yet".to_string());
    frame.render_widget(
        Paragraph::new(last).block(Block::bordered().title("Last transfer")),
        last_area,
    );
}

fn draw_tree(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();
    if let Some(root) = &app.root {
        tree_lines(root, 0, &mut lines);
    } else {
        lines.push("no tree yet".to_string());
    }
    let visible = (area.height.saturating_sub(2) as usize).max(1);
    lines.truncate(visible);
    frame.render_widget(List::new(lines).block(Block::bordered().title("Tree")), area);
}

fn tree_lines(node: &Arc<CiteNode>, indent: usize, out: &mut Vec<String>) {
    let info = node.info();
    let label = if info.title.is_empty() { "<unresolved>" } else { info.title.as_str() };
    out.push(format!("{}{}", "  ".repeat(indent), safe_truncate_chars(label, 70)));
    for child in node.children() {
        tree_lines(child, indent + 1, out);
    }
}
