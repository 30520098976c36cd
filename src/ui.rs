use bennections::{
    puzzle::{Group, GROUP_SIZE},
    timer::Clock,
    util::{format_clock, long_date},
};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Widget},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;
const ROW_HEIGHT: u16 = 3;
const MODAL_WIDTH: u16 = 40;
const MODAL_HEIGHT: u16 = 9;

pub fn draw<C: Clock + Clone + 'static>(app: &App<C>, f: &mut Frame) {
    f.render_widget(app, f.area());
}

/// Row color for a solved group, easiest to hardest
fn difficulty_color(difficulty: u8) -> Color {
    match difficulty {
        1 => Color::Yellow,
        2 => Color::Green,
        3 => Color::Blue,
        4 => Color::Magenta,
        _ => Color::Gray,
    }
}

/// Clip `word` to `width` terminal columns, marking the cut with an ellipsis.
fn fit(word: &str, width: usize) -> String {
    if word.width() <= width {
        return word.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in word.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_group_row(group: &Group, revealed: bool, area: Rect, buf: &mut Buffer) {
    let mut style = Style::default()
        .bg(difficulty_color(group.difficulty))
        .fg(Color::Black);
    if revealed {
        style = style.add_modifier(Modifier::DIM);
    }
    let lines = vec![
        Line::from(Span::styled(
            group.category.to_uppercase(),
            style.add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(group.words.join(", "), style)),
    ];
    Paragraph::new(lines)
        .style(style)
        .alignment(Alignment::Center)
        .block(Block::default().style(style))
        .render(area, buf);
}

impl<C: Clock + Clone + 'static> App<C> {
    fn render_start(&self, area: Rect, buf: &mut Buffer) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let dim = Style::default().add_modifier(Modifier::DIM);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // title
                Constraint::Length(1), // date
                Constraint::Length(1),
                Constraint::Length(1), // greeting
                Constraint::Length(1), // medals
                Constraint::Length(1),
                Constraint::Length(1), // legend
                Constraint::Length(1),
                Constraint::Min(3), // leaderboard
            ])
            .split(area);

        Paragraph::new(Span::styled("BENNECTIONS", bold.fg(Color::Magenta)))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);
        Paragraph::new(long_date(self.puzzle.date()))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        let greeting = if self.settings.guest {
            format!("Hi, {}! Playing as a guest, scores are not saved.", self.nickname())
        } else {
            format!("Hi, {}!", self.nickname())
        };
        Paragraph::new(greeting)
            .alignment(Alignment::Center)
            .render(chunks[3], buf);

        if let Some(profile) = &self.profile {
            let m = profile.medals;
            Paragraph::new(format!("🥇 {}   🥈 {}   🥉 {}", m.gold, m.silver, m.bronze))
                .alignment(Alignment::Center)
                .render(chunks[4], buf);
        }

        Paragraph::new(Span::styled("(enter) play / (esc)ape", dim.add_modifier(Modifier::ITALIC)))
            .alignment(Alignment::Center)
            .render(chunks[6], buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Today's leaderboard ");
        match &self.leaderboard {
            None => Paragraph::new(Span::styled("Error loading scores.", Style::default().fg(Color::Red)))
                .alignment(Alignment::Center)
                .block(block)
                .render(chunks[8], buf),
            Some(scores) if scores.is_empty() => {
                Paragraph::new(Span::styled("No scores yet today. Be the first!", dim))
                    .alignment(Alignment::Center)
                    .block(block)
                    .render(chunks[8], buf)
            }
            Some(scores) => {
                let rows = scores.iter().enumerate().map(|(i, s)| {
                    let mine = s.uid == self.identity.uid;
                    let row = Row::new(vec![
                        Cell::from(format!("{}", i + 1)),
                        Cell::from(s.nickname.clone()),
                        Cell::from(s.time_string.clone()),
                        Cell::from(s.mistakes.to_string()),
                        Cell::from(s.medal.icon()),
                    ]);
                    if mine {
                        row.style(bold)
                    } else {
                        row
                    }
                });
                Table::new(
                    rows,
                    [
                        Constraint::Length(4),
                        Constraint::Min(10),
                        Constraint::Length(6),
                        Constraint::Length(9),
                        Constraint::Length(5),
                    ],
                )
                .header(Row::new(vec!["#", "Name", "Time", "Mistakes", "Medal"]).style(bold))
                .block(block)
                .render(chunks[8], buf);
            }
        }
    }

    fn render_round(&self, area: Rect, buf: &mut Buffer) {
        let Some(controller) = self.controller() else {
            return;
        };
        let state = controller.state();
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let dim = Style::default().add_modifier(Modifier::DIM);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // header
                Constraint::Length(1),
                Constraint::Length(ROW_HEIGHT * GROUP_SIZE as u16), // groups + grid
                Constraint::Length(1),
                Constraint::Length(1), // attempts
                Constraint::Length(1), // message
                Constraint::Min(0),
                Constraint::Length(1), // legend
            ])
            .split(area);

        let header = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1), Constraint::Length(8)])
            .split(chunks[0]);
        Paragraph::new(Span::styled(long_date(controller.puzzle().date()), bold))
            .render(header[0], buf);
        let secs = state
            .elapsed_seconds()
            .unwrap_or_else(|| controller.elapsed_seconds());
        Paragraph::new(Span::styled(format_clock(secs), bold))
            .alignment(Alignment::Right)
            .render(header[1], buf);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(ROW_HEIGHT); GROUP_SIZE])
            .split(chunks[2]);

        // solved first, then anything a lost round has uncovered, then tiles
        let revealed: Vec<&Group> = if self.state == AppState::Lost {
            controller
                .remaining_groups()
                .into_iter()
                .take(self.revealed)
                .collect()
        } else {
            Vec::new()
        };
        let mut row_idx = 0;
        for group in state.solved_groups() {
            render_group_row(group, false, rows[row_idx], buf);
            row_idx += 1;
        }
        for group in &revealed {
            render_group_row(group, true, rows[row_idx], buf);
            row_idx += 1;
        }

        let tiles: Vec<(usize, &String)> = state
            .board()
            .iter()
            .enumerate()
            .filter(|(_, w)| !revealed.iter().any(|g| g.contains(w)))
            .collect();
        for (line, chunk) in tiles.chunks(GROUP_SIZE).enumerate() {
            let Some(row_area) = rows.get(row_idx + line) else {
                break;
            };
            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Ratio(1, GROUP_SIZE as u32); GROUP_SIZE])
                .split(*row_area);
            for (col, (idx, word)) in chunk.iter().enumerate() {
                let selected = state.selection().contains(word);
                let under_cursor = self.state == AppState::Playing && *idx == self.cursor();
                let mut style = Style::default();
                if selected {
                    style = style.bg(Color::DarkGray).fg(Color::White).add_modifier(Modifier::BOLD);
                }
                let border = if under_cursor {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else {
                    dim
                };
                let inner = cols[col].width.saturating_sub(2) as usize;
                Paragraph::new(fit(word, inner))
                    .style(style)
                    .alignment(Alignment::Center)
                    .block(Block::default().borders(Borders::ALL).border_style(border))
                    .render(cols[col], buf);
            }
        }

        let remaining = state.remaining_attempts() as usize;
        let used = state.starting_attempts() as usize - remaining;
        Paragraph::new(Line::from(vec![
            Span::raw("Mistakes remaining: "),
            Span::styled("● ".repeat(remaining), bold),
            Span::styled("○ ".repeat(used), dim),
        ]))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);

        if let Some(message) = self.message() {
            Paragraph::new(Span::styled(message, bold.fg(Color::Cyan)))
                .alignment(Alignment::Center)
                .render(chunks[5], buf);
        }

        let legend = match self.state {
            AppState::Playing => "(arrows) move / (space) pick / (enter) submit / (d)eselect / (s)huffle / (esc)ape",
            _ => "(enter) back / (esc)ape",
        };
        Paragraph::new(Span::styled(legend, dim.add_modifier(Modifier::ITALIC)))
            .alignment(Alignment::Center)
            .render(chunks[7], buf);
    }

    fn render_win_modal(&self, area: Rect, buf: &mut Buffer) {
        let Some(controller) = self.controller() else {
            return;
        };
        let (Some(medal), Some(secs)) = (controller.medal(), controller.state().elapsed_seconds())
        else {
            return;
        };
        let bold = Style::default().add_modifier(Modifier::BOLD);

        let modal = centered(area, MODAL_WIDTH, MODAL_HEIGHT);
        Clear.render(modal, buf);
        let lines = vec![
            Line::default(),
            Line::from(Span::styled(
                format!("{} You got the {} Medal!", medal.icon(), medal.label()),
                bold,
            )),
            Line::default(),
            Line::from(format!("Time: {}", format_clock(secs))),
            Line::from(format!("Mistakes: {}", controller.state().mistakes_made())),
            Line::default(),
            Line::from(Span::styled(
                "(enter) back / (esc)ape",
                Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
            )),
        ];
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Solved! ")
                    .border_style(Style::default().fg(Color::Yellow)),
            )
            .render(modal, buf);
    }
}

impl<C: Clock + Clone + 'static> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Start => self.render_start(area, buf),
            AppState::Playing | AppState::Lost => self.render_round(area, buf),
            AppState::Won => {
                self.render_round(area, buf);
                self.render_win_modal(area, buf);
            }
        }
    }
}
