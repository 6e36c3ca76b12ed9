use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{self, Modifier, Style};
use ratatui::text::Span;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Stylize,
    symbols::border,
    text::{Line, Text},
    widgets::{Block, Paragraph, Widget},
};

use crate::games::connect4::{new_game, Board, Cell, GameState, Outcome, Phase, COLS, ROWS};

#[derive(Clone)]
pub struct InteractiveApp {
    pub state: GameState,
    pub last_outcome: Option<Outcome>,
    pub input: String,
    pub turns: usize,
}

impl InteractiveApp {
    pub fn new() -> Self {
        Self {
            state: new_game(),
            last_outcome: None,
            input: String::new(),
            turns: 0,
        }
    }
}

fn cell_style(cell: Cell) -> Style {
    match cell {
        Cell::Empty => Style::default().fg(style::Color::Gray),
        Cell::Player => Style::default().fg(style::Color::Red).add_modifier(Modifier::BOLD),
        Cell::Opponent => Style::default().fg(style::Color::Yellow).add_modifier(Modifier::BOLD),
    }
}

fn board_lines(board: &Board) -> Vec<Line<'static>> {
    let mut lines = Vec::with_capacity(ROWS + 2);
    lines.push(Line::from(""));

    for row in 0..ROWS {
        let mut spans = vec![Span::raw("   ")];
        for col in 0..COLS {
            let cell = board.get(row, col);
            spans.push(Span::styled(format!(" {}", cell.glyph()), cell_style(cell)));
        }
        lines.push(Line::from(spans));
    }

    let mut legend = vec![Span::raw("   ")];
    for col in 1..=COLS {
        legend.push(Span::styled(format!(" {}", col), Style::default().add_modifier(Modifier::DIM)));
    }
    lines.push(Line::from(legend));

    lines
}

impl Widget for InteractiveApp {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length((ROWS + 4) as u16),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(area);

        let status = match self.state.phase() {
            Phase::Won(_) | Phase::Drawn => {
                Span::styled(" GAME OVER ", Style::default().fg(style::Color::Red)).bold().add_modifier(Modifier::REVERSED)
            },
            Phase::AwaitingFirstMove | Phase::AwaitingMove => {
                Span::styled(" GAME RUNNING ", Style::default().fg(style::Color::Blue)).bold().add_modifier(Modifier::REVERSED)
            },
        };

        let header_text = Text::from(vec![Line::from(vec![
            " ".into(),
            status,
            " Connect 4, ".into(),
            format!("Turns: {}", self.turns).into(),
        ])]);

        Paragraph::new(header_text)
            .block(Block::bordered().border_set(border::THICK))
            .render(layout[0], buf);

        Paragraph::new(board_lines(&self.state.board))
            .block(Block::bordered().title(Line::from(" Board ".bold()).centered()))
            .render(layout[1], buf);

        let message = match self.last_outcome {
            Some(outcome) => outcome.message(),
            None => "Enter column number (1-7) to place your chip!",
        };

        let message_style = match self.last_outcome {
            Some(Outcome::InvalidInput | Outcome::ColumnFull | Outcome::GameAlreadyOver) => Style::default().fg(style::Color::Red),
            _ => Style::default(),
        };

        Paragraph::new(Line::from(vec![" ".into(), Span::styled(message, message_style)]))
            .block(Block::bordered())
            .render(layout[2], buf);

        let prompt = if self.state.is_terminal() {
            Line::from(" Press <RET> for a new game".italic())
        } else {
            Line::from(vec![" Column: ".into(), Span::raw(self.input.clone()).bold(), "_".into()])
        };

        let block = Block::bordered().title_bottom(
            Line::from(vec![
                " Submit ".into(),
                "<RET> ".blue().bold(),
                " New Game ".into(),
                "<C-n> ".blue().bold(),
                " Quit ".into(),
                "<ESC> ".blue().bold(),
            ])
            .right_aligned(),
        );

        Paragraph::new(prompt).block(block).render(layout[3], buf);
    }
}
