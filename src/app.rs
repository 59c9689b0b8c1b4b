use crate::calendar::{first_of_month, same_month, Calendar, Motion, Status};
use crate::config::ymd;
use crate::coordinator::{Completion, RequestCoordinator};
use crate::help::Help;
use crate::jumpto::{JumpTo, JumpToInput, JumpToOutput, JumpToState};
use crate::theme::BASE_STYLE;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::Rect,
    widgets::{StatefulWidget, Widget},
    Terminal,
};
use std::io::{self, Write};
use time::Date;
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Debug)]
pub(crate) struct App {
    coordinator: RequestCoordinator,
    completions: UnboundedReceiver<Completion>,
    today: Date,
    cursor: Date,
    state: AppState,
}

impl App {
    /// The cursor starts on the coordinator's reference date.
    pub(crate) fn new(
        coordinator: RequestCoordinator,
        completions: UnboundedReceiver<Completion>,
        today: Date,
    ) -> App {
        let cursor = coordinator.reference();
        App {
            coordinator,
            completions,
            today,
            cursor,
            state: AppState::Calendar,
        }
    }

    /// Runs the calendar until the user quits, then returns the last date the
    /// user selected, if any
    pub(crate) async fn run<B: Backend + Send>(
        mut self,
        mut terminal: Terminal<B>,
    ) -> anyhow::Result<Option<Date>> {
        let mut events = EventStream::new();
        self.coordinator.on_mount()?;
        while !self.quitting() {
            self.draw(&mut terminal)?;
            tokio::select! {
                Some(completion) = self.completions.recv() => self.handle_completion(completion)?,
                event = events.next() => match event {
                    Some(event) => self.handle_event(&event?)?,
                    None => break,
                },
            }
        }
        self.coordinator.on_unmount();
        Ok(self.coordinator.selected())
    }

    fn draw<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        terminal.draw(|frame| frame.render_widget(self, frame.area()))?;
        Ok(())
    }

    fn handle_completion(&mut self, completion: Completion) -> io::Result<()> {
        // Failures are kept by the coordinator and shown in the status line
        if self.coordinator.resolve(completion).is_err() {
            self.beep()?;
        }
        Ok(())
    }

    fn handle_event(&mut self, event: &Event) -> io::Result<()> {
        let normal_modifiers = KeyModifiers::NONE | KeyModifiers::SHIFT;
        if let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = *event
        {
            if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
                self.state = AppState::Quitting;
            } else if !normal_modifiers.contains(modifiers) || !self.handle_key(code) {
                self.beep()?;
            }
        }
        // else: Redraw on resize, and we might as well redraw on other stuff
        // too
        Ok(())
    }

    // Returns `false` if the user pressed an invalid key
    fn handle_key(&mut self, key: KeyCode) -> bool {
        match &mut self.state {
            AppState::Calendar => match key {
                KeyCode::Char('h') | KeyCode::Left => self.move_by(Motion::DayBackwards),
                KeyCode::Char('l') | KeyCode::Right => self.move_by(Motion::DayForwards),
                KeyCode::Char('k') | KeyCode::Up => self.move_by(Motion::WeekBackwards),
                KeyCode::Char('j') | KeyCode::Down => self.move_by(Motion::WeekForwards),
                KeyCode::Char('p') | KeyCode::PageUp => self.move_by(Motion::MonthBackwards),
                KeyCode::Char('n') | KeyCode::PageDown => self.move_by(Motion::MonthForwards),
                KeyCode::Char('0') | KeyCode::Home => {
                    self.move_to(self.today);
                    true
                }
                KeyCode::Enter | KeyCode::Char(' ') => {
                    self.coordinator.select_date(self.cursor);
                    true
                }
                KeyCode::Char('g') => {
                    self.state = AppState::Jumping(JumpToState::new());
                    true
                }
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.state = AppState::Quitting;
                    true
                }
                KeyCode::Char('?') => {
                    self.state = AppState::Helping;
                    true
                }
                _ => false,
            },
            AppState::Helping => {
                self.state = AppState::Calendar;
                true
            }
            AppState::Jumping(state) => {
                if matches!(key, KeyCode::Char('q' | 'g') | KeyCode::Esc) {
                    self.state = AppState::Calendar;
                    true
                } else {
                    let output = match key {
                        KeyCode::Char('-') => state.handle_input(JumpToInput::Negative),
                        KeyCode::Char('+') => state.handle_input(JumpToInput::Positive),
                        KeyCode::Char(c @ '0'..='9') => {
                            let d = u8::try_from(c).map_or(0, |b| b - b'0');
                            state.handle_input(JumpToInput::Digit(d))
                        }
                        KeyCode::Backspace | KeyCode::Delete => {
                            state.handle_input(JumpToInput::Backspace)
                        }
                        KeyCode::Enter => state.handle_input(JumpToInput::Enter),
                        _ => JumpToOutput::Invalid,
                    };
                    match output {
                        JumpToOutput::Ok => true,
                        JumpToOutput::Invalid => false,
                        JumpToOutput::Jump(date) => {
                            self.state = AppState::Calendar;
                            self.move_to(date);
                            true
                        }
                    }
                }
            }
            AppState::Quitting => false,
        }
    }

    fn beep(&self) -> io::Result<()> {
        io::stdout().write_all(b"\x07")
    }

    fn quitting(&self) -> bool {
        self.state == AppState::Quitting
    }

    fn move_by(&mut self, motion: Motion) -> bool {
        match motion.apply(self.cursor) {
            Ok(date) => {
                self.move_to(date);
                true
            }
            Err(e) => {
                log::debug!("Cannot move {motion:?} from {}: {e}", ymd(self.cursor));
                false
            }
        }
    }

    // Moving into another month replaces the displayed highlights with those
    // of the new month
    fn move_to(&mut self, date: Date) {
        if !same_month(date, self.cursor) {
            if let Err(e) = self.coordinator.start(first_of_month(date)) {
                log::warn!("Not fetching highlighted days: {e}");
            }
        }
        self.cursor = date;
    }

    fn status(&self) -> Status<'_> {
        if let Some(e) = self.coordinator.failure() {
            Status::Failed(e)
        } else if self.coordinator.is_loading() {
            Status::Loading
        } else {
            Status::Ready
        }
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, BASE_STYLE);
        Calendar::new(self.coordinator.highlights(), self.cursor)
            .selected(self.coordinator.selected())
            .status(self.status())
            .render(area, buf);
        if self.state == AppState::Helping {
            Help(BASE_STYLE).render(area, buf);
        } else if let AppState::Jumping(ref mut state) = self.state {
            JumpTo.render(area, buf, state);
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum AppState {
    Calendar,
    Helping,
    Jumping(JumpToState),
    Quitting,
}
