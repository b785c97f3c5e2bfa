//! Event handling and drawing for the demo table.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::{cursor, queue};
use log::{debug, info};
use tablestate::interaction::HeaderElement;
use tablestate::{MIN_COLUMN_WIDTH, Record, SortDirection, TableState};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::header::{TermHeader, TerminalCapture, cells, units};
use crate::terminal::Terminal;

const TITLE_ROW: u16 = 0;
const HEADER_ROW: u16 = 1;
const FILTER_ROW: u16 = 2;
const FIRST_BODY_ROW: u16 = 3;

const IDLE_TICK: Duration = Duration::from_millis(250);
const FRAME_TICK: Duration = Duration::from_millis(16);

const HELP: &str =
    "drag header: move | drag edge: resize | click: sort | 1-9: columns | /: filter | x c r m | q: quit";

/// Resting place of a header on the header row, in cells.
#[derive(Debug, Clone, PartialEq)]
struct HeaderCell {
    key: String,
    x: u16,
    width: u16,
}

impl HeaderCell {
    fn contains(&self, x: u16) -> bool {
        x >= self.x && x < self.x + self.width
    }

    fn is_edge(&self, x: u16) -> bool {
        x + 1 == self.x + self.width
    }
}

pub struct App {
    table: TableState<Record>,
    capture: TerminalCapture,
    headers: HashMap<String, Arc<TermHeader>>,
    cells: Vec<HeaderCell>,
    focus: usize,
    scroll: usize,
    /// Filter text being typed for the focused column.
    editing: Option<String>,
    /// Header under a button press that has not moved yet.
    pressed: Option<String>,
    pending_flush: bool,
    reduced_motion: bool,
    status: Option<String>,
    quit: bool,
}

impl App {
    pub fn new(table: TableState<Record>, capture: TerminalCapture) -> Self {
        Self {
            table,
            capture,
            headers: HashMap::new(),
            cells: Vec::new(),
            focus: 0,
            scroll: 0,
            editing: None,
            pressed: None,
            pending_flush: false,
            reduced_motion: false,
            status: None,
            quit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut Terminal) -> io::Result<()> {
        self.table.mount();
        info!("Table mounted under '{}'", self.namespace());

        let mut redraw = true;
        while !self.quit {
            if redraw || self.table.is_dirty() || self.is_animating() {
                self.table.clear_dirty();
                self.draw(terminal)?;
                if std::mem::take(&mut self.pending_flush) {
                    let slides = self.table.flush_reorder_animation();
                    debug!("Started {} header slides", slides.len());
                }
            }

            let tick = if self.is_animating() { FRAME_TICK } else { IDLE_TICK };
            let events = terminal.poll(tick)?;
            redraw = !events.is_empty();
            for event in events {
                self.handle(event);
            }
        }

        self.table.teardown();
        Ok(())
    }

    fn namespace(&self) -> String {
        self.table.storage_namespace().unwrap_or_default()
    }

    fn is_animating(&self) -> bool {
        self.headers.values().any(|h| h.is_animating())
    }

    fn focused_key(&self) -> Option<String> {
        self.table
            .visible_columns()
            .get(self.focus)
            .map(|c| c.key.clone())
    }

    fn header_at(&self, x: u16) -> Option<&HeaderCell> {
        self.cells.iter().find(|cell| cell.contains(x))
    }

    // -------------------------------------------------------------------------
    // Input
    // -------------------------------------------------------------------------

    fn handle(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if let Some(mut buffer) = self.editing.take() {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => return,
                KeyCode::Backspace => {
                    buffer.pop();
                }
                KeyCode::Char(c) => buffer.push(c),
                _ => {}
            }
            if let Some(column) = self.focused_key() {
                self.table.set_filter(&column, buffer.as_str());
            }
            self.editing = Some(buffer);
            return;
        }

        let visible = self.table.visible_columns().len();
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => self.quit = true,
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            KeyCode::Left => self.focus = self.focus.saturating_sub(1),
            KeyCode::Right => self.focus = (self.focus + 1).min(visible.saturating_sub(1)),
            KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down => self.scroll += 1,
            KeyCode::Char('s') | KeyCode::Enter => {
                if let Some(column) = self.focused_key() {
                    self.sort(&column);
                }
            }
            KeyCode::Char('/') => self.start_filter(),
            KeyCode::Char('x') => self.table.clear_sort(),
            KeyCode::Char('c') => self.table.clear_filters(),
            KeyCode::Char('r') => {
                self.table.reset_layout();
                self.status = Some("Layout reset".into());
            }
            KeyCode::Char('m') => {
                self.reduced_motion = !self.reduced_motion;
                self.table.set_reduced_motion(self.reduced_motion);
                self.status = Some(format!("Reduced motion {}", on_off(self.reduced_motion)));
            }
            KeyCode::Char(c @ '1'..='9') => self.toggle_column(c as usize - '1' as usize),
            _ => {}
        }
    }

    fn start_filter(&mut self) {
        let Some(key) = self.focused_key() else { return };
        let filterable = self
            .table
            .visible_columns()
            .get(self.focus)
            .is_some_and(|c| c.filterable);
        if !filterable {
            self.status = Some(format!("'{}' is not filterable", key));
            return;
        }
        self.editing = Some(self.table.filter(&key).to_text());
    }

    fn sort(&mut self, key: &str) {
        let direction = self.table.toggle_sort(key);
        self.status = Some(match direction {
            Some(SortDirection::Asc) => format!("Sorted by {} ascending", key),
            Some(SortDirection::Desc) => format!("Sorted by {} descending", key),
            None => "Unsorted".to_string(),
        });
    }

    fn toggle_column(&mut self, index: usize) {
        let ordered = self.table.ordered_columns();
        let Some(column) = ordered.get(index) else { return };
        if !self.table.toggle_column(&column.key) {
            self.status = Some("The last visible column stays".into());
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let x = mouse.column;
        let on_header_row = mouse.row == HEADER_ROW;

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if !on_header_row {
                    return;
                }
                let Some(cell) = self.header_at(x).cloned() else { return };
                if cell.is_edge(x) {
                    self.table.resize_start(units(x), &cell.key);
                    return;
                }
                if let Some(index) = self.cells.iter().position(|c| c.key == cell.key) {
                    self.focus = index;
                }
                self.pressed = Some(cell.key.clone());
                self.table.drag_start(&cell.key);
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if self.capture.is_captured() || self.table.is_resizing() {
                    self.table.resize_move(units(x));
                    return;
                }
                let Some(source) = self.table.drag_source() else { return };
                let target = on_header_row
                    .then(|| self.header_at(x).map(|c| c.key.clone()))
                    .flatten();
                match target {
                    Some(key) if key != source => {
                        self.pressed = None;
                        self.table.drag_over(&key);
                    }
                    Some(_) => {}
                    None => {
                        self.pressed = None;
                        if let Some(over) = self.table.drag_over_key() {
                            self.table.drag_leave(&over);
                        }
                    }
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if self.table.is_resizing() {
                    self.table.resize_end();
                    return;
                }
                let pressed = self.pressed.take();
                let Some(source) = self.table.drag_source() else { return };
                let target = on_header_row
                    .then(|| self.header_at(x).map(|c| c.key.clone()))
                    .flatten();
                match target {
                    Some(key) if key != source => {
                        if let Some(change) = self.table.drop(&key) {
                            self.pending_flush = true;
                            self.status = Some(format!(
                                "Moved {} from {} to {}",
                                change.moved_key, change.from_index, change.to_index
                            ));
                        }
                    }
                    Some(key) => {
                        self.table.drag_end();
                        if pressed.as_deref() == Some(key.as_str()) {
                            self.sort(&key);
                        }
                    }
                    None => self.table.drag_end(),
                }
            }
            MouseEventKind::ScrollDown => self.scroll += 1,
            MouseEventKind::ScrollUp => self.scroll = self.scroll.saturating_sub(1),
            _ => {}
        }
    }

    // -------------------------------------------------------------------------
    // Drawing
    // -------------------------------------------------------------------------

    /// Lay the visible headers out left to right and keep the table's header
    /// registry in step.
    fn layout_headers(&mut self) {
        let visible = self.table.visible_columns();
        let mut cells_out = Vec::with_capacity(visible.len());
        let mut x: u16 = 0;
        for column in visible.iter() {
            let width = cells(self.table.column_width(&column.key).unwrap_or(MIN_COLUMN_WIDTH));
            let header = match self.headers.get(&column.key) {
                Some(header) => Arc::clone(header),
                None => {
                    let header = Arc::new(TermHeader::default());
                    self.headers.insert(column.key.clone(), Arc::clone(&header));
                    self.table
                        .register_header(&column.key, Some(Arc::clone(&header) as Arc<dyn HeaderElement>));
                    header
                }
            };
            header.place(x, width);
            cells_out.push(HeaderCell {
                key: column.key.clone(),
                x,
                width,
            });
            x = x.saturating_add(width);
        }

        let gone: Vec<String> = self
            .headers
            .keys()
            .filter(|key| !visible.iter().any(|c| &c.key == *key))
            .cloned()
            .collect();
        for key in gone {
            if let Some(header) = self.headers.remove(&key) {
                header.hide();
            }
            self.table.register_header(&key, None);
        }

        self.cells = cells_out;
        self.focus = self.focus.min(self.cells.len().saturating_sub(1));
    }

    fn draw(&mut self, terminal: &mut Terminal) -> io::Result<()> {
        let (width, height) = terminal.size()?;
        self.layout_headers();

        let visible = self.table.visible_columns();
        let rows = self.table.sorted_rows();
        let total = self.table.rows().with(Vec::len);
        let body_height = height.saturating_sub(FIRST_BODY_ROW + 1) as usize;
        self.scroll = self.scroll.min(rows.len().saturating_sub(body_height));
        let drag = self.table.drag_state();
        let resizing = self.table.active_resize().map(|r| r.column_key);
        let namespace = self.namespace();
        let sort = self.table.sort();
        let out = terminal.out();

        // Title
        let sort_text = match &sort {
            Some(sort) => format!("{} {:?}", sort.key, sort.direction).to_lowercase(),
            None => "none".into(),
        };
        let title = format!(
            " tablestate | {} | {}/{} rows | sort: {}",
            namespace,
            rows.len(),
            total,
            sort_text
        );
        line(out, TITLE_ROW)?;
        queue!(
            out,
            SetAttribute(Attribute::Bold),
            Print(fit(&title, width as usize)),
            SetAttribute(Attribute::Reset)
        )?;

        // Headers
        line(out, HEADER_ROW)?;
        for (index, (cell, column)) in self.cells.iter().zip(visible.iter()).enumerate() {
            let offset = self.headers.get(&cell.key).map(|h| h.offset()).unwrap_or(0);
            let left = cell.x as i32 + offset;
            if left < 0 || left >= width as i32 {
                continue;
            }
            let indicator = match self.table.sort_direction(&cell.key) {
                Some(SortDirection::Asc) => " ▲",
                Some(SortDirection::Desc) => " ▼",
                None => "",
            };
            let label = format!("{}{}", column.label, indicator);
            let text = format!("{}│", fit(&label, cell.width.saturating_sub(1) as usize));

            queue!(out, cursor::MoveTo(left as u16, HEADER_ROW))?;
            if index == self.focus {
                queue!(out, SetAttribute(Attribute::Bold))?;
            }
            if drag.source.as_deref() == Some(cell.key.as_str()) {
                queue!(out, SetAttribute(Attribute::Reverse))?;
            }
            if drag.over.as_deref() == Some(cell.key.as_str()) {
                queue!(out, SetAttribute(Attribute::Underlined))?;
            }
            if resizing.as_deref() == Some(cell.key.as_str()) {
                queue!(out, SetForegroundColor(Color::Yellow))?;
            }
            queue!(
                out,
                Print(clip(&text, left as u16, width)),
                SetAttribute(Attribute::Reset),
                ResetColor
            )?;
        }

        // Filters
        line(out, FILTER_ROW)?;
        queue!(out, SetForegroundColor(Color::DarkGrey))?;
        for (index, (cell, column)) in self.cells.iter().zip(visible.iter()).enumerate() {
            let text = match &self.editing {
                Some(buffer) if index == self.focus => format!("/{}_", buffer),
                _ if column.filterable => self.table.filter(&column.key).to_text(),
                _ => String::new(),
            };
            let text = format!("{} ", fit(&text, cell.width.saturating_sub(1) as usize));
            queue!(out, cursor::MoveTo(cell.x, FILTER_ROW), Print(clip(&text, cell.x, width)))?;
        }
        queue!(out, ResetColor)?;

        // Body
        for offset in 0..body_height {
            let y = FIRST_BODY_ROW + offset as u16;
            line(out, y)?;
            let Some(row) = rows.get(self.scroll + offset) else { continue };
            for (cell, column) in self.cells.iter().zip(visible.iter()) {
                let value = self.table.display_value(row, column).to_text();
                let text = format!("{} ", fit(&value, cell.width.saturating_sub(1) as usize));
                queue!(out, cursor::MoveTo(cell.x, y), Print(clip(&text, cell.x, width)))?;
            }
        }

        // Status
        let status_row = height.saturating_sub(1);
        line(out, status_row)?;
        let status = self.status.as_deref().unwrap_or(HELP);
        queue!(
            out,
            SetAttribute(Attribute::Dim),
            Print(fit(status, width as usize)),
            SetAttribute(Attribute::Reset)
        )?;

        out.flush()
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

fn line(out: &mut impl Write, y: u16) -> io::Result<()> {
    queue!(out, cursor::MoveTo(0, y), Clear(ClearType::CurrentLine))
}

/// Truncate or pad `text` to exactly `width` display cells.
fn fit(text: &str, width: usize) -> String {
    let mut fitted = String::with_capacity(width);
    let mut used = 0;
    if text.width() <= width {
        fitted.push_str(text);
        used = text.width();
    } else {
        for ch in text.chars() {
            let w = ch.width().unwrap_or(0);
            if used + w > width {
                break;
            }
            fitted.push(ch);
            used += w;
        }
    }
    fitted.extend(std::iter::repeat_n(' ', width - used));
    fitted
}

/// Cut `text` drawn at column `x` so it ends at the screen edge.
fn clip(text: &str, x: u16, screen: u16) -> String {
    let room = screen.saturating_sub(x) as usize;
    if text.width() <= room {
        text.to_string()
    } else {
        fit(text, room)
    }
}
