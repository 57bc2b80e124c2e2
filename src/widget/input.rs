//! 端末イベントの処理

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, ModifierKeyCode, MouseButton,
    MouseEvent, MouseEventKind,
};

use crate::layout::Cell;

use super::{HexEdit, NumericEntry, NumericInterp};

/// キーとして受け付けない制御文字
const REJECTED_CHARS: &str = "\0\t\r\n\x08\x1b";

impl HexEdit {
    /// 端末イベントを処理する。処理したら true。
    pub fn handle_event(&mut self, event: &Event) -> bool {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Release => self.handle_key_release(key),
            Event::Key(key) => self.handle_key_press(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::FocusGained => {
                self.has_focus = true;
                true
            }
            Event::FocusLost => {
                self.has_focus = false;
                self.flush_numeric();
                true
            }
            _ => false,
        }
    }

    fn handle_key_press(&mut self, key: &KeyEvent) -> bool {
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        // Alt を押したままの数値入力
        if alt && !ctrl {
            if let KeyCode::Char(ch) = key.code {
                if self.accumulate_numeric(ch) {
                    return true;
                }
            }
            // 数字として解釈できないキーは溜めた値をその場で確定する
            if self.flush_numeric() {
                return true;
            }
        } else if !alt {
            // Alt が離れていれば溜めた値を先に確定する
            self.flush_numeric();
        }
        match key.code {
            KeyCode::Left => {
                self.cursor_left();
                true
            }
            KeyCode::Right => {
                self.cursor_right();
                true
            }
            KeyCode::Up => {
                self.cursor_up();
                true
            }
            KeyCode::Down => {
                self.cursor_down();
                true
            }
            KeyCode::Home if ctrl => {
                self.cursor_ctrl_home();
                true
            }
            KeyCode::Home => {
                self.cursor_home();
                true
            }
            KeyCode::End if ctrl => {
                self.cursor_ctrl_end();
                true
            }
            KeyCode::End => {
                self.cursor_end();
                true
            }
            KeyCode::PageUp => {
                self.page_up();
                true
            }
            KeyCode::PageDown => {
                self.page_down();
                true
            }
            KeyCode::Insert if !self.read_only => {
                self.insert_mode = !self.insert_mode;
                true
            }
            KeyCode::Delete if !self.read_only => {
                self.delete_cell();
                true
            }
            KeyCode::Char(ch) if !ctrl && !alt => {
                if self.read_only || REJECTED_CHARS.contains(ch) {
                    return false;
                }
                self.add_char(ch);
                true
            }
            _ => false,
        }
    }

    fn handle_key_release(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Modifier(ModifierKeyCode::LeftAlt | ModifierKeyCode::RightAlt) => {
                self.flush_numeric()
            }
            _ => false,
        }
    }

    fn handle_mouse(&mut self, mouse: &MouseEvent) -> bool {
        match mouse.kind {
            MouseEventKind::ScrollUp => {
                self.scroll_wheel(true);
                true
            }
            MouseEventKind::ScrollDown => {
                self.scroll_wheel(false);
                true
            }
            MouseEventKind::Down(MouseButton::Left) => self.mouse_down(mouse.column, mouse.row),
            MouseEventKind::Drag(MouseButton::Left) => self.mouse_drag(mouse.column, mouse.row),
            MouseEventKind::Up(MouseButton::Left) => {
                let had_drag = self.drag_anchor.take().is_some();
                self.last_drag = None;
                had_drag
            }
            _ => false,
        }
    }

    /// 画面座標をバッファ全体の (line, col) へ変換する
    fn cell_at(&self, column: u16, row: u16) -> Option<(usize, usize)> {
        let area = self.area;
        if column < area.x
            || column >= area.x + area.width
            || row < area.y
            || row >= area.y + area.height
        {
            return None;
        }
        let line = self.viewport_top + (row - area.y) as usize;
        let col = self.viewport_left + (column - area.x) as usize;
        Some((line, col))
    }

    fn mouse_down(&mut self, column: u16, row: u16) -> bool {
        let Some((line, col)) = self.cell_at(column, row) else {
            return false;
        };
        let offset = match self.geo.classify(line, col, self.store.len()) {
            Cell::Hex { offset, .. } | Cell::Char { offset, .. } => {
                line * self.geo.bytes_per_line + offset
            }
            Cell::Offset | Cell::Whitespace => return false,
        };
        if offset > self.store.len() {
            return false;
        }
        self.clear_selection();
        self.set_cursor_cell(line, col);
        self.ensure_cursor_visible();
        if !self.store.is_empty() {
            self.drag_anchor = Some(offset.min(self.store.len() - 1));
            self.last_drag = Some((column, row));
        }
        true
    }

    fn mouse_drag(&mut self, column: u16, row: u16) -> bool {
        let Some(anchor) = self.drag_anchor else {
            return false;
        };
        self.last_drag = Some((column, row));
        // 領域外へのドラッグは auto_scroll_tick が引き継ぐ
        if let Some((line, col)) = self.cell_at(column, row) {
            self.extend_drag_to(line, col, anchor);
        }
        true
    }

    /// ドラッグ先のセルまで選択を延ばす
    fn extend_drag_to(&mut self, line: usize, col: usize, anchor: usize) {
        let offset = match self.geo.classify(line, col, self.store.len()) {
            Cell::Hex { offset, .. } | Cell::Char { offset, .. } => {
                line * self.geo.bytes_per_line + offset
            }
            Cell::Offset | Cell::Whitespace => return,
        };
        if self.store.is_empty() {
            return;
        }
        let offset = offset.min(self.store.len() - 1);
        self.set_cursor_cell(line, col);
        let range = (anchor.min(offset), anchor.max(offset));
        if self.selection != Some(range) {
            self.clear_selection();
            self.selection = Some(range);
            self.dirty_offsets(range.0, range.1);
        }
    }

    /// ドラッグ中の定期呼び出し
    ///
    /// ポインタが領域の外にあれば1行スクロールして選択を延ばす。
    pub fn auto_scroll_tick(&mut self) {
        let Some(anchor) = self.drag_anchor else {
            return;
        };
        let Some((column, row)) = self.last_drag else {
            return;
        };
        let area = self.area;
        let col = self.viewport_left
            + column.clamp(area.x, area.x + area.width.max(1) - 1).saturating_sub(area.x) as usize;
        if row < area.y {
            self.set_viewport_top(self.viewport_top.saturating_sub(1));
            self.extend_drag_to(self.viewport_top, col, anchor);
        } else if row >= area.y + area.height {
            self.set_viewport_top(self.viewport_top + 1);
            let line = self.viewport_top + self.client_height() - 1;
            self.extend_drag_to(line, col, anchor);
        }
    }

    // --- Alt+テンキーの数値入力 ---

    fn accumulate_numeric(&mut self, ch: char) -> bool {
        match &mut self.numeric {
            None => {
                let interp = match ch {
                    '+' => NumericInterp::Unicode,
                    '0' => NumericInterp::Oem,
                    '1'..='9' => NumericInterp::Ansi,
                    _ => return false,
                };
                let value = ch.to_digit(10).unwrap_or(0);
                self.numeric = Some(NumericEntry { value, interp });
                true
            }
            Some(entry) => {
                let digit = match entry.interp {
                    NumericInterp::Unicode => ch.to_digit(16),
                    NumericInterp::Ansi | NumericInterp::Oem => ch.to_digit(10),
                };
                match digit {
                    Some(d) => {
                        let base = if entry.interp == NumericInterp::Unicode { 16 } else { 10 };
                        entry.value = entry.value.wrapping_mul(base).wrapping_add(d);
                        true
                    }
                    None => false,
                }
            }
        }
    }

    /// 溜めた数値入力を1文字として確定する
    pub(crate) fn flush_numeric(&mut self) -> bool {
        let Some(entry) = self.numeric.take() else {
            return false;
        };
        match entry.interp {
            NumericInterp::Ansi => {
                let byte = [(entry.value & 0xFF) as u8];
                let (text, _, _) = encoding_rs::WINDOWS_1252.decode(&byte);
                match text.chars().next() {
                    Some(ch) => self.add_char(ch),
                    None => false,
                }
            }
            NumericInterp::Oem => self.add_byte((entry.value & 0xFF) as u8),
            NumericInterp::Unicode => match char::from_u32(entry.value) {
                Some(ch) => self.add_char(ch),
                None => false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::Options;
    use ratatui::layout::Rect;

    fn widget(data: Vec<u8>) -> HexEdit {
        let mut w = HexEdit::new(Options::default()).unwrap();
        w.set_data(data);
        w.area = Rect::new(0, 0, 80, 4);
        w
    }

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn typed_digit_edits_buffer() {
        let mut w = widget(vec![0x00]);
        assert!(w.handle_event(&press(KeyCode::Char('f'), KeyModifiers::NONE)));
        assert_eq!(w.data(), &[0xF0]);
    }

    #[test]
    fn arrows_and_paging_are_handled() {
        let mut w = widget(vec![0u8; 64]);
        assert!(w.handle_event(&press(KeyCode::Right, KeyModifiers::NONE)));
        assert_eq!(w.cursor_location(), (false, 0, 0));
        assert!(w.handle_event(&press(KeyCode::Down, KeyModifiers::NONE)));
        assert_eq!(w.cursor_location(), (false, 16, 0));
        assert!(w.handle_event(&press(KeyCode::End, KeyModifiers::CONTROL)));
        assert_eq!(w.cursor_location(), (false, 64, 0));
    }

    #[test]
    fn insert_key_toggles_mode_unless_read_only() {
        let mut w = widget(vec![0]);
        assert!(w.handle_event(&press(KeyCode::Insert, KeyModifiers::NONE)));
        assert!(w.insert_mode());
        w.set_read_only(true);
        assert!(!w.handle_event(&press(KeyCode::Insert, KeyModifiers::NONE)));
        assert!(w.insert_mode());
    }

    #[test]
    fn delete_key_is_ignored_when_read_only() {
        let mut w = widget(vec![1, 2]);
        w.set_read_only(true);
        assert!(!w.handle_event(&press(KeyCode::Delete, KeyModifiers::NONE)));
        assert_eq!(w.data(), &[1, 2]);
    }

    #[test]
    fn alt_numeric_decimal_enters_code_page_char() {
        let mut w = widget(vec![0]);
        w.set_cursor_location(true, 0, 0);
        assert!(w.handle_event(&press(KeyCode::Char('6'), KeyModifiers::ALT)));
        assert!(w.handle_event(&press(KeyCode::Char('5'), KeyModifiers::ALT)));
        assert_eq!(w.data(), &[0]);
        // Alt のない次のキーで確定する
        assert!(w.handle_event(&press(KeyCode::Left, KeyModifiers::NONE)));
        assert_eq!(w.data(), &[b'A']);
    }

    #[test]
    fn alt_non_digit_flushes_pending_numeric() {
        let mut w = widget(vec![0]);
        w.set_cursor_location(true, 0, 0);
        assert!(w.handle_event(&press(KeyCode::Char('6'), KeyModifiers::ALT)));
        assert!(w.handle_event(&press(KeyCode::Char('5'), KeyModifiers::ALT)));
        assert!(w.handle_event(&press(KeyCode::Char('x'), KeyModifiers::ALT)));
        assert_eq!(w.data(), &[b'A']);
    }

    #[test]
    fn alt_numeric_decimal_maps_high_bytes_through_code_page() {
        let mut w = widget(vec![0]);
        w.set_cursor_location(true, 0, 0);
        for ch in ['2', '3', '3'] {
            assert!(w.handle_event(&press(KeyCode::Char(ch), KeyModifiers::ALT)));
        }
        w.flush_numeric();
        // windows-1252 の 233 は 'é'
        assert_eq!(w.data(), &[0xE9]);
    }

    #[test]
    fn alt_numeric_leading_zero_writes_raw_byte() {
        let mut w = widget(vec![0]);
        w.set_cursor_location(true, 0, 0);
        for ch in ['0', '2', '0', '0'] {
            assert!(w.handle_event(&press(KeyCode::Char(ch), KeyModifiers::ALT)));
        }
        w.flush_numeric();
        assert_eq!(w.data(), &[200]);
    }

    #[test]
    fn alt_numeric_plus_prefix_takes_unicode_hex() {
        let mut w = widget(vec![0]);
        w.set_cursor_location(true, 0, 0);
        for ch in ['+', 'e', '9'] {
            assert!(w.handle_event(&press(KeyCode::Char(ch), KeyModifiers::ALT)));
        }
        w.flush_numeric();
        assert_eq!(w.data(), &[0xE9]);
    }

    #[test]
    fn alt_numeric_in_hex_region_needs_hex_digit() {
        // Alt+65 は 'A' になり、16進側ではニブル 0xA として書かれる
        let mut w = widget(vec![0x00]);
        for ch in ['6', '5'] {
            assert!(w.handle_event(&press(KeyCode::Char(ch), KeyModifiers::ALT)));
        }
        w.flush_numeric();
        assert_eq!(w.data(), &[0xA0]);
    }

    #[test]
    fn focus_loss_flushes_pending_numeric() {
        let mut w = widget(vec![0]);
        w.set_cursor_location(true, 0, 0);
        assert!(w.handle_event(&press(KeyCode::Char('6'), KeyModifiers::ALT)));
        assert!(w.handle_event(&press(KeyCode::Char('5'), KeyModifiers::ALT)));
        assert!(w.handle_event(&Event::FocusLost));
        assert_eq!(w.data(), &[b'A']);
    }

    #[test]
    fn mouse_click_moves_cursor_to_cell() {
        let mut w = widget(vec![0u8; 16]);
        let click = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 3,
            row: 0,
            modifiers: KeyModifiers::NONE,
        });
        assert!(w.handle_event(&click));
        assert_eq!(w.cursor_location(), (false, 1, 4));
    }

    #[test]
    fn mouse_click_on_separator_is_ignored() {
        let mut w = widget(vec![0u8; 16]);
        let click = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 2,
            row: 0,
            modifiers: KeyModifiers::NONE,
        });
        assert!(!w.handle_event(&click));
        assert_eq!(w.cursor_location(), (false, 0, 4));
    }

    #[test]
    fn mouse_drag_selects_range() {
        let mut w = widget(vec![0u8; 32]);
        let down = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        });
        let drag = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Drag(MouseButton::Left),
            column: 6,
            row: 1,
            modifiers: KeyModifiers::NONE,
        });
        assert!(w.handle_event(&down));
        assert!(w.handle_event(&drag));
        assert_eq!(w.selection(), Some((0, 18)));
        let up = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Up(MouseButton::Left),
            column: 6,
            row: 1,
            modifiers: KeyModifiers::NONE,
        });
        assert!(w.handle_event(&up));
        assert_eq!(w.selection(), Some((0, 18)));
    }

    #[test]
    fn wheel_scrolls_viewport() {
        let mut w = widget(vec![0u8; 16 * 12]);
        let wheel = Event::Mouse(MouseEvent {
            kind: MouseEventKind::ScrollDown,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        });
        assert!(w.handle_event(&wheel));
        assert_eq!(w.viewport_top(), 3);
    }

    #[test]
    fn drag_below_area_auto_scrolls() {
        let mut w = widget(vec![0u8; 16 * 12]);
        let down = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        });
        let drag = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Drag(MouseButton::Left),
            column: 0,
            row: 6,
            modifiers: KeyModifiers::NONE,
        });
        assert!(w.handle_event(&down));
        assert!(w.handle_event(&drag));
        w.auto_scroll_tick();
        assert_eq!(w.viewport_top(), 1);
        assert!(w.selection().is_some());
    }
}
