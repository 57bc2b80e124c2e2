//! カーソル移動とスクロール

use crate::layout::Cell;

use super::HexEdit;

impl HexEdit {
    pub(crate) fn client_height(&self) -> usize {
        (self.area.height as usize).max(1)
    }

    pub(crate) fn client_width(&self) -> usize {
        (self.area.width as usize).max(1)
    }

    /// カーソルのバッファ位置 (文字列側か, オフセット, シフト)
    fn editable_cursor(&self) -> Option<(bool, usize, usize)> {
        match self.current_cell() {
            Cell::Hex { offset, shift, .. } => Some((
                false,
                self.cursor_line * self.geo.bytes_per_line + offset,
                shift,
            )),
            Cell::Char { offset, .. } => Some((
                true,
                self.cursor_line * self.geo.bytes_per_line + offset,
                0,
            )),
            Cell::Offset | Cell::Whitespace => None,
        }
    }

    fn cell_pos(&self, as_char: bool, offset: usize, shift: usize) -> (usize, usize) {
        if as_char {
            self.geo.char_cell(offset)
        } else {
            self.geo.hex_cell(offset, shift)
        }
    }

    /// 左の同種セルへ。先頭で頭打ち。
    pub fn cursor_left(&mut self) {
        self.clear_selection();
        if let Some((as_char, offset, shift)) = self.editable_cursor() {
            let (offset, shift) = self.geo.prev_cell(as_char, offset, shift);
            let (line, col) = self.cell_pos(as_char, offset, shift);
            self.set_cursor_cell(line, col);
        }
        self.ensure_cursor_visible();
    }

    /// 右の同種セルへ。末尾の直後（追記位置）までは進める。
    pub fn cursor_right(&mut self) {
        self.clear_selection();
        if let Some((as_char, offset, shift)) = self.editable_cursor() {
            let (offset, shift) = self.geo.next_cell(as_char, offset, shift);
            if offset <= self.store.len() {
                let (line, col) = self.cell_pos(as_char, offset, shift);
                self.set_cursor_cell(line, col);
            }
        }
        self.ensure_cursor_visible();
    }

    /// 1行上へ。先頭行では動かない。
    pub fn cursor_up(&mut self) {
        self.clear_selection();
        if self.cursor_line > 0 {
            self.set_cursor_cell(self.cursor_line - 1, self.cursor_col);
        }
        self.ensure_cursor_visible();
    }

    /// 1行下へ。移動先が末尾を越える場合は動かない。
    pub fn cursor_down(&mut self) {
        self.clear_selection();
        if let Cell::Hex { offset, .. } | Cell::Char { offset, .. } = self.current_cell() {
            let target = (self.cursor_line + 1) * self.geo.bytes_per_line + offset;
            if target <= self.store.len() {
                self.set_cursor_cell(self.cursor_line + 1, self.cursor_col);
            }
        }
        self.ensure_cursor_visible();
    }

    /// 行頭へ（16進・文字の別は保つ）
    pub fn cursor_home(&mut self) {
        self.clear_selection();
        if let Some((as_char, _, _)) = self.editable_cursor() {
            let offset = self.cursor_line * self.geo.bytes_per_line;
            let (line, col) = self.cell_pos(as_char, offset, self.geo.top_shift());
            self.set_cursor_cell(line, col);
        }
        self.ensure_cursor_visible();
    }

    /// 行末へ。データ末尾を越える場合は末尾へ寄せる。
    pub fn cursor_end(&mut self) {
        self.clear_selection();
        if let Some((as_char, _, _)) = self.editable_cursor() {
            let valid = self.store.len();
            let mut offset = (self.cursor_line + 1) * self.geo.bytes_per_line;
            if as_char {
                offset -= 1;
                if offset > valid {
                    offset = valid;
                }
            } else {
                offset -= self.geo.bytes_per_word;
                if offset > valid {
                    offset = (valid / self.geo.bytes_per_word) * self.geo.bytes_per_word;
                }
            }
            let (line, col) = self.cell_pos(as_char, offset, 0);
            self.set_cursor_cell(line, col);
        }
        self.ensure_cursor_visible();
    }

    /// バッファ先頭へ
    pub fn cursor_ctrl_home(&mut self) {
        self.clear_selection();
        if let Some((as_char, _, _)) = self.editable_cursor() {
            let (line, col) = self.cell_pos(as_char, 0, self.geo.top_shift());
            self.set_cursor_cell(line, col);
        }
        self.ensure_cursor_visible();
    }

    /// バッファ末尾へ
    pub fn cursor_ctrl_end(&mut self) {
        self.clear_selection();
        if let Some((as_char, _, _)) = self.editable_cursor() {
            let valid = self.store.len();
            let offset = if as_char {
                valid
            } else {
                (valid / self.geo.bytes_per_word) * self.geo.bytes_per_word
            };
            let (line, col) = self.cell_pos(as_char, offset, 0);
            self.set_cursor_cell(line, col);
        }
        self.ensure_cursor_visible();
    }

    /// 1画面上へ
    pub fn page_up(&mut self) {
        self.clear_selection();
        if self.cursor_line == 0 {
            return;
        }
        let height = self.client_height();
        let line = self.cursor_line.saturating_sub(height);
        self.set_cursor_cell(line, self.cursor_col);
        let top = self.viewport_top.saturating_sub(height);
        if top != self.viewport_top {
            self.viewport_top = top;
            self.dirty_from(top);
        }
        self.ensure_cursor_visible();
    }

    /// 1画面下へ。最終画面が見えていれば動かない。
    pub fn page_down(&mut self) {
        self.clear_selection();
        let height = self.client_height();
        let lines = self.total_lines();
        if self.viewport_top + height >= lines {
            return;
        }
        self.viewport_top += height;
        self.dirty_from(self.viewport_top);
        if self.cursor_line + height < lines {
            self.set_cursor_cell(self.cursor_line + height, self.cursor_col);
        } else if self.cursor_line + 1 < lines {
            self.set_cursor_cell(lines - 1, self.cursor_col);
        }
        self.ensure_cursor_visible();
    }

    /// カーソルが見えるまで最小限だけスクロールする
    pub fn ensure_cursor_visible(&mut self) {
        let height = self.client_height();
        let width = self.client_width();
        let mut top = self.viewport_top;
        let mut left = self.viewport_left;
        if self.cursor_line < top {
            top = self.cursor_line;
        } else if self.cursor_line >= top + height {
            top = self.cursor_line + 1 - height;
        }
        if self.cursor_col < left {
            left = self.cursor_col;
        } else if self.cursor_col >= left + width {
            left = self.cursor_col + 1 - width;
        }
        if (top, left) != (self.viewport_top, self.viewport_left) {
            self.viewport_top = top;
            self.viewport_left = left;
            self.dirty_from(top);
        }
    }

    /// ビューポート先頭行を設定する。カーソルは追従しない。
    pub fn set_viewport_top(&mut self, line: usize) {
        let top = line.min(self.total_lines().saturating_sub(1));
        if top != self.viewport_top {
            self.viewport_top = top;
            self.dirty_from(top);
        }
    }

    /// ホストのスクロールバー操作に応じる
    ///
    /// 画面がデータで埋まる範囲にクランプし、カーソルを可視範囲へ
    /// 引き込む。
    pub fn scroll_to(&mut self, line: usize) {
        let height = self.client_height();
        let top = line.min(self.total_lines().saturating_sub(height));
        if top != self.viewport_top {
            self.viewport_top = top;
            self.dirty_from(top);
        }
        if self.cursor_line < top {
            self.set_cursor_cell(top, self.cursor_col);
        } else if self.cursor_line >= top + height {
            self.set_cursor_cell(top + height - 1, self.cursor_col);
        }
    }

    /// ホイールスクロール
    pub fn scroll_wheel(&mut self, up: bool) {
        let lines = self.scroll_lines;
        if up {
            self.set_viewport_top(self.viewport_top.saturating_sub(lines));
            return;
        }
        let height = self.client_height();
        let populated = self.total_lines();
        let top = if self.viewport_top + lines + height > populated {
            populated.saturating_sub(height)
        } else {
            self.viewport_top + lines
        };
        self.set_viewport_top(top);
    }
}
