//! バッファ編集操作

use crate::layout::Cell;

use super::HexEdit;

/// 1文字を Windows-1252 の1バイトへ符号化する
fn encode_byte(ch: char) -> Option<u8> {
    let mut buf = [0u8; 4];
    let s: &str = ch.encode_utf8(&mut buf);
    let (out, _, had_errors) = encoding_rs::WINDOWS_1252.encode(s);
    if had_errors || out.len() != 1 {
        return None;
    }
    Some(out[0])
}

/// 入力1回分。通常の文字か、コードページを介さない生バイト。
#[derive(Debug, Clone, Copy)]
pub(crate) enum Keystroke {
    Char(char),
    Byte(u8),
}

impl Keystroke {
    fn hex_digit(self) -> Option<u8> {
        match self {
            Keystroke::Char(ch) => ch.to_digit(16).map(|d| d as u8),
            Keystroke::Byte(b) => (b as char).to_digit(16).map(|d| d as u8),
        }
    }

    fn char_byte(self) -> Option<u8> {
        match self {
            Keystroke::Char(ch) => encode_byte(ch),
            Keystroke::Byte(b) => Some(b),
        }
    }
}

impl HexEdit {
    /// 1文字をカーソル位置へ入力する
    ///
    /// 16進側では16進の桁のみ、文字側では1バイトに符号化できる文字
    /// のみ受け付け、それ以外は黙って無視する。
    pub fn add_char(&mut self, ch: char) -> bool {
        self.put(Keystroke::Char(ch))
    }

    /// 1バイトをコードページを介さずそのまま入力する
    pub(crate) fn add_byte(&mut self, byte: u8) -> bool {
        self.put(Keystroke::Byte(byte))
    }

    fn put(&mut self, key: Keystroke) -> bool {
        if self.read_only {
            return false;
        }
        self.clear_selection();
        let updated = if self.insert_mode {
            self.insert_cell(key)
        } else {
            self.overwrite_cell(key)
        };
        if updated {
            self.ensure_cursor_visible();
        }
        updated
    }

    /// 挿入モードでの1入力
    fn insert_cell(&mut self, key: Keystroke) -> bool {
        match self.current_cell() {
            Cell::Hex {
                offset,
                shift,
                beyond_end,
            } => {
                let Some(digit) = key.hex_digit() else {
                    return false;
                };
                let word = self.cursor_line * self.geo.bytes_per_line + offset;
                if !self.extend_to(word, beyond_end) {
                    return false;
                }
                let edit_offset = word + shift / 8;
                if shift == self.geo.top_shift() {
                    // 最上位ニブルへの入力は新しいワードを割り込ませる。
                    // ワードはゼロ埋めされた状態からニブルが書かれる。
                    if self
                        .store
                        .insert_space(word, self.geo.bytes_per_word)
                        .is_err()
                    {
                        return false;
                    }
                    self.dirty_from(self.cursor_line);
                } else if self.store.ensure_valid(edit_offset + 1).is_err() {
                    return false;
                }
                self.write_nibble(edit_offset, shift % 8, digit);
                self.finish_edit(false, word, shift);
                true
            }
            Cell::Char { offset, beyond_end } => {
                let Some(byte) = key.char_byte() else {
                    return false;
                };
                let target = self.cursor_line * self.geo.bytes_per_line + offset;
                if !self.extend_to(target, beyond_end) {
                    return false;
                }
                if self.store.insert_space(target, 1).is_err() {
                    return false;
                }
                let _ = self.store.set(target, byte);
                self.dirty_from(self.cursor_line);
                self.finish_edit(true, target, 0);
                true
            }
            Cell::Offset | Cell::Whitespace => false,
        }
    }

    /// 上書きモードでの1入力
    fn overwrite_cell(&mut self, key: Keystroke) -> bool {
        match self.current_cell() {
            Cell::Hex {
                offset,
                shift,
                beyond_end,
            } => {
                let Some(digit) = key.hex_digit() else {
                    return false;
                };
                let word = self.cursor_line * self.geo.bytes_per_line + offset;
                let edit_offset = word + shift / 8;
                if beyond_end {
                    let tail_line = self.store.len() / self.geo.bytes_per_line;
                    if self.store.ensure_valid(edit_offset + 1).is_err() {
                        return false;
                    }
                    self.expand_dirty(tail_line, self.cursor_line);
                }
                self.write_nibble(edit_offset, shift % 8, digit);
                self.finish_edit(false, word, shift);
                true
            }
            Cell::Char { offset, beyond_end } => {
                let Some(byte) = key.char_byte() else {
                    return false;
                };
                let target = self.cursor_line * self.geo.bytes_per_line + offset;
                if beyond_end {
                    let tail_line = self.store.len() / self.geo.bytes_per_line;
                    if self.store.ensure_valid(target + 1).is_err() {
                        return false;
                    }
                    self.expand_dirty(tail_line, self.cursor_line);
                }
                let _ = self.store.set(target, byte);
                self.dirty_offsets(target, target);
                self.finish_edit(true, target, 0);
                true
            }
            Cell::Offset | Cell::Whitespace => false,
        }
    }

    /// Delete キーの処理
    ///
    /// 16進側の最上位ニブルではワードごと取り除いて後続を詰める。
    /// それ以外のニブルはゼロにして次へ進む。文字側は1バイト詰める。
    pub fn delete_cell(&mut self) -> bool {
        if self.read_only {
            return false;
        }
        self.clear_selection();
        let updated = match self.current_cell() {
            Cell::Hex {
                offset,
                shift,
                beyond_end,
            } => {
                if beyond_end {
                    return false;
                }
                let word = self.cursor_line * self.geo.bytes_per_line + offset;
                if shift == self.geo.top_shift() {
                    if self
                        .store
                        .remove_range(word, self.geo.bytes_per_word)
                        .is_err()
                    {
                        return false;
                    }
                    self.dirty_from(self.cursor_line);
                    // 同じオフセットに後続ワードが詰まってくる
                    let (line, col) = self.geo.hex_cell(word, self.geo.top_shift());
                    self.set_cursor_cell(line, col);
                } else {
                    self.write_nibble(word + shift / 8, shift % 8, 0);
                    self.finish_edit(false, word, shift);
                }
                true
            }
            Cell::Char { offset, beyond_end } => {
                if beyond_end {
                    return false;
                }
                let target = self.cursor_line * self.geo.bytes_per_line + offset;
                if self.store.remove_range(target, 1).is_err() {
                    return false;
                }
                self.dirty_from(self.cursor_line);
                if self.store.is_empty() {
                    self.cursor_to_zero();
                }
                true
            }
            Cell::Offset | Cell::Whitespace => false,
        };
        if updated {
            self.modified = true;
            self.ensure_cursor_visible();
        }
        updated
    }

    /// 任意位置へデータを挿入する（末尾への追記も可）
    pub fn insert_data(&mut self, offset: usize, data: &[u8]) -> bool {
        if offset > self.store.len() {
            return false;
        }
        if data.is_empty() {
            return true;
        }
        if self.store.insert_space(offset, data.len()).is_err() {
            return false;
        }
        self.store.as_mut_slice()[offset..offset + data.len()].copy_from_slice(data);
        self.dirty_from(offset / self.geo.bytes_per_line);
        true
    }

    /// 任意位置からデータを取り除く。len は末尾でクランプされる。
    pub fn delete_data(&mut self, offset: usize, len: usize) -> bool {
        if offset >= self.store.len() {
            return false;
        }
        if self.store.remove_range(offset, len).is_err() {
            return false;
        }
        self.dirty_from(offset / self.geo.bytes_per_line);
        if let Some((_, last)) = self.selection {
            if last >= self.store.len() {
                self.clear_selection();
            }
        }
        true
    }

    /// 有効範囲内のデータを書き換える。範囲を広げることはしない。
    pub fn replace_data(&mut self, offset: usize, data: &[u8]) -> bool {
        let Some(end) = offset.checked_add(data.len()) else {
            return false;
        };
        if end > self.store.len() {
            return false;
        }
        if data.is_empty() {
            return true;
        }
        self.store.as_mut_slice()[offset..end].copy_from_slice(data);
        self.dirty_offsets(offset, end - 1);
        true
    }

    /// カーソルが末尾より先にある場合、そこまでゼロ埋めで広げる
    fn extend_to(&mut self, offset: usize, beyond_end: bool) -> bool {
        if beyond_end && offset > self.store.len() {
            let tail_line = self.store.len() / self.geo.bytes_per_line;
            if self.store.ensure_valid(offset).is_err() {
                return false;
            }
            self.dirty_from(tail_line);
        }
        true
    }

    /// 1ニブルを書き換える。shift は 0 か 4。
    fn write_nibble(&mut self, offset: usize, shift: usize, digit: u8) {
        let old = self.store.get(offset).unwrap_or(0);
        let new = (old & !(0xF << shift)) | (digit << shift);
        let _ = self.store.set(offset, new);
        self.dirty_offsets(offset, offset);
    }

    /// 編集後の共通処理。変更フラグを立てて次の同種セルへ進む。
    fn finish_edit(&mut self, as_char: bool, offset: usize, shift: usize) {
        self.modified = true;
        let (offset, shift) = self.geo.next_cell(as_char, offset, shift);
        let (line, col) = if as_char {
            self.geo.char_cell(offset)
        } else {
            self.geo.hex_cell(offset, shift)
        };
        self.set_cursor_cell(line, col);
    }
}
