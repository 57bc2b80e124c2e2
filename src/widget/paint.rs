//! 行単位の描画

use ratatui::{buffer::Buffer, layout::Rect, style::Style};

use crate::layout::OffsetWidth;

use super::HexEdit;

/// 端末カーソルの形状
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorShape {
    /// 挿入モードの細いバー
    Bar,
    /// 上書きモードのブロック
    Block,
}

/// ホストが端末カーソルを置くための情報
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPaint {
    pub visible: bool,
    pub shape: CursorShape,
    pub x: u16,
    pub y: u16,
}

impl HexEdit {
    /// ダーティな行だけを描画する
    ///
    /// ホスト側で保持し続ける Buffer への差分描画を想定している。
    /// 毎フレーム作り直す Buffer には `render` を使う。
    pub fn paint(&mut self, area: Rect, buf: &mut Buffer) -> CursorPaint {
        let caption_rows = u16::from(!self.caption.is_empty()).min(area.height);
        let client = Rect {
            x: area.x,
            y: area.y + caption_rows,
            width: area.width,
            height: area.height - caption_rows,
        };
        // 領域が変わったら全行引き直す
        if client != self.area {
            self.area = client;
            self.dirty_all();
        }
        if caption_rows > 0 {
            for i in 0..area.width {
                if let Some(cell) = buf.cell_mut((area.x + i, area.y)) {
                    cell.set_char(' ').set_style(self.palette.caption);
                }
            }
            buf.set_stringn(
                area.x,
                area.y,
                &self.caption,
                area.width as usize,
                self.palette.caption,
            );
        }
        if let Some((first, last)) = self.take_dirty() {
            for row in 0..client.height as usize {
                let line = self.viewport_top + row;
                if line < first || line > last {
                    continue;
                }
                self.render_line(line, client.x, client.y + row as u16, client.width, buf);
            }
        }
        self.cursor_paint(client)
    }

    /// 全行を描画する
    pub fn render(&mut self, area: Rect, buf: &mut Buffer) -> CursorPaint {
        self.dirty_all();
        self.paint(area, buf)
    }

    fn cursor_paint(&self, client: Rect) -> CursorPaint {
        let in_view = self.cursor_line >= self.viewport_top
            && self.cursor_line < self.viewport_top + client.height as usize
            && self.cursor_col >= self.viewport_left
            && self.cursor_col < self.viewport_left + client.width as usize;
        CursorPaint {
            visible: self.has_focus && in_view,
            shape: if self.insert_mode {
                CursorShape::Bar
            } else {
                CursorShape::Block
            },
            x: client.x + self.cursor_col.saturating_sub(self.viewport_left) as u16,
            y: client.y + self.cursor_line.saturating_sub(self.viewport_top) as u16,
        }
    }

    fn render_line(&self, line: usize, x: u16, y: u16, width: u16, buf: &mut Buffer) {
        let cells = self.compose_line(line);
        for i in 0..width as usize {
            let (ch, style) = cells
                .get(self.viewport_left + i)
                .copied()
                .unwrap_or((' ', self.palette.text));
            if let Some(cell) = buf.cell_mut((x + i as u16, y)) {
                cell.set_char(ch).set_style(style);
            }
        }
    }

    /// 1行ぶんのセル列を組み立てる
    fn compose_line(&self, line: usize) -> Vec<(char, Style)> {
        let geo = self.geo;
        let valid = self.store.len();
        let populated = line < geo.lines_populated(valid);
        let bytes_per_word = geo.bytes_per_word;
        let mut cells: Vec<(char, Style)> = Vec::with_capacity(geo.total_cells());

        match geo.offset_width {
            OffsetWidth::None => {}
            OffsetWidth::Bits32 => {
                let text = if populated {
                    format!("{:08x}: ", line * geo.bytes_per_line)
                } else {
                    " ".repeat(10)
                };
                cells.extend(text.chars().map(|c| (c, self.palette.offset)));
            }
            OffsetWidth::Bits64 => {
                let offset = (line * geo.bytes_per_line) as u64;
                let text = if populated {
                    format!("{:08x}`{:08x}: ", offset >> 32, offset & 0xFFFF_FFFF)
                } else {
                    " ".repeat(20)
                };
                cells.extend(text.chars().map(|c| (c, self.palette.offset)));
            }
        }

        for word in 0..geo.words_per_line() {
            let word_start = line * geo.bytes_per_line + word * bytes_per_word;
            if !populated || word_start >= valid {
                // データのないワードは空白のまま
                let blanks = bytes_per_word * 2 + usize::from(bytes_per_word == 8);
                cells.extend(std::iter::repeat_n((' ', self.palette.text), blanks));
            } else {
                // リトルエンディアンで組み立てる。末尾の欠けはゼロ。
                let mut value: u64 = 0;
                for i in (0..bytes_per_word).rev() {
                    value = (value << 8) | u64::from(self.store.get(word_start + i).unwrap_or(0));
                }
                for nibble in (0..bytes_per_word * 2).rev() {
                    let shift = nibble * 4;
                    let digit = ((value >> shift) & 0xF) as u32;
                    let ch = char::from_digit(digit, 16).unwrap_or('0');
                    cells.push((ch, self.data_style(word_start + shift / 8, false)));
                    if bytes_per_word == 8 && shift == 32 {
                        cells.push(('`', self.data_style(word_start + 3, true)));
                    }
                }
            }
            cells.push((' ', self.data_style(word_start + bytes_per_word - 1, true)));
        }

        // 余白を1つ挟んで文字表示
        cells.push((' ', self.palette.text));
        for i in 0..geo.bytes_per_line {
            let offset = line * geo.bytes_per_line + i;
            match self.store.get(offset) {
                Some(b) => {
                    let ch = if (0x20..=0x7E).contains(&b) { b as char } else { '.' };
                    cells.push((ch, self.data_style(offset, false)));
                }
                None => cells.push((' ', self.palette.text)),
            }
        }
        cells
    }

    /// 選択範囲を反映したデータセルの配色
    ///
    /// padding はワード末尾の区切りセル。選択末尾バイトの区切りは
    /// 反転しない。
    fn data_style(&self, offset: usize, padding: bool) -> Style {
        let selected = match self.selection {
            Some((first, last)) => {
                if padding {
                    offset >= first && offset < last
                } else {
                    offset >= first && offset <= last
                }
            }
            None => false,
        };
        self.palette.data(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{HexEdit, Options};
    use super::*;
    use crate::layout::OffsetWidth;
    use ratatui::style::Modifier;

    fn widget(options: Options, data: Vec<u8>) -> HexEdit {
        let mut w = HexEdit::new(options).unwrap();
        w.set_data(data);
        w
    }

    fn row_text(buf: &Buffer, y: u16, width: u16) -> String {
        (0..width)
            .map(|x| buf.cell((x, y)).map(|c| c.symbol()).unwrap_or(" "))
            .collect()
    }

    #[test]
    fn renders_hex_and_char_regions() {
        let mut w = widget(Options::default(), vec![0x00, 0x41, 0xFF]);
        let area = Rect::new(0, 0, 70, 2);
        let mut buf = Buffer::empty(area);
        w.render(area, &mut buf);
        let row = row_text(&buf, 0, 70);
        assert!(row.starts_with("00 41 ff "));
        // 文字表示は印字可能文字以外が '.'
        assert_eq!(&row[49..52], ".A.");
        // データのない2行目は空白のまま
        assert_eq!(row_text(&buf, 1, 70).trim(), "");
    }

    #[test]
    fn renders_offset_column_lowercase() {
        let mut w = widget(
            Options {
                offset_width: OffsetWidth::Bits32,
                ..Options::default()
            },
            vec![0xAB; 18],
        );
        let area = Rect::new(0, 0, 80, 2);
        let mut buf = Buffer::empty(area);
        w.render(area, &mut buf);
        assert!(row_text(&buf, 0, 80).starts_with("00000000: ab"));
        assert!(row_text(&buf, 1, 80).starts_with("00000010: ab"));
    }

    #[test]
    fn renders_wide_offset_column() {
        let mut w = widget(
            Options {
                offset_width: OffsetWidth::Bits64,
                ..Options::default()
            },
            vec![1],
        );
        let area = Rect::new(0, 0, 90, 1);
        let mut buf = Buffer::empty(area);
        w.render(area, &mut buf);
        assert!(row_text(&buf, 0, 90).starts_with("00000000`00000000: 01"));
    }

    #[test]
    fn partial_tail_word_shows_zero_high_bytes() {
        let mut w = widget(
            Options {
                bytes_per_word: 4,
                ..Options::default()
            },
            vec![0x11, 0x22],
        );
        let area = Rect::new(0, 0, 40, 1);
        let mut buf = Buffer::empty(area);
        w.render(area, &mut buf);
        let row = row_text(&buf, 0, 40);
        // リトルエンディアン表示。欠けた上位バイトはゼロで埋まる。
        assert!(row.starts_with("00002211 "));
    }

    #[test]
    fn word8_uses_backtick_between_halves() {
        let mut w = widget(
            Options {
                bytes_per_word: 8,
                ..Options::default()
            },
            (1..=8).collect(),
        );
        let area = Rect::new(0, 0, 40, 1);
        let mut buf = Buffer::empty(area);
        w.render(area, &mut buf);
        assert!(row_text(&buf, 0, 40).starts_with("08070605`04030201 "));
    }

    #[test]
    fn selection_inverts_cells_but_not_final_padding() {
        let mut w = widget(Options::default(), vec![0, 1, 2, 3]);
        assert!(w.set_selection(1, 2));
        let area = Rect::new(0, 0, 70, 1);
        let mut buf = Buffer::empty(area);
        w.render(area, &mut buf);
        // Buffer::empty のセルは Reset 色を持つため、比較ではなく
        // 反転修飾の有無を見る
        let inverted = |x: u16| {
            buf.cell((x, 0))
                .is_some_and(|c| c.style().add_modifier.contains(Modifier::REVERSED))
        };
        // バイト1の桁 (col 3,4) と続く区切り (col 5) は反転
        assert!(inverted(3));
        assert!(inverted(5));
        // バイト2の桁は反転、直後の区切りは通常
        assert!(inverted(6));
        assert!(!inverted(8));
        // 選択外のバイト0は通常
        assert!(!inverted(0));
        // 文字表示側も反転する
        assert!(!inverted(49));
        assert!(inverted(50));
    }

    #[test]
    fn paint_consumes_dirty_range() {
        let mut w = widget(Options::default(), vec![0xAA; 4]);
        let area = Rect::new(0, 0, 70, 2);
        let mut buf = Buffer::empty(area);
        w.paint(area, &mut buf);
        assert!(row_text(&buf, 0, 70).starts_with("aa aa aa aa "));
        // ダーティ範囲は消費済みなので新しいバッファには何も描かない
        let mut fresh = Buffer::empty(area);
        w.paint(area, &mut fresh);
        assert_eq!(row_text(&fresh, 0, 70).trim(), "");
        // 編集すると該当行がまた描かれる
        assert!(w.replace_data(0, &[0xBB]));
        let mut again = Buffer::empty(area);
        w.paint(area, &mut again);
        assert!(row_text(&again, 0, 70).starts_with("bb aa aa aa "));
    }

    #[test]
    fn cursor_paint_tracks_mode_and_focus() {
        let mut w = widget(Options::default(), vec![0u8; 16]);
        let area = Rect::new(2, 1, 70, 2);
        let mut buf = Buffer::empty(Rect::new(0, 0, 80, 4));
        let cursor = w.render(area, &mut buf);
        assert!(cursor.visible);
        assert_eq!(cursor.shape, CursorShape::Block);
        assert_eq!((cursor.x, cursor.y), (2, 1));
        w.set_insert_mode(true);
        w.cursor_right();
        let cursor = w.render(area, &mut buf);
        assert_eq!(cursor.shape, CursorShape::Bar);
        assert_eq!((cursor.x, cursor.y), (3, 1));
        assert!(w.handle_event(&crossterm::event::Event::FocusLost));
        let cursor = w.render(area, &mut buf);
        assert!(!cursor.visible);
    }

    #[test]
    fn caption_row_shifts_client_area() {
        let mut w = widget(Options::default(), vec![0x7A; 1]);
        w.set_caption("demo.bin");
        let area = Rect::new(0, 0, 70, 3);
        let mut buf = Buffer::empty(area);
        let cursor = w.render(area, &mut buf);
        assert!(row_text(&buf, 0, 70).starts_with("demo.bin"));
        assert!(row_text(&buf, 1, 70).starts_with("7a "));
        // カーソルはキャプションの下の行にある
        assert_eq!(cursor.y, 1);
    }

    #[test]
    fn viewport_left_slices_columns() {
        let mut w = widget(Options::default(), vec![0x12, 0x34]);
        w.viewport_left = 3;
        let area = Rect::new(0, 0, 10, 1);
        let mut buf = Buffer::empty(area);
        w.render(area, &mut buf);
        assert!(row_text(&buf, 0, 10).starts_with("34 "));
    }
}
