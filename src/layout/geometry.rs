/// 行頭オフセット列の表示形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetWidth {
    /// オフセット列なし
    #[default]
    None,
    /// "01234567:" 形式
    Bits32,
    /// "01234567`01234567:" 形式
    Bits64,
}

impl OffsetWidth {
    /// オフセット列が占めるセル数
    pub fn cells(self) -> usize {
        match self {
            OffsetWidth::None => 0,
            OffsetWidth::Bits32 => "01234567:".len(),
            OffsetWidth::Bits64 => "01234567`01234567:".len(),
        }
    }
}

/// 表示セルの意味
///
/// offset は行内のバイトオフセット。shift はワード内のニブルを示す
/// ビットシフト量（0 = 最下位ニブル = 右端の桁）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// オフセット列
    Offset,
    /// 区切り・余白
    Whitespace,
    /// 16進数の桁
    Hex {
        offset: usize,
        shift: usize,
        beyond_end: bool,
    },
    /// 文字表示列
    Char { offset: usize, beyond_end: bool },
}

impl Cell {
    /// カーソルを置けるセルかどうか
    pub fn is_editable(self) -> bool {
        matches!(self, Cell::Hex { .. } | Cell::Char { .. })
    }
}

/// 表示レイアウトの設定
///
/// bytes_per_word は 1, 2, 4, 8 のいずれか。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// 1行あたりのバイト数
    pub bytes_per_line: usize,
    /// 1ワードあたりのバイト数
    pub bytes_per_word: usize,
    /// オフセット列の形式
    pub offset_width: OffsetWidth,
}

impl Geometry {
    /// 1ワードの表示に必要なセル数（末尾の区切り1つを含む）
    ///
    /// 8バイトワードは上位/下位の間に "`" が入るため1つ多い。
    pub fn cells_per_word(&self) -> usize {
        let cells = self.bytes_per_word * 2 + 1;
        if self.bytes_per_word == 8 { cells + 1 } else { cells }
    }

    /// 1行あたりのワード数
    pub fn words_per_line(&self) -> usize {
        self.bytes_per_line / self.bytes_per_word
    }

    /// 有効バイト数に対する行数（端数は切り上げ）
    pub fn lines_populated(&self, valid: usize) -> usize {
        valid.div_ceil(self.bytes_per_line)
    }

    /// 1行の総セル数
    pub fn total_cells(&self) -> usize {
        self.char_cell(self.bytes_per_line - 1).1 + 1
    }

    /// ビットシフト量に対応するセルインデックス（右端からの距離）
    pub(crate) fn cell_index_for_shift(&self, shift: usize) -> usize {
        debug_assert_eq!(shift % 4, 0);
        let index = shift / 4;
        // 8バイトワードでは上位32ビットが "`" の左側にずれる
        if shift >= 32 { index + 1 } else { index }
    }

    /// 表示セル (line, col) の意味を求める
    pub fn classify(&self, line: usize, col: usize, valid: usize) -> Cell {
        let lines_populated = self.lines_populated(valid);
        let mut bytes_this_line = self.bytes_per_line;
        if line + 1 == lines_populated {
            bytes_this_line = valid - line * self.bytes_per_line;
        }

        let offset_cells = self.offset_width.cells();
        if offset_cells > 0 {
            if col < offset_cells {
                return Cell::Offset;
            } else if col == offset_cells {
                return Cell::Whitespace;
            }
        }

        let cells_per_word = self.cells_per_word();
        let words_per_line = self.words_per_line();

        // オフセット列がある場合は先頭セルが区切りになる。ない場合は
        // 先頭セルが16進の桁になるよう1つずらす。
        let mut data_offset = col - offset_cells;
        if offset_cells == 0 {
            data_offset += 1;
        }

        if data_offset < words_per_line * cells_per_word {
            let modulus = data_offset % cells_per_word;
            if modulus == 0 {
                return Cell::Whitespace;
            }
            let byte_offset = (data_offset / cells_per_word) * self.bytes_per_word;
            let mut modulus = cells_per_word - 1 - modulus;
            if modulus == 8 {
                debug_assert_eq!(self.bytes_per_word, 8);
                return Cell::Whitespace;
            } else if modulus > 8 {
                modulus -= 1;
            }
            let shift = 4 * modulus;
            let beyond_end =
                line >= lines_populated || byte_offset + shift / 8 >= bytes_this_line;
            return Cell::Hex {
                offset: byte_offset,
                shift,
                beyond_end,
            };
        }

        let mut data_offset = data_offset - words_per_line * cells_per_word;
        if data_offset < 2 {
            return Cell::Whitespace;
        }
        data_offset -= 2;
        if data_offset >= self.bytes_per_line {
            return Cell::Whitespace;
        }
        let beyond_end = line >= lines_populated || data_offset >= bytes_this_line;
        Cell::Char {
            offset: data_offset,
            beyond_end,
        }
    }
}
