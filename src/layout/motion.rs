use super::geometry::{Geometry, OffsetWidth};

impl Geometry {
    /// ワード内の最上位ニブルを示すビットシフト量
    pub fn top_shift(&self) -> usize {
        self.bytes_per_word * 8 - 4
    }

    /// オフセットをワード境界に揃え、はみ出し分をシフト量に繰り込む
    pub(crate) fn realign(&self, offset: usize, shift: usize) -> (usize, usize) {
        let unaligned = offset % self.bytes_per_word;
        (offset - unaligned, shift + unaligned * 8)
    }

    /// 文字列のバッファオフセットに対応する表示セル (line, col)
    pub fn char_cell(&self, offset: usize) -> (usize, usize) {
        let line = offset / self.bytes_per_line;
        let mut col = self.offset_width.cells();
        if self.offset_width != OffsetWidth::None {
            col += 1;
        }
        col += self.words_per_line() * self.cells_per_word() + 1;
        col += offset % self.bytes_per_line;
        (line, col)
    }

    /// 16進桁のバッファオフセットとシフト量に対応する表示セル (line, col)
    pub fn hex_cell(&self, offset: usize, shift: usize) -> (usize, usize) {
        let line = offset / self.bytes_per_line;
        let offset_cells = self.offset_width.cells();
        // オフセット列がない場合は先頭の区切りが省かれる
        let margin = usize::from(offset_cells == 0);
        let word = (offset % self.bytes_per_line).div_ceil(self.bytes_per_word);
        let col = offset_cells + (word + 1) * self.cells_per_word()
            - self.cell_index_for_shift(shift)
            - margin
            - 1;
        (line, col)
    }

    /// 同種セルの1つ前（左）の位置を求める
    ///
    /// 16進桁ではニブル単位で左へ進み、最上位ニブルからは前ワードの
    /// 最下位ニブルへ移る。先頭で頭打ち。
    pub fn prev_cell(&self, as_char: bool, offset: usize, shift: usize) -> (usize, usize) {
        if as_char {
            return (offset.saturating_sub(1), shift);
        }
        let (mut offset, mut shift) = self.realign(offset, shift);
        if shift < self.top_shift() {
            shift += 4;
        } else if offset > 0 {
            offset -= self.bytes_per_word;
            shift = 0;
        }
        (offset, shift)
    }

    /// 同種セルの1つ後（右）の位置を求める
    pub fn next_cell(&self, as_char: bool, offset: usize, shift: usize) -> (usize, usize) {
        if as_char {
            return (offset + 1, shift);
        }
        let (mut offset, mut shift) = self.realign(offset, shift);
        if shift >= 4 {
            shift -= 4;
        } else {
            offset += self.bytes_per_word;
            shift = self.top_shift();
        }
        (offset, shift)
    }
}
