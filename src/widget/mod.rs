//! 16進編集ウィジェット本体

mod edit;
mod input;
mod nav;
mod paint;

pub use paint::{CursorPaint, CursorShape};

use ratatui::layout::Rect;
use thiserror::Error;

use crate::buffer::ByteStore;
use crate::layout::{Cell, Geometry, OffsetWidth};
use crate::ui::Palette;

/// 設定エラー
#[derive(Debug, Error)]
pub enum ConfigError {
    /// ワード幅は 1, 2, 4, 8 のみ
    #[error("unsupported word size {0}")]
    UnsupportedWordSize(usize),
    /// 行幅はワード幅の倍数であること
    #[error("line width {0} is not a multiple of word size {1}")]
    MisalignedLineWidth(usize, usize),
    /// カーソル移動通知は1つまで
    #[error("cursor move callback already registered")]
    CallbackRegistered,
}

/// ウィジェット生成時の設定
#[derive(Debug, Clone)]
pub struct Options {
    /// 1行あたりのバイト数
    pub bytes_per_line: usize,
    /// 1ワードあたりのバイト数（1, 2, 4, 8）
    pub bytes_per_word: usize,
    /// 行頭オフセット列の形式
    pub offset_width: OffsetWidth,
    /// 読み取り専用で開く
    pub read_only: bool,
    /// 挿入モードで開く（既定は上書き）
    pub insert_mode: bool,
    /// キャプション行（空なら表示しない）
    pub caption: String,
    /// 配色
    pub palette: Palette,
    /// ホイール1回あたりのスクロール行数
    pub scroll_lines: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            bytes_per_line: 16,
            bytes_per_word: 1,
            offset_width: OffsetWidth::None,
            read_only: false,
            insert_mode: false,
            caption: String::new(),
            palette: Palette::default(),
            scroll_lines: 3,
        }
    }
}

/// Alt+テンキー入力の解釈
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NumericInterp {
    /// 10進、ANSI コードページ文字
    Ansi,
    /// 先頭0の10進、コードページを介さない生バイト
    Oem,
    /// "+" に続く16進、Unicode スカラー値
    Unicode,
}

/// Alt+テンキー入力の途中経過
#[derive(Debug, Clone, Copy)]
pub(crate) struct NumericEntry {
    pub(crate) value: u32,
    pub(crate) interp: NumericInterp,
}

/// 16進編集ウィジェット
///
/// バッファを所有し、カーソル・選択・ビューポートの状態を保持する。
/// 描画は行単位のダーティ範囲で管理し、`paint` が消費する。
pub struct HexEdit {
    pub(crate) store: ByteStore,
    pub(crate) geo: Geometry,
    pub(crate) viewport_top: usize,
    pub(crate) viewport_left: usize,
    /// カーソルの表示位置（バッファ全体の行・列）
    pub(crate) cursor_line: usize,
    pub(crate) cursor_col: usize,
    /// ダーティ範囲。first > last なら再描画不要。
    pub(crate) first_dirty: usize,
    pub(crate) last_dirty: usize,
    /// 選択範囲（両端を含むバッファオフセット）
    pub(crate) selection: Option<(usize, usize)>,
    pub(crate) drag_anchor: Option<usize>,
    pub(crate) last_drag: Option<(u16, u16)>,
    pub(crate) insert_mode: bool,
    pub(crate) read_only: bool,
    pub(crate) has_focus: bool,
    pub(crate) modified: bool,
    pub(crate) numeric: Option<NumericEntry>,
    pub(crate) caption: String,
    pub(crate) palette: Palette,
    /// 直近の描画領域（キャプション行を除いたクライアント部）
    pub(crate) area: Rect,
    pub(crate) cursor_move_cb: Option<Box<dyn FnMut(usize, usize)>>,
    pub(crate) scroll_lines: usize,
}

impl HexEdit {
    /// ウィジェットを生成する
    pub fn new(options: Options) -> Result<Self, ConfigError> {
        if !matches!(options.bytes_per_word, 1 | 2 | 4 | 8) {
            return Err(ConfigError::UnsupportedWordSize(options.bytes_per_word));
        }
        if options.bytes_per_line == 0 || options.bytes_per_line % options.bytes_per_word != 0 {
            return Err(ConfigError::MisalignedLineWidth(
                options.bytes_per_line,
                options.bytes_per_word,
            ));
        }
        let geo = Geometry {
            bytes_per_line: options.bytes_per_line,
            bytes_per_word: options.bytes_per_word,
            offset_width: options.offset_width,
        };
        let (cursor_line, cursor_col) = geo.hex_cell(0, geo.top_shift());
        Ok(Self {
            store: ByteStore::new(),
            geo,
            viewport_top: 0,
            viewport_left: 0,
            cursor_line,
            cursor_col,
            first_dirty: 0,
            last_dirty: usize::MAX,
            selection: None,
            drag_anchor: None,
            last_drag: None,
            insert_mode: options.insert_mode,
            read_only: options.read_only,
            has_focus: true,
            modified: false,
            numeric: None,
            caption: options.caption,
            palette: options.palette,
            area: Rect::default(),
            cursor_move_cb: None,
            scroll_lines: options.scroll_lines,
        })
    }

    /// バッファを差し替える
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.store.replace(data);
        self.selection = None;
        self.viewport_top = 0;
        self.viewport_left = 0;
        self.dirty_all();
        self.cursor_to_zero();
    }

    /// バッファの有効範囲への参照
    pub fn data(&self) -> &[u8] {
        self.store.as_slice()
    }

    /// バッファの所有権を取り出す（ウィジェットは空になる）
    pub fn take_data(&mut self) -> Vec<u8> {
        let data = self.store.take();
        self.clear();
        data
    }

    /// バッファを空にして初期状態へ戻す
    pub fn clear(&mut self) {
        self.store.clear();
        self.selection = None;
        self.viewport_top = 0;
        self.viewport_left = 0;
        self.dirty_all();
        self.cursor_to_zero();
    }

    /// 有効バイト数
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// バッファが空かどうか
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// データのある行数（スクロールバー連携用）
    pub fn total_lines(&self) -> usize {
        self.geo.lines_populated(self.store.len())
    }

    /// ビューポートの先頭行
    pub fn viewport_top(&self) -> usize {
        self.viewport_top
    }

    /// 挿入モードかどうか
    pub fn insert_mode(&self) -> bool {
        self.insert_mode
    }

    /// 挿入モードを設定
    pub fn set_insert_mode(&mut self, insert: bool) {
        self.insert_mode = insert;
    }

    /// 読み取り専用かどうか
    pub fn read_only(&self) -> bool {
        self.read_only
    }

    /// 読み取り専用を設定
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// 変更フラグ
    pub fn modified(&self) -> bool {
        self.modified
    }

    /// 変更フラグを設定し、以前の値を返す
    pub fn set_modified(&mut self, modified: bool) -> bool {
        std::mem::replace(&mut self.modified, modified)
    }

    /// キャプション行を設定
    pub fn set_caption(&mut self, caption: impl Into<String>) {
        self.caption = caption.into();
        self.dirty_all();
    }

    /// キャプション行
    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// 配色を差し替える
    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
        self.dirty_all();
    }

    /// カーソル移動通知を登録する（1つのみ）
    pub fn on_cursor_move(
        &mut self,
        cb: impl FnMut(usize, usize) + 'static,
    ) -> Result<(), ConfigError> {
        if self.cursor_move_cb.is_some() {
            return Err(ConfigError::CallbackRegistered);
        }
        self.cursor_move_cb = Some(Box::new(cb));
        Ok(())
    }

    /// ワード幅を変更する
    ///
    /// カーソルが指していたバイトとニブルは変更後も保たれる。
    pub fn set_bytes_per_word(&mut self, bytes_per_word: usize) -> Result<(), ConfigError> {
        if !matches!(bytes_per_word, 1 | 2 | 4 | 8) {
            return Err(ConfigError::UnsupportedWordSize(bytes_per_word));
        }
        if self.geo.bytes_per_line % bytes_per_word != 0 {
            return Err(ConfigError::MisalignedLineWidth(
                self.geo.bytes_per_line,
                bytes_per_word,
            ));
        }
        let cell = self.current_cell();
        self.geo.bytes_per_word = bytes_per_word;
        match cell {
            Cell::Hex { offset, shift, .. } => {
                // 指していたバイトとニブルから新ワード幅での位置を求める
                let byte = self.cursor_line * self.geo.bytes_per_line + offset + shift / 8;
                let aligned = byte - byte % bytes_per_word;
                let shift = (byte % bytes_per_word) * 8 + shift % 8;
                let (line, col) = self.geo.hex_cell(aligned, shift);
                self.set_cursor_cell(line, col);
            }
            Cell::Char { offset, .. } => {
                let byte = self.cursor_line * self.geo.bytes_per_line + offset;
                let (line, col) = self.geo.char_cell(byte);
                self.set_cursor_cell(line, col);
            }
            Cell::Offset | Cell::Whitespace => {}
        }
        self.dirty_from(self.viewport_top);
        Ok(())
    }

    /// 行頭オフセット列の形式を変更する
    pub fn set_offset_width(&mut self, offset_width: OffsetWidth) {
        if self.geo.offset_width == offset_width {
            return;
        }
        let cell = self.current_cell();
        self.geo.offset_width = offset_width;
        match cell {
            Cell::Hex { offset, shift, .. } => {
                let byte = self.cursor_line * self.geo.bytes_per_line + offset;
                let (line, col) = self.geo.hex_cell(byte, shift);
                self.set_cursor_cell(line, col);
            }
            Cell::Char { offset, .. } => {
                let byte = self.cursor_line * self.geo.bytes_per_line + offset;
                let (line, col) = self.geo.char_cell(byte);
                self.set_cursor_cell(line, col);
            }
            Cell::Offset | Cell::Whitespace => {}
        }
        self.dirty_from(self.viewport_top);
    }

    /// 現在のレイアウト設定
    pub fn geometry(&self) -> Geometry {
        self.geo
    }

    /// 全行の再描画を要求する
    pub fn reposition(&mut self) {
        self.dirty_all();
    }

    /// カーソル位置を (文字列側か, バッファオフセット, ビットシフト) で返す
    pub fn cursor_location(&self) -> (bool, usize, usize) {
        match self.current_cell() {
            Cell::Hex { offset, shift, .. } => (
                false,
                self.cursor_line * self.geo.bytes_per_line + offset,
                shift,
            ),
            Cell::Char { offset, .. } => {
                (true, self.cursor_line * self.geo.bytes_per_line + offset, 0)
            }
            Cell::Offset | Cell::Whitespace => (false, 0, self.geo.top_shift()),
        }
    }

    /// カーソルの表示位置 (line, col)
    pub fn visual_cursor_location(&self) -> (usize, usize) {
        (self.cursor_line, self.cursor_col)
    }

    /// カーソルをバッファ上の位置へ移動する
    ///
    /// 移動したら true。範囲外の指定は無視して false を返す。
    pub fn set_cursor_location(&mut self, as_char: bool, offset: usize, shift: usize) -> bool {
        if offset > self.store.len() {
            return false;
        }
        let (line, col) = if as_char {
            self.geo.char_cell(offset)
        } else {
            if shift % 4 != 0 {
                return false;
            }
            // 非整列オフセットの分を繰り込んだ後のシフト量で検証する
            let (offset, shift) = self.geo.realign(offset, shift);
            if shift >= self.geo.bytes_per_word * 8 {
                return false;
            }
            self.geo.hex_cell(offset, shift)
        };
        let moved = (line, col) != (self.cursor_line, self.cursor_col);
        self.set_cursor_cell(line, col);
        self.ensure_cursor_visible();
        moved
    }

    /// 選択範囲（両端を含む）
    pub fn selection(&self) -> Option<(usize, usize)> {
        self.selection
    }

    /// 選択があるかどうか
    pub fn selection_active(&self) -> bool {
        self.selection.is_some()
    }

    /// 選択範囲を設定する
    ///
    /// first <= last かつ last が有効範囲内であること。
    pub fn set_selection(&mut self, first: usize, last: usize) -> bool {
        if first > last || last >= self.store.len() {
            return false;
        }
        self.clear_selection();
        self.selection = Some((first, last));
        self.dirty_offsets(first, last);
        true
    }

    /// 選択を解除する
    pub fn clear_selection(&mut self) {
        if let Some((first, last)) = self.selection.take() {
            self.dirty_offsets(first, last);
        }
    }

    /// 選択範囲のコピーを返す
    pub fn selected_data(&self) -> Option<Vec<u8>> {
        let (first, last) = self.selection?;
        Some(self.store.as_slice()[first..=last].to_vec())
    }

    // --- 内部状態 ---

    pub(crate) fn current_cell(&self) -> Cell {
        self.geo
            .classify(self.cursor_line, self.cursor_col, self.store.len())
    }

    /// カーソルを表示セルへ移動する
    ///
    /// 位置が変わる場合のみ、新しいバッファ位置で移動通知を発火する。
    pub(crate) fn set_cursor_cell(&mut self, line: usize, col: usize) {
        if line == self.cursor_line && col == self.cursor_col {
            return;
        }
        let notify = match self.geo.classify(line, col, self.store.len()) {
            Cell::Hex { offset, shift, .. } => {
                Some((line * self.geo.bytes_per_line + offset, shift))
            }
            Cell::Char { offset, .. } => Some((line * self.geo.bytes_per_line + offset, 0)),
            Cell::Offset | Cell::Whitespace => None,
        };
        if let (Some((offset, shift)), Some(cb)) = (notify, self.cursor_move_cb.as_mut()) {
            cb(offset, shift);
        }
        self.cursor_line = line;
        self.cursor_col = col;
    }

    /// カーソルを先頭の最上位ニブルへ
    pub(crate) fn cursor_to_zero(&mut self) {
        let (line, col) = self.geo.hex_cell(0, self.geo.top_shift());
        self.set_cursor_cell(line, col);
    }

    // --- ダーティ範囲 ---

    pub(crate) fn expand_dirty(&mut self, first: usize, last: usize) {
        self.first_dirty = self.first_dirty.min(first);
        self.last_dirty = self.last_dirty.max(last);
    }

    pub(crate) fn dirty_from(&mut self, line: usize) {
        self.expand_dirty(line, usize::MAX);
    }

    pub(crate) fn dirty_all(&mut self) {
        self.first_dirty = 0;
        self.last_dirty = usize::MAX;
    }

    /// バッファオフセット範囲に対応する行をダーティにする
    pub(crate) fn dirty_offsets(&mut self, first: usize, last: usize) {
        self.expand_dirty(
            first / self.geo.bytes_per_line,
            last / self.geo.bytes_per_line,
        );
    }

    /// ダーティ範囲を取り出してリセットする
    pub(crate) fn take_dirty(&mut self) -> Option<(usize, usize)> {
        if self.first_dirty > self.last_dirty {
            return None;
        }
        let range = (self.first_dirty, self.last_dirty);
        self.first_dirty = usize::MAX;
        self.last_dirty = 0;
        Some(range)
    }
}
