//! 配色設定

use ratatui::style::{Color, Modifier, Style};

/// ウィジェットの配色
///
/// 利用側で差し替えられるよう Style をそのまま持つ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    /// 通常のデータセル
    pub text: Style,
    /// 選択範囲内のデータセル
    pub selected: Style,
    /// 行頭オフセット列
    pub offset: Style,
    /// キャプション行
    pub caption: Style,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            text: Style::default(),
            selected: Style::default().add_modifier(Modifier::REVERSED),
            offset: Style::default().fg(Color::DarkGray),
            caption: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        }
    }
}

impl Palette {
    /// データセルの配色を選択状態に応じて返す
    pub fn data(&self, selected: bool) -> Style {
        if selected { self.selected } else { self.text }
    }
}
