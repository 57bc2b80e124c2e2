//! 可変長バイトバッファ

mod store;

pub use store::{ByteStore, GROW_PADDING};

use thiserror::Error;

/// バッファ操作のエラー
#[derive(Debug, Error)]
pub enum BufferError {
    /// 範囲外アクセス
    #[error("offset {0} out of bounds")]
    OutOfBounds(usize),
    /// 要求サイズが表現可能な上限を超過
    #[error("requested size overflows")]
    TooLarge,
    /// メモリ確保失敗
    #[error("allocation failed")]
    Alloc,
}
