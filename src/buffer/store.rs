use super::BufferError;

/// バッファ拡張時の余剰確保量（小さな挿入の繰り返しを償却する）
pub const GROW_PADDING: usize = 16384;

/// 編集対象のバイト列
///
/// `len()` が論理サイズ、`capacity()` が確保済みサイズ。
/// 拡張操作はすべてアトミック: 確保に失敗した場合は論理状態を
/// 一切変更せずにエラーを返す。
#[derive(Debug, Default)]
pub struct ByteStore {
    /// バッファデータ（len = 有効バイト数）
    data: Vec<u8>,
}

impl ByteStore {
    /// 空のバッファを作成
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// 有効バイト数を取得
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// バッファが空かどうか
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 確保済みバイト数を取得
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// 指定位置のバイトを取得
    pub fn get(&self, pos: usize) -> Option<u8> {
        self.data.get(pos).copied()
    }

    /// 指定位置のバイトを設定
    pub fn set(&mut self, pos: usize, value: u8) -> Result<(), BufferError> {
        match self.data.get_mut(pos) {
            Some(b) => {
                *b = value;
                Ok(())
            }
            None => Err(BufferError::OutOfBounds(pos)),
        }
    }

    /// 有効範囲への参照を取得
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// 有効範囲への可変参照を取得
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// バッファ全体を置き換え、旧データを返す
    pub fn replace(&mut self, data: Vec<u8>) -> Vec<u8> {
        std::mem::replace(&mut self.data, data)
    }

    /// バッファの所有権を取り出す
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }

    /// バッファを空にする（確保領域も解放）
    pub fn clear(&mut self) {
        self.data = Vec::new();
    }

    /// n バイトを格納できるだけの領域を確保する
    ///
    /// 既に足りていれば何もしない。不足時は n + GROW_PADDING まで
    /// まとめて確保する。論理サイズは変化しない。
    pub fn ensure_allocated(&mut self, n: usize) -> Result<(), BufferError> {
        if n <= self.data.capacity() {
            return Ok(());
        }
        let padded = n.checked_add(GROW_PADDING).ok_or(BufferError::TooLarge)?;
        self.data
            .try_reserve_exact(padded - self.data.len())
            .map_err(|_| BufferError::Alloc)
    }

    /// 有効サイズを n まで広げる（新規領域はゼロ埋め）
    pub fn ensure_valid(&mut self, n: usize) -> Result<(), BufferError> {
        if n <= self.data.len() {
            return Ok(());
        }
        self.ensure_allocated(n)?;
        self.data.resize(n, 0);
        Ok(())
    }

    /// offset に count バイトの隙間を挿入する
    ///
    /// 後続バイトは右にずれ、隙間はゼロ埋めされる。
    /// offset は有効サイズ以下であること。
    pub fn insert_space(&mut self, offset: usize, count: usize) -> Result<(), BufferError> {
        if offset > self.data.len() {
            return Err(BufferError::OutOfBounds(offset));
        }
        let new_len = self
            .data
            .len()
            .checked_add(count)
            .ok_or(BufferError::TooLarge)?;
        self.ensure_allocated(new_len)?;
        self.data.resize(new_len, 0);
        self.data[offset..].rotate_right(count);
        Ok(())
    }

    /// offset から count バイトを取り除き、削除したバイト数を返す
    ///
    /// count は残存サイズでクランプされる。
    pub fn remove_range(&mut self, offset: usize, count: usize) -> Result<usize, BufferError> {
        if offset > self.data.len() {
            return Err(BufferError::OutOfBounds(offset));
        }
        let count = count.min(self.data.len() - offset);
        self.data.drain(offset..offset + count);
        Ok(count)
    }
}

impl From<Vec<u8>> for ByteStore {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_valid_zero_fills() {
        let mut store = ByteStore::from(vec![0xAA, 0xBB]);
        store.ensure_valid(5).unwrap();
        assert_eq!(store.len(), 5);
        assert_eq!(store.as_slice(), &[0xAA, 0xBB, 0, 0, 0]);
    }

    #[test]
    fn ensure_valid_never_shrinks() {
        let mut store = ByteStore::from(vec![1, 2, 3]);
        store.ensure_valid(1).unwrap();
        assert_eq!(store.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn growth_reserves_padding() {
        let mut store = ByteStore::new();
        store.ensure_valid(1).unwrap();
        assert!(store.capacity() >= 1 + GROW_PADDING);
    }

    #[test]
    fn insert_space_shifts_and_zero_fills() {
        let mut store = ByteStore::from(vec![1, 2, 3, 4]);
        store.insert_space(1, 2).unwrap();
        assert_eq!(store.as_slice(), &[1, 0, 0, 2, 3, 4]);
    }

    #[test]
    fn insert_space_at_tail_appends() {
        let mut store = ByteStore::from(vec![1, 2]);
        store.insert_space(2, 3).unwrap();
        assert_eq!(store.as_slice(), &[1, 2, 0, 0, 0]);
    }

    #[test]
    fn insert_space_past_tail_fails() {
        let mut store = ByteStore::from(vec![1, 2]);
        assert!(matches!(
            store.insert_space(3, 1),
            Err(BufferError::OutOfBounds(3))
        ));
        assert_eq!(store.as_slice(), &[1, 2]);
    }

    #[test]
    fn overflow_fails_without_mutation() {
        let mut store = ByteStore::from(vec![1]);
        assert!(matches!(
            store.insert_space(0, usize::MAX),
            Err(BufferError::TooLarge)
        ));
        assert_eq!(store.as_slice(), &[1]);
    }

    #[test]
    fn remove_range_clamps_count() {
        let mut store = ByteStore::from(vec![1, 2, 3, 4]);
        let removed = store.remove_range(2, 10).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.as_slice(), &[1, 2]);
    }

    #[test]
    fn remove_range_shifts_left() {
        let mut store = ByteStore::from(vec![1, 2, 3, 4, 5]);
        store.remove_range(1, 2).unwrap();
        assert_eq!(store.as_slice(), &[1, 4, 5]);
    }
}
