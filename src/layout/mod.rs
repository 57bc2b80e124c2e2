//! 列レイアウトと座標変換（純粋関数）

mod geometry;
mod motion;

pub use geometry::{Cell, Geometry, OffsetWidth};
