//! hxedit - Hex edit widget engine for terminal UIs
//!
//! This library provides the HexEdit widget used by hxv and embeddable
//! in any ratatui-based host.

pub mod buffer;
pub mod layout;
pub mod ui;
pub mod widget;

pub use buffer::{BufferError, ByteStore};
pub use layout::{Cell, Geometry, OffsetWidth};
pub use ui::Palette;
pub use widget::{ConfigError, CursorPaint, CursorShape, HexEdit, Options};
