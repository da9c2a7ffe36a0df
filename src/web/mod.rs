//! 浏览器适配层：DOM 展示、点击输入与计时器。

pub mod app;
pub mod dom;

pub use app::{mount, MemoryApp};
pub use dom::{document, DomPresenter, WebError};
