pub mod compositor;
pub mod line_store;
pub mod metric;
pub mod pixel;
pub mod skew;
pub mod stream;
pub mod sync;
pub mod window;
