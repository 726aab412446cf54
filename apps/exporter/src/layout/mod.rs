// Layout: static font metrics + the flow engine that gives a Surface its height.
// Layout is pure and cheap next to painting; only capture moves it onto spawn_blocking.

pub mod flow;
pub mod font_metrics;

pub use flow::layout_surface;
pub use font_metrics::FontFamily;
