//! Report accumulation and dispatch.

mod dispatcher;
mod html;
mod sink;

pub use dispatcher::{Dispatcher, format_cell, format_console};
pub use sink::{HtmlReport, MetricRow, RenderBlock, Section};
