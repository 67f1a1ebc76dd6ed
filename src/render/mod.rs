// Rendering of a synthesized timeline
//
// `layout` turns the timeline into rows of column cells: every activity gets
// a column from the moment it starts until the first instant after it ends,
// and freed columns are reused. `format` prints those rows, plus the ranked
// "longest activities" report, with optional ANSI colours.

mod format;
mod layout;

pub use format::{use_colour, RenderOptions, Renderer};
pub use layout::{layout, Cell, Row};
