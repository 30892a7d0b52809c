/// Plain-text report and artifact rendering
pub mod renderer;

pub use renderer::{
    render_activity_log, render_errwarn_log, status_line, truncate_text, DisplayCaps,
    ReportRenderer,
};
