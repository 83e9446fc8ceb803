mod html;
pub mod views;

pub use html::render_document;
pub use views::ReportView;
