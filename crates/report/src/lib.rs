//! `medstock-report`: stock and movement reports.
//!
//! Consumes ledger snapshots (never the database) and renders fixed-layout
//! tables to PDF.

pub mod movements;
pub mod pdf;
pub mod stock;
pub mod table;

use thiserror::Error;

pub use movements::movement_table;
pub use pdf::render_pdf;
pub use stock::{InputLine, MedicineLine, ReportKind, input_lines, medicine_lines, stock_table};
pub use table::{ReportTable, format_date};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("unknown report kind '{0}'")]
    UnknownKind(String),

    #[error("pdf rendering failed: {0}")]
    Pdf(String),
}
