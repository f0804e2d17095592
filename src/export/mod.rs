pub mod grid;
pub mod ics;

pub use grid::export_csv_workbook;
pub use ics::export_ics;
