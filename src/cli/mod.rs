pub mod report;
pub mod sync;
pub mod ui;
