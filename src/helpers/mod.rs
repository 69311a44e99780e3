pub mod pdf;
pub mod slots;
pub mod spreadsheet;
pub mod workweek;
