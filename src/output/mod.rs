pub mod bundle;
pub mod workbook;

pub use bundle::{bundle, bundle_filename, write_bundle};
pub use workbook::{render_workbook, Column, SheetLayout};
