pub mod parquet;
pub mod xlsx;

pub use self::parquet::{read_parquet, write_parquet};
pub use self::xlsx::{to_xlsx_bytes, write_xlsx, SHEET_NAME};
