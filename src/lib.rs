//! Turn cumulative meter-reading exports into per-interval consumption.
//!
//! The pipeline is `load_table` → `remove_water_columns` → `derive_consumption`,
//! wrapped by [`process`].

pub mod config;
pub mod consumption;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod process;

pub use config::PipelineConfig;
pub use consumption::{ConsumptionRecord, ConsumptionTable, DeviceVisibility, RecordFilter};
pub use error::PipelineError;
pub use pipeline::{process, process_with};
pub use process::{derive_consumption, load_table, remove_water_columns, RawTable};
