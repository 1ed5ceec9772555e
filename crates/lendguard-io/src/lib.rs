//! File I/O for the lendguard command line: CSV datasets, JSON and list inputs,
//! training result artifacts and versioned model snapshots.

mod domain;
mod error;
mod json;
mod reader;
mod snapshot;
mod writer;

pub use domain::{ExperimentName, LabelledDataset, NumericTable};
pub use error::IoError;
pub use json::{read_json, read_lines};
pub use reader::DatasetReader;
pub use snapshot::{SNAPSHOT_FORMAT_VERSION, SnapshotStore};
pub use writer::{ResultWriter, TrainingReport};
