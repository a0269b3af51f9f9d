//! Recovery engine (C8): MFT record fetch plus resident/non-resident data
//! reconstruction.

pub mod engine;

pub use engine::{
    fetch_file_record, recover_data_runs, recover_file_by_ref, recover_resident,
    ProgressCallback, RecoveryStage,
};
