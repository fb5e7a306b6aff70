pub mod config;
pub mod paths;

pub use config::{
    load_config, AdjustDirection, AlgorithmConfig, MemoryAdjust, PipelineConfig, ProgramField,
    ResourceConfig,
};
pub use paths::expand_path;
