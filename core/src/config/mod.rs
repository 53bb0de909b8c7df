mod load;
mod types;

pub use load::{apply_env_overrides, config_file_path, load_default, load_from_file};
pub use types::*;
