//! Store configuration

use std::collections::HashMap;
use std::path::PathBuf;

/// Environment variable holding the data directory
pub const DATA_DIR_ENV: &str = "AUDIOSHELF_DATA_DIR";

const BLOB_SCHEME_ENV: &str = "AUDIOSHELF_BLOB_SCHEME";
const BLOB_OPTION_PREFIX: &str = "AUDIOSHELF_BLOB_OPT_";

/// Where the Library Store keeps its catalog and blobs
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Directory holding `library.json` (and local uploads for the fs scheme)
    pub data_dir: PathBuf,

    /// OpenDAL scheme for the blob backend
    pub blob_scheme: String,

    /// Extra service options passed to OpenDAL (bucket, region, root, ...)
    pub blob_options: HashMap<String, String>,
}

impl StoreConfig {
    /// Local configuration: JSON catalog and filesystem blobs under `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            blob_scheme: "fs".to_string(),
            blob_options: HashMap::new(),
        }
    }

    /// Read configuration from `AUDIOSHELF_*` environment variables
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut config = Self::new("./audioshelf_data");
        for (key, value) in vars {
            if key == DATA_DIR_ENV {
                config.data_dir = PathBuf::from(value);
            } else if key == BLOB_SCHEME_ENV {
                config.blob_scheme = value.trim().to_lowercase();
            } else if let Some(option) = key.strip_prefix(BLOB_OPTION_PREFIX) {
                config.blob_options.insert(option.to_lowercase(), value);
            }
        }
        config
    }

    /// Path to the JSON catalog
    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join("library.json")
    }

    /// Default root for filesystem blobs
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    pub fn is_local(&self) -> bool {
        self.blob_scheme == "fs"
    }
}
