/// Field metadata key naming the compression codec of a binary column
pub const KEY_COMPRESSION: &str = "lance-encoding:compression";

/// Field metadata key holding the compression level of a binary column
pub const KEY_COMPRESSION_LEVEL: &str = "lance-encoding:compression-level";

/// Default codec for binary columns
pub const DEFAULT_COMPRESSION_ALGO: &str = "zstd";

/// Default codec level for binary columns
pub const DEFAULT_COMPRESSION_LEVEL: &str = "22";

/// Element field name of list types
pub const LIST_ITEM_NAME: &str = "item";
