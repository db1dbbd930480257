//! Built-in build parameter defaults (layer 1)

use serde::{Deserialize, Serialize};

/// Default relative directory holding `.bset` descriptors
pub const DEFAULT_CONFIG_ROOT: &str = "config";

/// Default relative build-output directory
pub const DEFAULT_BUILD_ROOT: &str = "build";

/// Default relative directory for `.tar.bz2` archives
pub const DEFAULT_ARCHIVE_ROOT: &str = "tar";

/// Default parameters file looked up in the top directory
pub const DEFAULT_PARAMS_FILE: &str = "rsb-pkg.toml";

/// Built-in default values for every global build parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Configuration root, relative to top (default: "config")
    pub config_root: String,

    /// Build-output root, relative to top (default: "build")
    pub build_root: String,

    /// Archive root, relative to top (default: "tar")
    pub archive_root: String,

    /// Install prefix passed to the builder (default: "/usr/local")
    pub prefix: String,

    /// Set builder command (default: "source-builder/sb-set-builder")
    pub builder: String,

    /// Suppress installing into the prefix (default: false)
    pub no_install: bool,

    /// Global dry-run (default: false)
    pub dry_run: bool,

    /// Release version label (default: "6")
    pub version: String,

    /// Revision used by `version` predicates (default: "0")
    pub revision: String,

    /// Whether this is a released source tree (default: false)
    pub released: bool,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            config_root: DEFAULT_CONFIG_ROOT.to_string(),
            build_root: DEFAULT_BUILD_ROOT.to_string(),
            archive_root: DEFAULT_ARCHIVE_ROOT.to_string(),
            prefix: "/usr/local".to_string(),
            builder: "source-builder/sb-set-builder".to_string(),
            no_install: false,
            dry_run: false,
            version: "6".to_string(),
            revision: "0".to_string(),
            released: false,
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "config_root": self.config_root,
            "build_root": self.build_root,
            "archive_root": self.archive_root,
            "prefix": self.prefix,
            "builder": self.builder,
            "builder_opts": [],
            "no_install": self.no_install,
            "dry_run": self.dry_run,
            "version": self.version,
            "revision": self.revision,
            "released": self.released,
            "spec_overrides": [],
            "catalog": []
        })
    }
}
