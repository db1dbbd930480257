//! Build parameters and buildset overrides
//!
//! Two independent layering systems live here:
//! - Global build parameters: built-in defaults → parameters file → CLI flags
//! - Per-buildset overrides: `configs.ini` defaults scopes → named sections

mod defaults;
mod merge;
mod overrides;
mod params;
mod value;

pub use defaults::{
    BuiltinDefaults, DEFAULT_ARCHIVE_ROOT, DEFAULT_BUILD_ROOT, DEFAULT_CONFIG_ROOT,
    DEFAULT_PARAMS_FILE,
};
pub use merge::{deep_merge, merge_layers};
pub use overrides::{
    apply_overrides, MergeOutcome, OverrideError, OverrideSource, KEY_DRY_RUN, KEY_ENABLED,
    KEY_GOOD,
};
pub use params::{BuildParams, EffectiveParams, ParamsError, ParamsOrigin, ParamsSource};
pub use value::{parse_override_value, CompareOp, OverrideValue, ValueError};

use sha2::{Digest, Sha256};

/// Hex SHA-256 of raw file bytes, used for provenance
pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
