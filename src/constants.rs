//! Fixed vocabulary shared across the pipeline phases.

/// Marker written into blank identity fields by the canonicalizer.
/// Distinct from [`UNRESOLVED_CAS`]: the field was absent, not unrecognised.
pub const EMPTY_ENTRY: &str = "_empty_entry_";

/// `canonical_cas` value for identifiers that miss the reference vocabulary.
pub const UNRESOLVED_CAS: &str = "unresolved";

/// Registry number of the default carrier fluid.
pub const WATER_CAS: &str = "7732-18-5";

/// Mass per unit volume of the carrier fluid (pounds per gallon).
pub const CARRIER_DENSITY: f64 = 8.3;

/// Purposes at or above this length are composite cells, never carrier markers.
pub const CARRIER_PURPOSE_MAX_LEN: usize = 50;

/// Base of the legacy quality-code string; tag codes are appended after it.
pub const QUALITY_CODE_BASE: &str = "0";

/// Separator between legacy quality codes.
pub const QUALITY_CODE_DELIMITER: char = '-';

/// Default environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "CHEM_DISCLOSURE_CONFIG";
