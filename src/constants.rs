/// Decimal precision for derived prices and percentages
pub const DECIMAL_PRECISION: u32 = 4;

/// Fallback currency when an import row leaves the field blank
pub const DEFAULT_CURRENCY: &str = "USD";

/// Provenance tag for rows created by the file importer
pub const IMPORT_PLATFORM: &str = "Delta Import";

/// Provenance tag for rows entered by hand
pub const MANUAL_PLATFORM: &str = "Manual Entry";

/// Currency pairs reconciled on every batch run
pub const DEFAULT_FX_PAIRS: [(&str, &str); 2] = [("USD", "CLP"), ("EUR", "USD")];

/// Maximum number of row-level parse errors echoed to the log
pub const MAX_LOGGED_PARSE_ERRORS: usize = 10;

/// Price fetch retry attempts per ticker
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Base backoff delay in milliseconds (doubles per attempt)
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;

/// Pause between consecutive ticker fetches in milliseconds
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 500;
