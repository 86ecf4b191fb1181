//! Error code catalog
//!
//! Maps gateway fault codes to human-readable descriptions for
//! notification decoration. Loaded once, read-only.

/// Description used when a code is missing from the catalog, so that
/// decoration never aborts on an unrecognized code.
pub const UNKNOWN_CODE_TEXT: &str = "unknown code";

const ERROR_CODES: &[(&str, &str)] = &[
    ("E02", "low pressure in brine circuit"),
    ("E05", "high pressure switch tripped"),
    ("E10", "outdoor temperature sensor failure"),
    ("E21", "supply temperature sensor failure"),
    ("E22", "return temperature sensor failure"),
    ("E24", "flow switch open, check circulation pump"),
    ("E31", "hot water temperature sensor failure"),
    ("E41", "compressor temperature too high"),
    ("E71", "inverter communication lost"),
    ("E96", "gateway lost contact with the heat pump"),
    ("W01", "water pressure low, refill the system"),
    ("W03", "compressor start limit reached"),
];

/// Look up the description for a fault code
pub fn lookup(code: &str) -> Option<&'static str> {
    ERROR_CODES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, description)| *description)
}

/// Description for a code, falling back to the sentinel text
pub fn describe(code: &str) -> &'static str {
    lookup(code).unwrap_or(UNKNOWN_CODE_TEXT)
}
