//! Fixed per-source confidence values, with optional caller overrides.
//!
//! Flat confidence numbers per source rather than an adaptive weighted
//! score, so unlike a general-purpose forensic confidence model this module
//! is intentionally two tiny functions: one call site each instead of the
//! value being inlined as a magic number wherever a candidate is
//! constructed.

pub const USN_CONFIDENCE: u8 = 25;
pub const RECYCLE_BIN_WITH_DATA_CONFIDENCE: u8 = 94;
pub const RECYCLE_BIN_MISSING_DATA_CONFIDENCE: u8 = 10;

/// Per-source confidence overrides, set via `EngineConfig.confidence_overrides`.
/// Every field defaults to the fixed value above when left unset.
#[derive(Debug, Clone, Default)]
pub struct ConfidenceOverrides {
    pub usn: Option<u8>,
    pub recycle_bin_with_data: Option<u8>,
    pub recycle_bin_missing_data: Option<u8>,
}

pub fn confidence_for_usn(overrides: Option<&ConfidenceOverrides>) -> u8 {
    overrides.and_then(|o| o.usn).unwrap_or(USN_CONFIDENCE)
}

pub fn confidence_for_recycle_bin(has_data_file: bool, overrides: Option<&ConfidenceOverrides>) -> u8 {
    if has_data_file {
        overrides
            .and_then(|o| o.recycle_bin_with_data)
            .unwrap_or(RECYCLE_BIN_WITH_DATA_CONFIDENCE)
    } else {
        overrides
            .and_then(|o| o.recycle_bin_missing_data)
            .unwrap_or(RECYCLE_BIN_MISSING_DATA_CONFIDENCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_values_match_spec() {
        assert_eq!(confidence_for_usn(None), 25);
        assert_eq!(confidence_for_recycle_bin(true, None), 94);
        assert_eq!(confidence_for_recycle_bin(false, None), 10);
    }

    #[test]
    fn overrides_take_precedence() {
        let overrides = ConfidenceOverrides {
            usn: Some(40),
            recycle_bin_with_data: Some(99),
            recycle_bin_missing_data: None,
        };
        assert_eq!(confidence_for_usn(Some(&overrides)), 40);
        assert_eq!(confidence_for_recycle_bin(true, Some(&overrides)), 99);
        assert_eq!(confidence_for_recycle_bin(false, Some(&overrides)), 10);
    }
}
