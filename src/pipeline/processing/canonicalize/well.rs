/// Result of reconciling an API well number with its state and county codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WellIdOutcome {
    /// Digits 1-2 and 3-5 already agreed with state and county
    Matched(String),
    /// Agreement required restoring a dropped leading zero
    Padded(String),
    /// Neither form agreed; the raw ten-character prefix is used
    Fallback(String),
}

impl WellIdOutcome {
    pub fn well_id10(&self) -> &str {
        match self {
            WellIdOutcome::Matched(id) | WellIdOutcome::Padded(id) | WellIdOutcome::Fallback(id) => id,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, WellIdOutcome::Fallback(_))
    }
}

fn numeric_slice(s: &str, start: usize, end: usize) -> Option<u32> {
    let part = s.get(start..end)?;
    if part.chars().all(|c| c.is_ascii_digit()) {
        part.parse().ok()
    } else {
        None
    }
}

fn agrees_with_location(api: &str, state: Option<u32>, county: Option<u32>) -> bool {
    match (state, county) {
        (Some(state), Some(county)) => {
            numeric_slice(api, 0, 2) == Some(state) && numeric_slice(api, 2, 5) == Some(county)
        }
        _ => false,
    }
}

fn prefix10(api: &str) -> String {
    api.chars().take(10).collect()
}

/// Build the ten-character well identifier, restoring a leading zero that
/// numeric storage of single-digit state codes tends to drop.
pub fn reconcile_well_id(api_number: &str, state: Option<u32>, county: Option<u32>) -> WellIdOutcome {
    let api = api_number.trim();
    if agrees_with_location(api, state, county) {
        return WellIdOutcome::Matched(prefix10(api));
    }

    let padded = format!("0{}", api);
    if agrees_with_location(&padded, state, county) {
        return WellIdOutcome::Padded(prefix10(&padded));
    }

    WellIdOutcome::Fallback(prefix10(api))
}
