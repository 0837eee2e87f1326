//! CAS registry number cleanup and leading-zero repair.
//!
//! A well-formed registry number is `NNNNNNN-NN-N`: a first segment of 2 to 7
//! digits without a leading zero, a two-digit middle segment and a single
//! check digit that matches the weighted digit sum.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_CAS_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9-]").expect("valid CAS cleanup pattern"));

static CAS_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([1-9][0-9]{1,6})-([0-9]{2})-([0-9])$").expect("valid CAS shape pattern")
});

/// Drop everything except digits and hyphens
pub fn clean_cas(raw: &str) -> String {
    NON_CAS_CHARS.replace_all(raw, "").into_owned()
}

/// Shape and check digit both hold
pub fn is_well_formed(cas: &str) -> bool {
    let Some(caps) = CAS_SHAPE.captures(cas) else {
        return false;
    };
    let body = format!("{}{}", &caps[1], &caps[2]);
    let Some(check) = caps[3].chars().next().and_then(|c| c.to_digit(10)) else {
        return false;
    };
    let weighted: u32 = body
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, d)| (i as u32 + 1) * d)
        .sum();
    weighted % 10 == check
}

/// Repair the two zero slips seen in disclosure text: padding zeros in
/// front of the first segment, and a middle segment that lost its leading
/// zero. The repaired form is used only if it is well formed; otherwise the
/// input comes back unchanged. Never fails.
pub fn correct_zeros(cleaned: &str) -> String {
    if is_well_formed(cleaned) {
        return cleaned.to_string();
    }

    let segments: Vec<&str> = cleaned.split('-').collect();
    let [first, middle, check] = segments.as_slice() else {
        return cleaned.to_string();
    };
    if [first, middle, check]
        .iter()
        .any(|seg| seg.is_empty() || !seg.chars().all(|c| c.is_ascii_digit()))
    {
        return cleaned.to_string();
    }

    let first = first.trim_start_matches('0');
    let candidate = if middle.len() == 1 {
        format!("{}-0{}-{}", first, middle, check)
    } else {
        format!("{}-{}-{}", first, middle, check)
    };

    if is_well_formed(&candidate) {
        candidate
    } else {
        cleaned.to_string()
    }
}

/// Clean then zero-correct raw CAS text
pub fn canonicalize_cas(raw: &str) -> String {
    correct_zeros(&clean_cas(raw))
}
