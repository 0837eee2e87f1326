use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::{QUALITY_CODE_BASE, QUALITY_CODE_DELIMITER};

/// Independent data-quality facts accumulated on a record by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityTag {
    /// Event has header data but no ingredient detail
    EmptyEvent,
    /// Another event shares this event's well and job date
    DuplicateEvent,
    /// Identity withheld as a trade secret
    ProprietaryClaim,
    /// Identity masked by a placeholder, quantity reported
    MaskedWithQuantity,
    /// Identity masked by a placeholder, no quantity reported
    MaskedNoQuantity,
    /// Canonical identifier found in the reference vocabulary
    CasPerfectMatch,
    /// Duplicate produced by source-format conversion
    RedundantRecord,
    /// Event percent total lies within the acceptance window
    PercentSumValid,
    /// Record received a back-calculated mass
    MassInferred,
    /// Event carrier percent lies within the apportionment window
    InToleranceRange,
}

impl QualityTag {
    pub const ALL: [QualityTag; 10] = [
        QualityTag::EmptyEvent,
        QualityTag::DuplicateEvent,
        QualityTag::ProprietaryClaim,
        QualityTag::MaskedWithQuantity,
        QualityTag::MaskedNoQuantity,
        QualityTag::CasPerfectMatch,
        QualityTag::RedundantRecord,
        QualityTag::PercentSumValid,
        QualityTag::MassInferred,
        QualityTag::InToleranceRange,
    ];

    fn bit(self) -> u16 {
        1 << (self as u16)
    }

    /// Single-character code used by existing downstream consumers
    pub fn code(self) -> char {
        match self {
            QualityTag::EmptyEvent => '1',
            QualityTag::DuplicateEvent => '2',
            QualityTag::ProprietaryClaim => '3',
            QualityTag::MaskedWithQuantity => '4',
            QualityTag::MaskedNoQuantity => '5',
            QualityTag::CasPerfectMatch => 'P',
            QualityTag::RedundantRecord => 'R',
            QualityTag::PercentSumValid => '%',
            QualityTag::MassInferred => 'M',
            QualityTag::InToleranceRange => 'A',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.code() == code)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QualityTag::EmptyEvent => "EMPTY_EVENT",
            QualityTag::DuplicateEvent => "DUPLICATE_EVENT",
            QualityTag::ProprietaryClaim => "PROPRIETARY_CLAIM",
            QualityTag::MaskedWithQuantity => "MASKED_WITH_QUANTITY",
            QualityTag::MaskedNoQuantity => "MASKED_NO_QUANTITY",
            QualityTag::CasPerfectMatch => "CAS_PERFECT_MATCH",
            QualityTag::RedundantRecord => "REDUNDANT_RECORD",
            QualityTag::PercentSumValid => "PERCENT_SUM_VALID",
            QualityTag::MassInferred => "MASS_INFERRED",
            QualityTag::InToleranceRange => "IN_TOLERANCE_RANGE",
        }
    }
}

impl fmt::Display for QualityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only set of [`QualityTag`]s, backed by a bitset.
///
/// Serializes to the legacy code string: `0` followed by `-<code>` for each
/// member, codes in ASCII order (`0-%-A-M-P`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TagSet(u16);

const DISQUALIFYING: [QualityTag; 5] = [
    QualityTag::RedundantRecord,
    QualityTag::EmptyEvent,
    QualityTag::DuplicateEvent,
    QualityTag::MaskedWithQuantity,
    QualityTag::MaskedNoQuantity,
];

impl TagSet {
    pub fn new() -> Self {
        Self(0)
    }

    /// Add a tag; returns true when it was not already present.
    pub fn insert(&mut self, tag: QualityTag) -> bool {
        let added = !self.contains(tag);
        self.0 |= tag.bit();
        added
    }

    pub fn contains(&self, tag: QualityTag) -> bool {
        self.0 & tag.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_superset_of(&self, other: &TagSet) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn iter(&self) -> impl Iterator<Item = QualityTag> + '_ {
        QualityTag::ALL.into_iter().filter(move |tag| self.contains(*tag))
    }

    /// Identity established (matched or explicitly proprietary) and no
    /// disqualifying condition present.
    pub fn is_usable(&self) -> bool {
        let identified = self.contains(QualityTag::CasPerfectMatch)
            || self.contains(QualityTag::ProprietaryClaim);
        identified && !DISQUALIFYING.iter().any(|tag| self.contains(*tag))
    }

    pub fn to_code_string(&self) -> String {
        let mut codes: Vec<char> = self.iter().map(QualityTag::code).collect();
        codes.sort_unstable();
        let mut out = String::from(QUALITY_CODE_BASE);
        for code in codes {
            out.push(QUALITY_CODE_DELIMITER);
            out.push(code);
        }
        out
    }
}

impl FromIterator<QualityTag> for TagSet {
    fn from_iter<I: IntoIterator<Item = QualityTag>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_code_string())
    }
}

impl FromStr for TagSet {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = s.trim().split(QUALITY_CODE_DELIMITER);
        match parts.next() {
            Some(base) if base == QUALITY_CODE_BASE => {}
            _ => return Err(format!("quality code '{}' must start with '{}'", s, QUALITY_CODE_BASE)),
        }
        let mut set = TagSet::new();
        for part in parts {
            let mut chars = part.chars();
            let tag = match (chars.next(), chars.next()) {
                (Some(code), None) => QualityTag::from_code(code),
                _ => None,
            }
            .ok_or_else(|| format!("unknown quality code '{}' in '{}'", part, s))?;
            set.insert(tag);
        }
        Ok(set)
    }
}

impl Serialize for TagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_code_string())
    }
}

impl<'de> Deserialize<'de> for TagSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
