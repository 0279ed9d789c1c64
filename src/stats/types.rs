//! Query and result types for the affiliate stats endpoint

use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of stats, keyed by column name
pub type StatsRow = serde_json::Map<String, serde_json::Value>;

/// Fallback `range` when neither the response nor the query carries one
pub const UNKNOWN_RANGE: &str = "unknown";
/// Fallback `breakdown` when neither the response nor the query carries one
pub const DEFAULT_BREAKDOWN: &str = "none";

/// Reporting window
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Range {
    Today,
    Yesterday,
    Last7Days,
    Last30Days,
    ThisMonth,
    LastMonth,
    ThisYear,
    /// Any value the client does not know about, passed through verbatim
    Other(String),
}

impl Range {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::Last7Days => "last_7_days",
            Self::Last30Days => "last_30_days",
            Self::ThisMonth => "this_month",
            Self::LastMonth => "last_month",
            Self::ThisYear => "this_year",
            Self::Other(value) => value,
        }
    }
}

impl From<&str> for Range {
    fn from(value: &str) -> Self {
        match value {
            "today" => Self::Today,
            "yesterday" => Self::Yesterday,
            "last_7_days" => Self::Last7Days,
            "last_30_days" => Self::Last30Days,
            "this_month" => Self::ThisMonth,
            "last_month" => Self::LastMonth,
            "this_year" => Self::ThisYear,
            other => Self::Other(other.to_string()),
        }
    }
}

/// How rows are grouped
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Breakdown {
    None,
    Day,
    Month,
    Program,
    Other(String),
}

impl Breakdown {
    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "none",
            Self::Day => "day",
            Self::Month => "month",
            Self::Program => "program",
            Self::Other(value) => value,
        }
    }
}

impl From<&str> for Breakdown {
    fn from(value: &str) -> Self {
        match value {
            "none" => Self::None,
            "day" => Self::Day,
            "month" => Self::Month,
            "program" => Self::Program,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Affiliate program to report on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Program {
    Affiliate,
    Revshare,
    Ppv,
    Tokens,
    Other(String),
}

impl Program {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Affiliate => "affiliate",
            Self::Revshare => "revshare",
            Self::Ppv => "ppv",
            Self::Tokens => "tokens",
            Self::Other(value) => value,
        }
    }
}

impl From<&str> for Program {
    fn from(value: &str) -> Self {
        match value {
            "affiliate" => Self::Affiliate,
            "revshare" => Self::Revshare,
            "ppv" => Self::Ppv,
            "tokens" => Self::Tokens,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Breakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional filters for a stats request; unset fields are left out of the URL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsQuery {
    pub range: Option<Range>,
    pub breakdown: Option<Breakdown>,
    pub program: Option<Program>,
}

impl StatsQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn range(mut self, range: impl Into<Range>) -> Self {
        self.range = Some(range.into());
        self
    }

    pub fn breakdown(mut self, breakdown: impl Into<Breakdown>) -> Self {
        self.breakdown = Some(breakdown.into());
        self
    }

    pub fn program(mut self, program: impl Into<Program>) -> Self {
        self.program = Some(program.into());
        self
    }

    /// Query parameters for the set fields, in a stable order
    pub fn params(&self) -> Vec<(&'static str, &str)> {
        let mut params = Vec::with_capacity(3);
        if let Some(range) = &self.range {
            params.push(("range", range.as_str()));
        }
        if let Some(breakdown) = &self.breakdown {
            params.push(("breakdown", breakdown.as_str()));
        }
        if let Some(program) = &self.program {
            params.push(("program", program.as_str()));
        }
        params
    }
}

/// Normalized affiliate stats response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsResult {
    pub range: String,
    pub breakdown: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    /// Always populated, whichever field name the service used
    #[serde(default)]
    pub rows: Vec<StatsRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totals: Option<StatsRow>,
    /// Copy of the legacy `stats` field, present only when the service sent it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Vec<StatsRow>>,
}

/// Either response shape as sent by the service
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireStats {
    range: Option<String>,
    breakdown: Option<String>,
    program: Option<String>,
    columns: Option<Vec<String>>,
    rows: Option<Vec<StatsRow>>,
    totals: Option<StatsRow>,
    stats: Option<Vec<StatsRow>>,
}

impl StatsResult {
    /// Convert a decoded response body into the canonical shape.
    ///
    /// When `rows` is missing but the legacy `stats` field is present, `stats`
    /// becomes `rows` and is also kept as `stats`. Missing `range`, `breakdown`
    /// and `program` fall back to the request's query, then to fixed defaults.
    pub fn normalize(body: serde_json::Value, query: &StatsQuery) -> serde_json::Result<Self> {
        let wire: WireStats = serde_json::from_value(body)?;

        let range = wire
            .range
            .or_else(|| query.range.as_ref().map(|r| r.as_str().to_string()))
            .unwrap_or_else(|| UNKNOWN_RANGE.to_string());
        let breakdown = wire
            .breakdown
            .or_else(|| query.breakdown.as_ref().map(|b| b.as_str().to_string()))
            .unwrap_or_else(|| DEFAULT_BREAKDOWN.to_string());
        let program = wire
            .program
            .or_else(|| query.program.as_ref().map(|p| p.as_str().to_string()));

        let (rows, stats) = match (wire.rows, wire.stats) {
            (Some(rows), stats) => (rows, stats),
            (None, Some(legacy)) => (legacy.clone(), Some(legacy)),
            (None, None) => (Vec::new(), None),
        };

        Ok(Self {
            range,
            breakdown,
            program,
            columns: wire.columns.unwrap_or_default(),
            rows,
            totals: wire.totals,
            stats,
        })
    }

    /// Whether the service answered with the legacy `stats` shape
    pub fn is_legacy(&self) -> bool {
        self.stats.is_some()
    }
}
