
use serde::Serialize;
use std::path::Path;

/// The token count of a compact record line
const COMPACT_FIELD_COUNT: usize = 13;
/// The token count of a full record line
const FULL_FIELD_COUNT: usize = 19;

/// Orientation of a sequence in an alignment, relative to the way it was stored
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, strum_macros::Display, strum_macros::EnumString)]
pub enum Strand {
    #[strum(to_string = "+")]
    Forward,
    #[strum(to_string = "-")]
    Reverse
}

/// The two fixed layouts an alignment report can use.
/// Schema is a closed tag, the per-schema record types carry the fields.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, strum_macros::Display, strum_macros::EnumString)]
pub enum ReportSchema {
    /// 13-column summary layout, conventionally a `.m1` file
    #[strum(to_string = "m1", serialize = "M1")]
    Compact,
    /// 19-column layout including alignment strings, conventionally a `.m5` file
    #[strum(to_string = "m5", serialize = "M5")]
    Full
}

impl ReportSchema {
    /// First token of a header line; lines starting with this are metadata, not records
    pub const HEADER_TOKEN: &'static str = "qname";

    /// Infers the schema from a report filename extension, `None` if unrecognized
    pub fn from_path(path: &Path) -> Option<ReportSchema> {
        let extension = path.extension()?.to_str()?;
        match extension.to_ascii_lowercase().as_str() {
            "m1" => Some(ReportSchema::Compact),
            "m5" => Some(ReportSchema::Full),
            _ => None
        }
    }

    /// The number of whitespace-delimited tokens a record line must have
    pub fn field_count(self) -> usize {
        match self {
            ReportSchema::Compact => COMPACT_FIELD_COUNT,
            ReportSchema::Full => FULL_FIELD_COUNT
        }
    }

    /// The space-joined field names written as the report header line
    pub fn header_line(self) -> &'static str {
        match self {
            ReportSchema::Compact =>
                "qname tname qstrand tstrand score pctsimilarity tstart tend tlength qstart qend qlength ncells",
            ReportSchema::Full =>
                "qname qlength qstart qend qstrand tname tlength tstart tend tstrand score nmat nmis nins ndel mapqv qstring astring tstring"
        }
    }
}

/// One line of a compact report; field order matches the serialized layout
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompactRecord {
    pub qname: String,
    pub tname: String,
    pub qstrand: Strand,
    pub tstrand: Strand,
    pub score: i64,
    pub pctsimilarity: f64,
    pub tstart: u64,
    pub tend: u64,
    pub tlength: u64,
    pub qstart: u64,
    pub qend: u64,
    pub qlength: u64,
    pub ncells: u64
}

/// One line of a full report; field order matches the serialized layout
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FullRecord {
    pub qname: String,
    pub qlength: u64,
    pub qstart: u64,
    pub qend: u64,
    pub qstrand: Strand,
    pub tname: String,
    pub tlength: u64,
    pub tstart: u64,
    pub tend: u64,
    pub tstrand: Strand,
    pub score: i64,
    pub nmat: u64,
    pub nmis: u64,
    pub nins: u64,
    pub ndel: u64,
    pub mapqv: u32,
    pub qstring: String,
    pub astring: String,
    pub tstring: String
}

/// One aligned query/target pair from either report layout.
/// The accessors cover the fields shared by both layouts, which is all the
/// downstream grouping and selection logic needs.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum AlignmentRecord {
    Compact(CompactRecord),
    Full(FullRecord)
}

impl AlignmentRecord {
    pub fn schema(&self) -> ReportSchema {
        match self {
            AlignmentRecord::Compact(_) => ReportSchema::Compact,
            AlignmentRecord::Full(_) => ReportSchema::Full
        }
    }

    pub fn qname(&self) -> &str {
        match self {
            AlignmentRecord::Compact(record) => &record.qname,
            AlignmentRecord::Full(record) => &record.qname
        }
    }

    pub fn tname(&self) -> &str {
        match self {
            AlignmentRecord::Compact(record) => &record.tname,
            AlignmentRecord::Full(record) => &record.tname
        }
    }

    pub fn qstrand(&self) -> Strand {
        match self {
            AlignmentRecord::Compact(record) => record.qstrand,
            AlignmentRecord::Full(record) => record.qstrand
        }
    }

    pub fn tstrand(&self) -> Strand {
        match self {
            AlignmentRecord::Compact(record) => record.tstrand,
            AlignmentRecord::Full(record) => record.tstrand
        }
    }

    /// The mismatch count of the alignment; only the full layout carries one
    pub fn mismatch_count(&self) -> Option<u64> {
        match self {
            AlignmentRecord::Compact(_) => None,
            AlignmentRecord::Full(record) => Some(record.nmis)
        }
    }

    /// Serializes the record back into a report line, fields in layout order
    pub fn to_report_line(&self) -> String {
        match self {
            AlignmentRecord::Compact(r) => format!(
                "{} {} {} {} {} {} {} {} {} {} {} {} {}",
                r.qname, r.tname, r.qstrand, r.tstrand, r.score, r.pctsimilarity,
                r.tstart, r.tend, r.tlength, r.qstart, r.qend, r.qlength, r.ncells
            ),
            AlignmentRecord::Full(r) => format!(
                "{} {} {} {} {} {} {} {} {} {} {} {} {} {} {} {} {} {} {}",
                r.qname, r.qlength, r.qstart, r.qend, r.qstrand, r.tname, r.tlength,
                r.tstart, r.tend, r.tstrand, r.score, r.nmat, r.nmis, r.nins, r.ndel,
                r.mapqv, r.qstring, r.astring, r.tstring
            )
        }
    }
}
