use serde::{Deserialize, Serialize};

/// Declared type of an extracted field. Numeric kinds are distinct so the
/// extractor knows whether "12" must stay an integer or may widen to a float.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Str,
    Int,
    Float,
    Date,
}

/// One declared field: output name (the key written into the document),
/// source UDF display name, expected type, presence requirement.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub udf: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, udf: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            udf,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, udf: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            udf,
            kind,
            required: false,
        }
    }
}

/// An ordered field schema for one UDF map. Schemas are concrete lists built
/// by concatenating named groups; later additions with the same output name
/// shadow earlier ones, so group order is the collision rule.
#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    fields: Vec<FieldSpec>,
}

impl FieldSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(mut self, fields: &[FieldSpec]) -> Self {
        for field in fields {
            self.fields.retain(|existing| existing.name != field.name);
            self.fields.push(field.clone());
        }
        self
    }

    pub fn field(self, field: FieldSpec) -> Self {
        self.group(std::slice::from_ref(&field))
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Shared field groups reused across workflow step schemas.
pub mod groups {
    use super::{FieldKind, FieldSpec};

    pub const CONCENTRATION: &[FieldSpec] = &[
        FieldSpec::required("concentration", "Concentration", FieldKind::Float),
        FieldSpec::optional("concentration_nm", "Concentration (nM)", FieldKind::Float),
    ];

    pub const VOLUMES: &[FieldSpec] = &[
        FieldSpec::required("sample_volume", "Sample Volume (ul)", FieldKind::Float),
        FieldSpec::optional("buffer_volume", "Volume Buffer (ul)", FieldKind::Float),
        FieldSpec::optional("total_volume", "Total Volume (ul)", FieldKind::Float),
    ];

    pub const AMOUNT: &[FieldSpec] = &[
        FieldSpec::required("amount_ng", "Amount (ng)", FieldKind::Float),
        FieldSpec::optional("amount_needed_ng", "Amount needed (ng)", FieldKind::Float),
    ];

    pub const INSTRUMENT: &[FieldSpec] = &[
        FieldSpec::optional("instrument", "Instrument", FieldKind::Str),
        FieldSpec::optional("method_document", "Method document", FieldKind::Str),
        FieldSpec::optional("lot_number", "Lot no: Kit", FieldKind::Str),
    ];

    pub const PCR: &[FieldSpec] = &[
        FieldSpec::required("pcr_cycles", "Nr of PCR cycles", FieldKind::Int),
        FieldSpec::optional("pcr_instrument", "PCR instrument incubation", FieldKind::Str),
    ];

    pub const LIBRARY_SIZE: &[FieldSpec] = &[
        FieldSpec::required("size_bp", "Size (bp)", FieldKind::Int),
        FieldSpec::optional("size_adjusted_bp", "Adjusted Size (bp)", FieldKind::Int),
    ];

    pub const HYBRIDIZATION: &[FieldSpec] = &[
        FieldSpec::required("bait_set", "Bait Set", FieldKind::Str),
        FieldSpec::optional("hybridization_time_h", "Hybridization time (h)", FieldKind::Float),
        FieldSpec::optional("blockers", "Blockers", FieldKind::Str),
    ];

    pub const SEQUENCING_RUN: &[FieldSpec] = &[
        FieldSpec::required("run_id", "Run ID", FieldKind::Str),
        FieldSpec::required("flow_cell_id", "Flow Cell ID", FieldKind::Str),
        FieldSpec::optional("flow_cell_mode", "Flow Cell Mode", FieldKind::Str),
        FieldSpec::optional("loading_concentration_pm", "Loading Concentration (pM)", FieldKind::Float),
    ];

    pub const RECEPTION: &[FieldSpec] = &[
        FieldSpec::optional("sample_received", "Received at", FieldKind::Date),
        FieldSpec::optional("lab_comment", "Comment", FieldKind::Str),
    ];
}
