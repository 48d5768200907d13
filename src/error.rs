use thiserror::Error;

/// Non-fatal conditions surfaced to the host instead of being logged or
/// thrown. The referencing entry is dropped and processing continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    #[error("card template {id} not found in catalog")]
    MissingTemplate { id: u32 },

    #[error("location {location_id} references missing action card {card_id}")]
    MissingAction { location_id: u32, card_id: u32 },

    #[error("unknown attribute '{name}' in template {id}")]
    UnknownAttribute { id: u32, name: String },

    /// Unknown effect kinds cover unknown statuses too: statuses are
    /// effect kinds in template data.
    #[error("unknown effect kind '{kind}' in template {id}")]
    UnknownEffect { id: u32, kind: String },

    #[error("malformed record under key '{key}'")]
    MalformedRecord { key: String },

    #[error("record '{key}' references card {guid} which is not in the inventory")]
    MissingCard { key: String, guid: String },
}
