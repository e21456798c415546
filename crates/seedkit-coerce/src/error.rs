use thiserror::Error;

/// Errors while converting a fixture value into its native form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    #[error("Unsupported column type: {0}")]
    UnsupportedType(String),

    #[error("Cannot coerce {value_type} value {value} to {target}")]
    Mismatch {
        value: String,
        value_type: &'static str,
        target: String,
    },

    #[error("Cannot parse {value:?} as {target}: {reason}")]
    Parse {
        value: String,
        target: String,
        reason: String,
    },

    #[error("Value {value} cannot be represented as {target} without losing precision")]
    PrecisionLoss { value: String, target: String },

    #[error("Table {table} has no column {column}")]
    UnknownColumn { table: String, column: String },

    #[error("Column {table}.{column}: {source}")]
    Column {
        table: String,
        column: String,
        #[source]
        source: Box<CoercionError>,
    },
}

impl CoercionError {
    /// The error without any column context
    pub fn root(&self) -> &CoercionError {
        match self {
            CoercionError::Column { source, .. } => source.root(),
            other => other,
        }
    }
}
