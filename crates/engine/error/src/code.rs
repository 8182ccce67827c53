#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::IntoStaticStr,
    strum::FromRepr,
    strum_macros::EnumCount,
    strum::EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorCode {
    // Operation preparation phases
    OperationParsingError,
    OperationPlanningError,
    VariableError,
    // Field execution
    InvalidArgument,
    ResolverError,
    NonNullViolation,
    LeafSerializationError,
    AbstractTypeResolutionError,
    // least helpful
    InternalServerError,
}

impl ErrorCode {
    /// Errors raised before any field ran. The response has no `data` entry at all.
    pub fn is_request_error(self) -> bool {
        matches!(
            self,
            ErrorCode::OperationParsingError | ErrorCode::OperationPlanningError | ErrorCode::VariableError
        )
    }
}
