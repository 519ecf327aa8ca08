use crate::data::Fields;
use crate::error::{Result, ShapeError};
use crate::ir::FieldMode;

/// Decide how a result can be presented from its field metadata alone.
pub fn classify(fields: &Fields) -> Result<FieldMode> {
    match (fields.dimensions.is_empty(), fields.measures.is_empty()) {
        (true, true) => Err(ShapeError::malformed(
            "result has neither dimensions nor measures",
        )),
        (true, false) => Ok(FieldMode::MeasuresOnly),
        (false, true) => Ok(FieldMode::DimensionsOnly),
        (false, false) => Ok(FieldMode::Mixed),
    }
}
