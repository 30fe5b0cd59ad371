//! Tensor cell-type conversion for nearest-neighbor search (spec §6).
//!
//! "Query tensor type must be assignable to attribute's cell type;
//! implicit conversions: `int8 -> bfloat16 -> float -> double` only." The
//! chain is one-directional and total-ordered, so conversion is just
//! "does `from`'s position in the chain come at or before `to`'s."

use crate::error::DispatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CellType {
    Int8,
    BFloat16,
    Float,
    Double,
}

impl CellType {
    /// The implicit widening chain, narrowest first.
    const CHAIN: [CellType; 4] = [CellType::Int8, CellType::BFloat16, CellType::Float, CellType::Double];

    fn rank(self) -> usize {
        Self::CHAIN.iter().position(|c| *c == self).expect("CHAIN is exhaustive")
    }

    /// Converts a single value from this cell type to `to`, widening only.
    /// Narrowing (e.g. `double -> float`) is not an implicit conversion
    /// and is rejected, matching the one-directional chain in spec §6.
    pub fn convert_value(self, value: f64, to: CellType) -> Result<f64, DispatchError> {
        if self.rank() > to.rank() {
            return Err(DispatchError::UnsupportedCellConversion {
                from: format!("{self:?}"),
                to: format!("{to:?}"),
            });
        }
        Ok(value)
    }

    pub fn can_convert_to(self, to: CellType) -> bool {
        self.rank() <= to.rank()
    }
}

/// Converts a query tensor's cells to the attribute's expected cell type.
/// Spec §4.4: "Convert the query tensor's cell type to the attribute's
/// expected cell type exactly once at blueprint construction" — callers
/// should invoke this once and cache the result, not per-candidate.
pub fn convert_tensor(values: &[f64], from: CellType, to: CellType) -> Result<Vec<f64>, DispatchError> {
    if !from.can_convert_to(to) {
        return Err(DispatchError::UnsupportedCellConversion {
            from: format!("{from:?}"),
            to: format!("{to:?}"),
        });
    }
    Ok(values.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widening_chain_is_allowed() {
        assert!(CellType::Int8.can_convert_to(CellType::BFloat16));
        assert!(CellType::Int8.can_convert_to(CellType::Double));
        assert!(CellType::BFloat16.can_convert_to(CellType::Float));
    }

    #[test]
    fn narrowing_is_rejected() {
        assert!(!CellType::Double.can_convert_to(CellType::Float));
        assert!(!CellType::Float.can_convert_to(CellType::Int8));
    }

    #[test]
    fn same_type_converts_trivially() {
        assert!(CellType::Float.can_convert_to(CellType::Float));
        assert_eq!(convert_tensor(&[1.0, 2.0], CellType::Float, CellType::Float).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn rejects_unsupported_narrowing_conversion() {
        let result = convert_tensor(&[1.0], CellType::Double, CellType::Int8);
        assert!(result.is_err());
    }
}
