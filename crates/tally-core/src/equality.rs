//! Null-safe column equality
//!
//! Compares two columns position by position and produces a boolean column
//! without nulls. The truth table per position is:
//!
//! | left        | right       | result            |
//! |-------------|-------------|-------------------|
//! | null        | null        | true              |
//! | null        | value       | false             |
//! | NaN         | NaN         | true              |
//! | NaN         | number      | false             |
//! | value       | value       | `left == right`   |
//!
//! Floats that are not NaN compare with IEEE equality, so `0.0 == -0.0`.

use arrow::array::{Array, ArrayAccessor, AsArray, BooleanArray};
use arrow::buffer::BooleanBuffer;
use arrow::compute::cast;
use arrow::datatypes::*;

use crate::error::{ReconcileError, Result};

macro_rules! primitive_eq {
    ($left:expr, $right:expr, $t:ty) => {
        eq_by(
            $left.as_primitive::<$t>(),
            $right.as_primitive::<$t>(),
            |a, b| a == b,
        )
    };
}

macro_rules! float_eq {
    ($left:expr, $right:expr, $t:ty) => {
        eq_by(
            $left.as_primitive::<$t>(),
            $right.as_primitive::<$t>(),
            |a, b| match (a.is_nan(), b.is_nan()) {
                (true, true) => true,
                (false, false) => a == b,
                _ => false,
            },
        )
    };
}

/// Compare two columns of the same declared type.
///
/// `column` only labels errors. Both arrays must have the same type and length.
pub fn column_eq(column: &str, left: &dyn Array, right: &dyn Array) -> Result<BooleanArray> {
    if left.data_type() != right.data_type() {
        return Err(ReconcileError::ColumnTypeMismatch {
            column: column.to_string(),
            left: left.data_type().clone(),
            right: right.data_type().clone(),
        });
    }
    if left.len() != right.len() {
        return Err(ReconcileError::ColumnLengthMismatch {
            column: column.to_string(),
            left: left.len(),
            right: right.len(),
        });
    }

    let result = match left.data_type() {
        DataType::Null => BooleanArray::new(BooleanBuffer::new_set(left.len()), None),
        DataType::Boolean => eq_by(left.as_boolean(), right.as_boolean(), |a, b| a == b),

        DataType::Int8 => primitive_eq!(left, right, Int8Type),
        DataType::Int16 => primitive_eq!(left, right, Int16Type),
        DataType::Int32 => primitive_eq!(left, right, Int32Type),
        DataType::Int64 => primitive_eq!(left, right, Int64Type),
        DataType::UInt8 => primitive_eq!(left, right, UInt8Type),
        DataType::UInt16 => primitive_eq!(left, right, UInt16Type),
        DataType::UInt32 => primitive_eq!(left, right, UInt32Type),
        DataType::UInt64 => primitive_eq!(left, right, UInt64Type),

        DataType::Float16 => float_eq!(left, right, Float16Type),
        DataType::Float32 => float_eq!(left, right, Float32Type),
        DataType::Float64 => float_eq!(left, right, Float64Type),

        DataType::Decimal128(_, _) => primitive_eq!(left, right, Decimal128Type),
        DataType::Decimal256(_, _) => primitive_eq!(left, right, Decimal256Type),

        DataType::Date32 => primitive_eq!(left, right, Date32Type),
        DataType::Date64 => primitive_eq!(left, right, Date64Type),
        DataType::Time32(TimeUnit::Second) => primitive_eq!(left, right, Time32SecondType),
        DataType::Time32(TimeUnit::Millisecond) => {
            primitive_eq!(left, right, Time32MillisecondType)
        }
        DataType::Time64(TimeUnit::Microsecond) => {
            primitive_eq!(left, right, Time64MicrosecondType)
        }
        DataType::Time64(TimeUnit::Nanosecond) => {
            primitive_eq!(left, right, Time64NanosecondType)
        }
        DataType::Timestamp(TimeUnit::Second, _) => {
            primitive_eq!(left, right, TimestampSecondType)
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            primitive_eq!(left, right, TimestampMillisecondType)
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            primitive_eq!(left, right, TimestampMicrosecondType)
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            primitive_eq!(left, right, TimestampNanosecondType)
        }
        DataType::Duration(TimeUnit::Second) => primitive_eq!(left, right, DurationSecondType),
        DataType::Duration(TimeUnit::Millisecond) => {
            primitive_eq!(left, right, DurationMillisecondType)
        }
        DataType::Duration(TimeUnit::Microsecond) => {
            primitive_eq!(left, right, DurationMicrosecondType)
        }
        DataType::Duration(TimeUnit::Nanosecond) => {
            primitive_eq!(left, right, DurationNanosecondType)
        }

        DataType::Utf8 => eq_by(left.as_string::<i32>(), right.as_string::<i32>(), |a, b| {
            a == b
        }),
        DataType::LargeUtf8 => {
            eq_by(left.as_string::<i64>(), right.as_string::<i64>(), |a, b| a == b)
        }
        DataType::Utf8View => eq_by(left.as_string_view(), right.as_string_view(), |a, b| a == b),
        DataType::Binary => eq_by(left.as_binary::<i32>(), right.as_binary::<i32>(), |a, b| {
            a == b
        }),
        DataType::LargeBinary => {
            eq_by(left.as_binary::<i64>(), right.as_binary::<i64>(), |a, b| a == b)
        }
        DataType::BinaryView => eq_by(left.as_binary_view(), right.as_binary_view(), |a, b| a == b),
        DataType::FixedSizeBinary(_) => eq_by(
            left.as_fixed_size_binary(),
            right.as_fixed_size_binary(),
            |a, b| a == b,
        ),

        // Decode to the value type; a dictionary null and a null value both read as null.
        DataType::Dictionary(_, value_type) => {
            let unsupported = || ReconcileError::UnsupportedType {
                column: column.to_string(),
                data_type: left.data_type().clone(),
            };
            if !is_supported(value_type) {
                return Err(unsupported());
            }
            let left = cast(left, value_type).map_err(|_| unsupported())?;
            let right = cast(right, value_type).map_err(|_| unsupported())?;
            return column_eq(column, left.as_ref(), right.as_ref());
        }

        other => {
            return Err(ReconcileError::UnsupportedType {
                column: column.to_string(),
                data_type: other.clone(),
            })
        }
    };

    Ok(result)
}

/// Whether [`column_eq`] can compare columns of this type.
pub fn is_supported(data_type: &DataType) -> bool {
    match data_type {
        DataType::Dictionary(_, value_type) => is_supported(value_type),
        DataType::Time32(unit) => matches!(unit, TimeUnit::Second | TimeUnit::Millisecond),
        DataType::Time64(unit) => matches!(unit, TimeUnit::Microsecond | TimeUnit::Nanosecond),
        DataType::Null
        | DataType::Boolean
        | DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Float16
        | DataType::Float32
        | DataType::Float64
        | DataType::Decimal128(_, _)
        | DataType::Decimal256(_, _)
        | DataType::Date32
        | DataType::Date64
        | DataType::Timestamp(_, _)
        | DataType::Duration(_)
        | DataType::Utf8
        | DataType::LargeUtf8
        | DataType::Utf8View
        | DataType::Binary
        | DataType::LargeBinary
        | DataType::BinaryView
        | DataType::FixedSizeBinary(_) => true,
        _ => false,
    }
}

fn eq_by<A, F>(left: A, right: A, value_eq: F) -> BooleanArray
where
    A: ArrayAccessor,
    F: Fn(A::Item, A::Item) -> bool,
{
    let values = BooleanBuffer::collect_bool(left.len(), |i| {
        match (left.is_valid(i), right.is_valid(i)) {
            (false, false) => true,
            (true, true) => value_eq(left.value(i), right.value(i)),
            _ => false,
        }
    });
    BooleanArray::new(values, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{
        DictionaryArray, Float64Array, Int32Array, Int64Array, ListArray, StringArray,
        TimestampMillisecondArray,
    };
    use std::sync::Arc;

    fn bools(result: &BooleanArray) -> Vec<bool> {
        assert_eq!(result.null_count(), 0);
        result.values().iter().collect()
    }

    #[test]
    fn test_integers_with_nulls() {
        let left = Int64Array::from(vec![Some(1), None, Some(3), None, Some(5)]);
        let right = Int64Array::from(vec![Some(1), None, Some(4), Some(4), None]);
        let result = column_eq("n", &left, &right).unwrap();
        assert_eq!(bools(&result), vec![true, true, false, false, false]);
    }

    #[test]
    fn test_float_null_nan_truth_table() {
        let left = Float64Array::from(vec![
            None,
            None,
            Some(f64::NAN),
            Some(f64::NAN),
            Some(1.5),
            Some(1.5),
            Some(f64::NAN),
        ]);
        let right = Float64Array::from(vec![
            None,
            Some(f64::NAN),
            Some(f64::NAN),
            Some(1.5),
            Some(1.5),
            Some(2.5),
            None,
        ]);
        let result = column_eq("x", &left, &right).unwrap();
        assert_eq!(
            bools(&result),
            vec![true, false, true, false, true, false, false]
        );
    }

    #[test]
    fn test_float_signed_zero_is_equal() {
        let left = Float64Array::from(vec![0.0]);
        let right = Float64Array::from(vec![-0.0]);
        let result = column_eq("x", &left, &right).unwrap();
        assert_eq!(bools(&result), vec![true]);
    }

    #[test]
    fn test_strings() {
        let left = StringArray::from(vec![Some("a"), Some("b"), None, Some("")]);
        let right = StringArray::from(vec![Some("a"), Some("B"), None, None]);
        let result = column_eq("s", &left, &right).unwrap();
        assert_eq!(bools(&result), vec![true, false, true, false]);
    }

    #[test]
    fn test_booleans() {
        let left = BooleanArray::from(vec![Some(true), Some(false), None]);
        let right = BooleanArray::from(vec![Some(true), Some(true), None]);
        let result = column_eq("b", &left, &right).unwrap();
        assert_eq!(bools(&result), vec![true, false, true]);
    }

    #[test]
    fn test_timestamps_with_timezone() {
        let left = TimestampMillisecondArray::from(vec![Some(1_000), None])
            .with_timezone("UTC");
        let right = TimestampMillisecondArray::from(vec![Some(1_000), None])
            .with_timezone("UTC");
        let result = column_eq("ts", &left, &right).unwrap();
        assert_eq!(bools(&result), vec![true, true]);
    }

    #[test]
    fn test_dictionary_columns_compare_values() {
        // Same values, different dictionaries.
        let left: DictionaryArray<Int32Type> =
            vec![Some("x"), None, Some("y"), Some("z")].into_iter().collect();
        let right: DictionaryArray<Int32Type> =
            vec![Some("x"), None, Some("z"), Some("z")].into_iter().collect();
        let result = column_eq("d", &left, &right).unwrap();
        assert_eq!(bools(&result), vec![true, true, false, true]);
    }

    #[test]
    fn test_null_type_column() {
        let left = arrow::array::NullArray::new(3);
        let right = arrow::array::NullArray::new(3);
        let result = column_eq("n", &left, &right).unwrap();
        assert_eq!(bools(&result), vec![true, true, true]);
    }

    #[test]
    fn test_type_mismatch_is_rejected() {
        let left = Int64Array::from(vec![1]);
        let right = Float64Array::from(vec![1.0]);
        let err = column_eq("v", &left, &right).unwrap_err();
        assert!(matches!(err, ReconcileError::ColumnTypeMismatch { .. }));
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let left = Int64Array::from(vec![1, 2]);
        let right = Int64Array::from(vec![1]);
        let err = column_eq("v", &left, &right).unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::ColumnLengthMismatch { left: 2, right: 1, .. }
        ));
    }

    #[test]
    fn test_unsupported_type() {
        let left = ListArray::from_iter_primitive::<Int32Type, _, _>(vec![Some(vec![Some(1)])]);
        let right = ListArray::from_iter_primitive::<Int32Type, _, _>(vec![Some(vec![Some(1)])]);
        let err = column_eq("l", &left, &right).unwrap_err();
        assert!(matches!(err, ReconcileError::UnsupportedType { .. }));
    }

    #[test]
    fn test_dictionary_of_unsupported_values_names_column() {
        let values = ListArray::from_iter_primitive::<Int32Type, _, _>(vec![Some(vec![Some(1)])]);
        let keys = Int32Array::from(vec![0, 0]);
        let left = DictionaryArray::try_new(keys.clone(), Arc::new(values.clone())).unwrap();
        let right = DictionaryArray::try_new(keys, Arc::new(values)).unwrap();

        let err = column_eq("tags", &left, &right).unwrap_err();
        match err {
            ReconcileError::UnsupportedType { column, data_type } => {
                assert_eq!(column, "tags");
                assert!(matches!(data_type, DataType::Dictionary(_, _)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_is_supported() {
        assert!(is_supported(&DataType::Int64));
        assert!(is_supported(&DataType::Dictionary(
            Box::new(DataType::Int32),
            Box::new(DataType::Utf8)
        )));
        assert!(!is_supported(&DataType::Time32(TimeUnit::Nanosecond)));
        assert!(!is_supported(&DataType::Dictionary(
            Box::new(DataType::Int32),
            Box::new(DataType::new_list(DataType::Int32, true))
        )));
    }

    #[test]
    fn test_sliced_arrays_respect_offsets() {
        let left = Int64Array::from(vec![Some(9), None, Some(2)]);
        let right = Int64Array::from(vec![Some(0), None, Some(2)]);
        let result = column_eq("n", &left.slice(1, 2), &right.slice(1, 2)).unwrap();
        assert_eq!(bools(&result), vec![true, true]);
    }
}
