//! Schema alignment - picks the columns both tables share

use std::collections::HashSet;

use arrow::datatypes::{DataType, Schema};

use crate::error::{ReconcileError, Result};

/// A column that participates in the row comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonColumn {
    pub name: String,
    pub data_type: DataType,
}

/// Names present in both schemas, in the left schema's order.
///
/// Fails with [`ReconcileError::NoOverlappingColumns`] when nothing is shared.
pub fn align(left: &Schema, right: &Schema) -> Result<Vec<String>> {
    let shared: Vec<String> = left
        .fields()
        .iter()
        .filter(|field| right.field_with_name(field.name()).is_ok())
        .map(|field| field.name().clone())
        .collect();

    if shared.is_empty() {
        return Err(ReconcileError::NoOverlappingColumns);
    }
    Ok(shared)
}

/// Resolve the comparison column set and check declared types agree.
///
/// `requested` overrides the aligner. Requested names must exist on both sides;
/// duplicates are dropped keeping the first occurrence.
pub fn resolve_columns(
    left: &Schema,
    right: &Schema,
    requested: Option<&[String]>,
) -> Result<Vec<ComparisonColumn>> {
    let names = match requested {
        Some(names) => {
            let mut seen = HashSet::new();
            let names: Vec<String> = names
                .iter()
                .filter(|name| seen.insert(*name))
                .cloned()
                .collect();
            if names.is_empty() {
                return Err(ReconcileError::NoOverlappingColumns);
            }
            names
        }
        None => align(left, right)?,
    };

    names
        .into_iter()
        .map(|name| {
            let left_type = lookup(left, &name, "left")?;
            let right_type = lookup(right, &name, "right")?;
            if left_type != right_type {
                return Err(ReconcileError::ColumnTypeMismatch {
                    column: name,
                    left: left_type.clone(),
                    right: right_type.clone(),
                });
            }
            Ok(ComparisonColumn {
                name,
                data_type: left_type.clone(),
            })
        })
        .collect()
}

fn lookup<'a>(schema: &'a Schema, name: &str, side: &'static str) -> Result<&'a DataType> {
    schema
        .field_with_name(name)
        .map(|field| field.data_type())
        .map_err(|_| ReconcileError::ColumnNotFound {
            column: name.to_string(),
            side,
        })
}
