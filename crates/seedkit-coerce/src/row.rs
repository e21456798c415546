use crate::{CoercionError, coerce};
use seedkit_core::{FixtureRow, NativeRow, Table};

/// Coerce every value of a fixture row for its column in `table`.
///
/// Columns the row leaves out are left out of the result as well, so the
/// backend applies its own default. A column the table does not have is an
/// error.
pub fn coerce_row(table: &Table, row: &FixtureRow) -> Result<NativeRow, CoercionError> {
    row.iter()
        .map(|(name, value)| {
            let column = table
                .column(name)
                .ok_or_else(|| CoercionError::UnknownColumn {
                    table: table.name.clone(),
                    column: name.clone(),
                })?;

            let native = coerce(&column.kind, value).map_err(|e| CoercionError::Column {
                table: table.name.clone(),
                column: name.clone(),
                source: Box::new(e),
            })?;

            Ok((name.clone(), native))
        })
        .collect()
}

/// Coerce a batch of rows for one table, stopping at the first failure
pub fn coerce_rows(table: &Table, rows: &[FixtureRow]) -> Result<Vec<NativeRow>, CoercionError> {
    let coerced = rows
        .iter()
        .map(|row| coerce_row(table, row))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::trace!(table = %table.name, rows = coerced.len(), "coerced rows");
    Ok(coerced)
}
