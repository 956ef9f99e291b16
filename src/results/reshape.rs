use super::{HeaderNormalizer, RawColumnTable, ResultTable, RowRecord, Scalar};

/// Converts column-major runner tables into row-oriented display tables
#[derive(Debug, Clone, Default)]
pub struct TableReshaper {
    normalizer: HeaderNormalizer,
}

impl TableReshaper {
    pub fn new(normalizer: HeaderNormalizer) -> Self {
        Self { normalizer }
    }

    /// Reshape one raw table.
    ///
    /// Row count comes from the first column. Two columns aliasing to the same
    /// header collapse into one: the header keeps its first position and the later
    /// column's values win. Scalars are carried through untouched, nulls included.
    pub fn reshape(&self, table: &RawColumnTable) -> ResultTable {
        if table.columns.is_empty() {
            return ResultTable::empty();
        }

        let row_count = table.row_count();
        let column_headers: Vec<String> = table
            .columns
            .iter()
            .map(|c| self.normalizer.alias(&c.name))
            .collect();

        let mut headers: Vec<String> = Vec::with_capacity(column_headers.len());
        for header in &column_headers {
            if !headers.contains(header) {
                headers.push(header.clone());
            }
        }

        let rows = (0..row_count)
            .map(|i| {
                let mut row = RowRecord::new();
                for (header, column) in column_headers.iter().zip(&table.columns) {
                    let value = column.data.get(i).cloned().unwrap_or(Scalar::Null);
                    row.insert(header.clone(), value);
                }
                row
            })
            .collect();

        ResultTable { headers, rows }
    }
}
