use super::{ResultTable, Scalar, TableKind};

/// UTF-8 byte-order mark so spreadsheet tools detect the encoding
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Render a cell; nulls and missing keys become empty fields.
fn field(value: Option<&Scalar>) -> String {
    match value {
        None | Some(Scalar::Null) => String::new(),
        Some(Scalar::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Serialize a result table to CSV, header row first, BOM-prefixed.
pub fn to_csv(table: &ResultTable) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());
    if !table.headers.is_empty() {
        writer.write_record(&table.headers)?;
        for row in &table.rows {
            writer.write_record(table.headers.iter().map(|h| field(row.get(h))))?;
        }
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Attachment filename: the last rid segment and the table name
pub fn csv_filename(rid: &str, table: TableKind) -> String {
    let stem = rid.rsplit('/').next().unwrap_or(rid);
    format!("{stem}_{table}.csv")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::RowRecord;
    use proptest::prelude::*;
    use serde_json::json;

    fn row(pairs: serde_json::Value) -> RowRecord {
        pairs.as_object().cloned().unwrap()
    }

    fn body(bytes: &[u8]) -> &str {
        assert!(bytes.starts_with(UTF8_BOM));
        std::str::from_utf8(&bytes[UTF8_BOM.len()..]).unwrap()
    }

    #[test]
    fn test_csv_header_and_rows() {
        let table = ResultTable {
            headers: vec!["Bus".into(), "Vm(pu)".into()],
            rows: vec![
                row(json!({"Bus": "bus1", "Vm(pu)": 1.04})),
                row(json!({"Bus": "bus2", "Vm(pu)": 1})),
            ],
        };
        let out = to_csv(&table).unwrap();
        assert_eq!(body(&out), "Bus,Vm(pu)\nbus1,1.04\nbus2,1\n");
    }

    #[test]
    fn test_csv_quotes_separators() {
        let table = ResultTable {
            headers: vec!["Name, full".into(), "Note".into()],
            rows: vec![row(json!({"Name, full": "a \"b\"", "Note": "x\ny"}))],
        };
        let out = to_csv(&table).unwrap();
        assert_eq!(body(&out), "\"Name, full\",Note\n\"a \"\"b\"\"\",\"x\ny\"\n");
    }

    #[test]
    fn test_csv_missing_key_and_null_render_empty() {
        let table = ResultTable {
            headers: vec!["A".into(), "B".into(), "C".into()],
            rows: vec![row(json!({"A": null, "C": false}))],
        };
        let out = to_csv(&table).unwrap();
        assert_eq!(body(&out), "A,B,C\n,,false\n");
    }

    #[test]
    fn test_csv_empty_table_is_bom_only() {
        let out = to_csv(&ResultTable::empty()).unwrap();
        assert_eq!(out, UTF8_BOM);
    }

    #[test]
    fn test_csv_filename() {
        assert_eq!(
            csv_filename("model/CloudPSS/IEEE3", TableKind::Buses),
            "IEEE3_buses.csv"
        );
        assert_eq!(csv_filename("IEEE39", TableKind::Branches), "IEEE39_branches.csv");
    }

    proptest! {
        #[test]
        fn prop_csv_round_trip(
            headers in prop::collection::vec("[a-zA-Z ,\"]{0,6}", 1..5),
            cells in prop::collection::vec(
                prop::collection::vec("[a-zA-Z0-9 ,\"\n]{0,8}", 5),
                0..6,
            ),
        ) {
            let headers: Vec<String> = headers
                .iter()
                .enumerate()
                .map(|(i, h)| format!("h{i}{h}"))
                .collect();
            let rows: Vec<RowRecord> = cells
                .iter()
                .map(|values| {
                    headers
                        .iter()
                        .zip(values)
                        .map(|(h, v)| (h.clone(), json!(v)))
                        .collect()
                })
                .collect();
            let table = ResultTable { headers: headers.clone(), rows };

            let out = to_csv(&table).unwrap();
            let mut reader = csv::Reader::from_reader(&out[UTF8_BOM.len()..]);

            let parsed_headers: Vec<String> =
                reader.headers().unwrap().iter().map(String::from).collect();
            prop_assert_eq!(&parsed_headers, &headers);

            let parsed_rows: Vec<Vec<String>> = reader
                .records()
                .map(|r| r.unwrap().iter().map(String::from).collect())
                .collect();
            let expected: Vec<Vec<String>> = cells
                .iter()
                .map(|values| values[..headers.len()].to_vec())
                .collect();
            prop_assert_eq!(parsed_rows, expected);
        }
    }
}
