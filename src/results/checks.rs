use serde::Serialize;

use super::{ResultTable, RowRecord, Scalar};

const BALANCE_TOLERANCE: f64 = 1e-3;

/// Per-branch power balance: the loss column should equal the sum of both end flows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchCheck {
    pub branch: String,
    pub p_check: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q_check: Option<bool>,
}

fn as_number(value: Option<&Scalar>) -> Option<f64> {
    match value? {
        Scalar::Number(n) => n.as_f64(),
        Scalar::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn has_columns(table: &ResultTable, names: &[&str; 3]) -> bool {
    names.iter().all(|n| table.headers.iter().any(|h| h == n))
}

fn balanced(row: &RowRecord, [ij, ji, loss]: &[&str; 3]) -> bool {
    match (
        as_number(row.get(*ij)),
        as_number(row.get(*ji)),
        as_number(row.get(*loss)),
    ) {
        (Some(ij), Some(ji), Some(loss)) => ((ij + ji) - loss).abs() < BALANCE_TOLERANCE,
        _ => false,
    }
}

fn endpoint(row: &RowRecord, key: &str) -> String {
    match row.get(key) {
        Some(Scalar::String(s)) => s.clone(),
        Some(Scalar::Null) | None => "?".to_string(),
        Some(other) => other.to_string(),
    }
}

/// Balance checks for every branch row; empty when the active power columns are absent.
pub fn branch_checks(branches: &ResultTable) -> Vec<BranchCheck> {
    const ACTIVE: [&str; 3] = ["Pij(MW)", "Pji(MW)", "Ploss(MW)"];
    const REACTIVE: [&str; 3] = ["Qij(MVar)", "Qji(MVar)", "Qloss(MVar)"];

    if !has_columns(branches, &ACTIVE) {
        return Vec::new();
    }
    let with_reactive = has_columns(branches, &REACTIVE);

    branches
        .rows
        .iter()
        .map(|row| BranchCheck {
            branch: format!("{}→{}", endpoint(row, "From bus"), endpoint(row, "To bus")),
            p_check: balanced(row, &ACTIVE),
            q_check: with_reactive.then(|| balanced(row, &REACTIVE)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(headers: &[&str], rows: Vec<serde_json::Value>) -> ResultTable {
        ResultTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .into_iter()
                .map(|r| r.as_object().cloned().unwrap())
                .collect(),
        }
    }

    #[test]
    fn test_balanced_and_unbalanced_branches() {
        let branches = table(
            &["From bus", "To bus", "Pij(MW)", "Pji(MW)", "Ploss(MW)"],
            vec![
                json!({"From bus": "bus1", "To bus": "bus4", "Pij(MW)": 71.64, "Pji(MW)": -71.64, "Ploss(MW)": 0.0}),
                json!({"From bus": "bus4", "To bus": "bus5", "Pij(MW)": "30.7", "Pji(MW)": -30.5, "Ploss(MW)": 0.3}),
            ],
        );
        let checks = branch_checks(&branches);
        assert_eq!(checks.len(), 2);
        assert_eq!(checks[0].branch, "bus1→bus4");
        assert!(checks[0].p_check);
        assert!(!checks[1].p_check);
        assert_eq!(checks[0].q_check, None);
    }

    #[test]
    fn test_reactive_check_when_columns_present() {
        let branches = table(
            &["Pij(MW)", "Pji(MW)", "Ploss(MW)", "Qij(MVar)", "Qji(MVar)", "Qloss(MVar)"],
            vec![json!({
                "Pij(MW)": 1.0, "Pji(MW)": -0.9, "Ploss(MW)": 0.1,
                "Qij(MVar)": 0.5, "Qji(MVar)": null, "Qloss(MVar)": 0.2
            })],
        );
        let checks = branch_checks(&branches);
        assert_eq!(checks[0].branch, "?→?");
        assert!(checks[0].p_check);
        assert_eq!(checks[0].q_check, Some(false));
    }

    #[test]
    fn test_no_checks_without_power_columns() {
        let buses = table(&["Bus", "Vm(pu)"], vec![json!({"Bus": "bus1", "Vm(pu)": 1.0})]);
        assert!(branch_checks(&buses).is_empty());
    }
}
