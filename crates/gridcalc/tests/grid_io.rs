//! Tests for reading and writing grid files

use gridcalc::prelude::*;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_json_round_trip() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.json");
    fs::write(
        &input,
        r#"{
            "columns": [
                {"key": "id", "title": "ID", "editable": false},
                {"key": "A", "title": "Price"},
                {"key": "B", "title": "Qty"},
                {"key": "C", "title": "Total"}
            ],
            "data": [
                {"id": 1, "A": 2.5, "B": "4", "C": "=A1*B1"},
                {"id": 2, "A": null, "B": "x", "C": "=SUM(C1,A2)"}
            ]
        }"#,
    )
    .unwrap();

    let grid = Grid::open(&input).unwrap();
    assert_eq!(grid.col_count(), 3);
    assert_eq!(grid.get("A1").unwrap(), Some("2.5"));
    assert_eq!(grid.get("A2").unwrap(), Some(""));

    let evaluation = grid.calculate().unwrap();
    let output = dir.path().join("output.json");
    evaluation.grid.save(&output).unwrap();

    let reopened = Grid::open(&output).unwrap();
    assert_eq!(reopened.get("C1").unwrap(), Some("10"));
    assert_eq!(reopened.get("C2").unwrap(), Some("10"));
    assert_eq!(reopened.columns()[1].title, "Price");
}

#[test]
fn test_csv_round_trip() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.csv");
    fs::write(&input, "id,Hours,Rate,Pay\n1,8,12.5,=A1*B1\n2,6,15,=A2*B2\n").unwrap();

    let evaluation = Grid::open(&input).unwrap().calculate().unwrap();
    let output = dir.path().join("output.csv");
    evaluation.grid.save(&output).unwrap();

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "id,Hours,Rate,Pay\n1,8,12.5,100\n2,6,15,90\n"
    );
}

#[test]
fn test_malformed_documents_fail() {
    let dir = TempDir::new().unwrap();

    let not_array = dir.path().join("bad.json");
    fs::write(&not_array, r#"{"columns": [{"key": "A"}], "data": {"A": "1"}}"#).unwrap();
    assert!(Grid::open(&not_array).is_err());

    let duplicate = dir.path().join("dup.json");
    fs::write(
        &duplicate,
        r#"{"columns": [{"key": "A"}, {"key": "A"}], "data": []}"#,
    )
    .unwrap();
    let err = Grid::open(&duplicate).unwrap_err();
    assert!(err.to_string().contains("Duplicate column key"));

    let unknown = dir.path().join("grid.xlsx");
    fs::write(&unknown, "").unwrap();
    assert!(Grid::open(&unknown).is_err());
}
