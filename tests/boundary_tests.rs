use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_repayment_truncates_to_base_unit() {
    let output_path = std::path::PathBuf::from("truncation_test.csv");
    let mut wtr = csv::Writer::from_path(&output_path).unwrap();
    wtr.write_record(["op", "caller", "loan", "value", "rate", "duration", "at"])
        .unwrap();

    // 3 base units at 33% owe 3.99 base units, truncated to 3.
    wtr.write_record(["request", "alice", "", "0.000000000000000003", "33", "60", "0"])
        .unwrap();
    wtr.write_record(["fund", "bob", "1", "0.000000000000000003", "", "", ""])
        .unwrap();
    wtr.write_record(["repay", "alice", "1", "0.000000000000000003", "", "", ""])
        .unwrap();
    wtr.flush().unwrap();
    drop(wtr);

    let mut cmd = Command::new(cargo_bin!("loanledger"));
    cmd.arg(&output_path);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "1,alice,bob,0.000000000000000003,33,60,true,true,repaid",
        ));

    std::fs::remove_file(output_path).ok();
}

#[test]
fn test_sub_unit_collateral_rejected() {
    let output_path = std::path::PathBuf::from("precision_test.csv");
    let mut wtr = csv::Writer::from_path(&output_path).unwrap();
    wtr.write_record(["op", "caller", "loan", "value", "rate", "duration", "at"])
        .unwrap();

    wtr.write_record(["request", "alice", "", "0.0000000000000000001", "1", "60", "0"])
        .unwrap();
    wtr.write_record(["request", "alice", "", "1", "1", "60", "0"])
        .unwrap();
    wtr.flush().unwrap();
    drop(wtr);

    let mut cmd = Command::new(cargo_bin!("loanledger"));
    cmd.arg(&output_path);

    // The rejected request does not consume an id.
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1,alice,,1,1,60,false,false,open"))
        .stdout(predicate::str::contains("\n2,").not());

    std::fs::remove_file(output_path).ok();
}

#[test]
fn test_due_date_overflow_rejected() {
    let output_path = std::path::PathBuf::from("overflow_test.csv");
    let mut wtr = csv::Writer::from_path(&output_path).unwrap();
    wtr.write_record(["op", "caller", "loan", "value", "rate", "duration", "at"])
        .unwrap();

    // u64::MAX = 18446744073709551615
    wtr.write_record(["request", "alice", "", "1", "1", "18446744073709551615", "10"])
        .unwrap();
    wtr.write_record(["request", "alice", "", "1", "4294967295", "0", "10"])
        .unwrap();
    wtr.flush().unwrap();
    drop(wtr);

    let mut cmd = Command::new(cargo_bin!("loanledger"));
    cmd.arg(&output_path);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("overflows the due date"))
        .stdout(predicate::str::contains("1,alice,,1,4294967295,10,false,false,open"));

    std::fs::remove_file(output_path).ok();
}
