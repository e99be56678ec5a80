use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("vaspay"));
    cmd.arg("tests/fixtures/ops.jsonl");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "user_id,balance,currency,total_credited,total_debited,transactions,frozen",
        ))
        // User 1: funded 1500, transferred 500 out; purchase attempt was
        // rejected on the PIN and left the balance alone.
        .stdout(predicate::str::contains(
            "11111111-1111-1111-1111-111111111111,1000,NGN,1500,500,2,false",
        ))
        // User 2: funded 500, received 500, then frozen.
        .stdout(predicate::str::contains(
            "22222222-2222-2222-2222-222222222222,1000,NGN,1000,0,2,true",
        ))
        // The wrong-PIN purchase surfaces as a per-operation error line.
        .stderr(predicate::str::contains("Error processing operation"));

    Ok(())
}

#[test]
fn test_cli_reports_malformed_lines_and_continues() -> Result<(), Box<dyn std::error::Error>> {
    use std::io::Write;
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(
        file,
        "{{\"op\":\"register\",\"user_id\":\"33333333-3333-3333-3333-333333333333\",\"kyc_level\":2}}"
    )?;
    writeln!(file, "this is not json")?;
    writeln!(
        file,
        "{{\"op\":\"fund\",\"user_id\":\"33333333-3333-3333-3333-333333333333\",\"amount\":250}}"
    )?;

    let mut cmd = Command::new(cargo_bin!("vaspay"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error reading operation"))
        .stdout(predicate::str::contains(
            "33333333-3333-3333-3333-333333333333,250,NGN,250,0,1,false",
        ));

    Ok(())
}
