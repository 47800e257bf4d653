use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const ROSTER: &str = "cognome;nome;codice_fiscale;email\n\
                      Rossi;Mario;RSSMRA80A01H501U;mario@example.it\n\
                      De Luca;Giuseppe;;giuseppe@example.it\n\
                      Verdi;Giuseppe;VRDGPP70C15L219C;verdi@example.it\n";

fn recipient_page(tax_code: &str, surname: &str, given_name: &str) -> String {
    format!(
        "CERTIFICAZIONE UNICA 2025\n\
         DATI RELATIVI AL DIPENDENTE\n\
         Codice fiscale {}\n\
         Cognome o Denominazione {}\n\
         Nome {}\n",
        tax_code, surname, given_name
    )
}

/// Four pages: Rossi (pages 1-2), De Luca (pages 3-4, second page repeats the header).
fn write_batch(dir: &Path) -> PathBuf {
    let pages = [
        recipient_page("RSSMRA80A01H501U", "ROSSI", "MARIO"),
        "Quadro 2\n".to_string(),
        recipient_page("DLCGPP75B10F839P", "DE LUCA", "GIUSEPPE"),
        "CERTIFICAZIONE UNICA 2025\nDATI RELATIVI AL DIPENDENTE\nCodice fiscale DLCGPP75B10F839P\n"
            .to_string(),
    ];
    let path = dir.join("cu_2025.txt");
    fs::write(&path, pages.join("\u{000c}")).unwrap();
    path
}

fn write_roster(dir: &Path) -> PathBuf {
    let path = dir.join("anagrafica.csv");
    fs::write(&path, ROSTER).unwrap();
    path
}

/// Command isolated from the user's configuration directory.
fn cusplit(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("cusplit").unwrap();
    cmd.env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("HOME", home.path())
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_split_text_report() {
    let dir = TempDir::new().unwrap();
    let input = write_batch(dir.path());

    cusplit(&dir)
        .arg("split")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 records in 4 pages (3 headers)"))
        .stdout(predicate::str::contains("CU2025_Rossi_Mario_RSSMRA80A01H501U.pdf"))
        .stdout(predicate::str::contains("CU2025_Deluca_Giuseppe_DLCGPP75B10F839P.pdf"));
}

#[test]
fn test_split_report_names_homonyms_uniquely() {
    let dir = TempDir::new().unwrap();
    let pages = [
        recipient_page("RSSMRA80A01H501U", "ROSSI", "MARIO"),
        recipient_page("BNCLRA85M41F205X", "BIANCHI", "LAURA"),
        recipient_page("RSSMRA80A01H501U", "ROSSI", "MARIO"),
    ];
    let input = dir.path().join("omonimi.txt");
    fs::write(&input, pages.join("\u{000c}")).unwrap();

    cusplit(&dir)
        .arg("split")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 records in 3 pages"))
        .stdout(predicate::str::contains("CU2025_Rossi_Mario_RSSMRA80A01H501U.pdf\n"))
        .stdout(predicate::str::contains("CU2025_Rossi_Mario_RSSMRA80A01H501U_2.pdf"));

    let output = cusplit(&dir)
        .args(["split", "--format", "csv"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());
    let csv = String::from_utf8(output.stdout).unwrap();
    let files: Vec<&str> = csv
        .lines()
        .skip(1)
        .filter_map(|line| line.rsplit(',').next())
        .collect();
    assert_eq!(
        files,
        vec![
            "CU2025_Rossi_Mario_RSSMRA80A01H501U.pdf",
            "CU2025_Bianchi_Laura_BNCLRA85M41F205X.pdf",
            "CU2025_Rossi_Mario_RSSMRA80A01H501U_2.pdf",
        ]
    );
}

#[test]
fn test_split_json_report() {
    let dir = TempDir::new().unwrap();
    let input = write_batch(dir.path());

    let output = cusplit(&dir)
        .args(["split", "--format", "json"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let records = json["records"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["start_page"], 2);
    assert_eq!(records[1]["end_page"], 3);
    assert_eq!(records[1]["surname"], "DE LUCA");
    assert!(records[0].get("raw_text").is_none());
}

#[test]
fn test_split_without_merge() {
    let dir = TempDir::new().unwrap();
    let input = write_batch(dir.path());

    cusplit(&dir)
        .args(["split", "--no-merge"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 records in 4 pages"));
}

#[test]
fn test_split_missing_input() {
    let dir = TempDir::new().unwrap();

    cusplit(&dir)
        .args(["split", "does-not-exist.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_match_json_report() {
    let dir = TempDir::new().unwrap();
    let input = write_batch(dir.path());
    let roster = write_roster(dir.path());

    let output = cusplit(&dir)
        .args(["match", "--format", "json"])
        .arg(&input)
        .arg(&roster)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);

    assert_eq!(results[0]["status"], "matched");
    assert_eq!(results[0]["method"], "tax code");
    assert_eq!(results[0]["score"], 100);
    assert_eq!(results[0]["email"], "mario@example.it");

    assert_eq!(results[1]["status"], "matched");
    assert_eq!(results[1]["method"], "name (fuzzy)");
    assert_eq!(results[1]["email"], "giuseppe@example.it");

    assert_eq!(results[2]["status"], "roster_unmatched");
    assert_eq!(results[2]["record"]["start_page"], -1);
    assert_eq!(results[2]["record"]["surname"], "VERDI");
}

#[test]
fn test_match_counts_on_stderr() {
    let dir = TempDir::new().unwrap();
    let input = write_batch(dir.path());
    let roster = write_roster(dir.path());

    cusplit(&dir)
        .args(["match", "--format", "csv"])
        .arg(&input)
        .arg(&roster)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("index,status,pages"))
        .stderr(predicate::str::contains("3 roster entries"));
}

#[test]
fn test_match_rejects_bad_threshold() {
    let dir = TempDir::new().unwrap();
    let input = write_batch(dir.path());
    let roster = write_roster(dir.path());

    cusplit(&dir)
        .args(["match", "--threshold", "150"])
        .arg(&input)
        .arg(&roster)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Threshold must be between 0 and 100"));
}

#[test]
fn test_mail_writes_manifest() {
    let dir = TempDir::new().unwrap();
    let input = write_batch(dir.path());
    let roster = write_roster(dir.path());
    let out = dir.path().join("out");

    cusplit(&dir)
        .arg("mail")
        .arg(&input)
        .arg(&roster)
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Prepared 2 messages"));

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("deliveries.json")).unwrap()).unwrap();
    let deliveries = manifest["deliveries"].as_array().unwrap();
    assert_eq!(deliveries.len(), 2);
    assert_eq!(deliveries[0]["to"], "mario@example.it");
    assert_eq!(deliveries[0]["subject"], "Certificazione Unica 2025");
    assert_eq!(
        deliveries[0]["attachment"],
        "CU2025_Rossi_Mario_RSSMRA80A01H501U.pdf"
    );
    assert!(
        deliveries[1]["body"]
            .as_str()
            .unwrap()
            .contains("Gentile Giuseppe De Luca")
    );
}

#[test]
fn test_mail_custom_subject() {
    let dir = TempDir::new().unwrap();
    let input = write_batch(dir.path());
    let roster = write_roster(dir.path());
    let out = dir.path().join("out");

    cusplit(&dir)
        .arg("mail")
        .arg(&input)
        .arg(&roster)
        .arg("-o")
        .arg(&out)
        .args(["--subject", "CU {anno} per {cognome}"])
        .assert()
        .success();

    let manifest = fs::read_to_string(out.join("deliveries.json")).unwrap();
    assert!(manifest.contains("CU 2025 per Rossi"));
}

#[test]
fn test_config_enables_compact_names() {
    let dir = TempDir::new().unwrap();
    let input = write_batch(dir.path());
    let roster = dir.path().join("anagrafica_compatta.csv");
    fs::write(&roster, ROSTER.replace("De Luca;", "Deluca;")).unwrap();

    let output = cusplit(&dir)
        .args(["match", "--format", "json"])
        .arg(&input)
        .arg(&roster)
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["results"][1]["status"], "record_unmatched");

    let config = dir.path().join("compact.json");
    fs::write(&config, r#"{"matching": {"threshold": 90, "compact_names": true}}"#).unwrap();

    let output = cusplit(&dir)
        .arg("--config")
        .arg(&config)
        .args(["match", "--format", "json"])
        .arg(&input)
        .arg(&roster)
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["threshold"], 90);
    assert_eq!(json["results"][1]["status"], "matched");
    assert_eq!(json["results"][1]["method"], "name (fuzzy)");

    cusplit(&dir)
        .arg("--config")
        .arg(&config)
        .arg("match")
        .arg(&input)
        .arg(&roster)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "giuseppe@example.it (name (fuzzy), 100) ~ DELUCA GIUSEPPE",
        ));
}

#[test]
fn test_config_init_set_get() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("cusplit.json");

    cusplit(&dir)
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .success();
    assert!(config.exists());

    cusplit(&dir)
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "matching.threshold", "90"])
        .assert()
        .success();

    cusplit(&dir)
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "matching.threshold"])
        .assert()
        .success()
        .stdout(predicate::str::contains("90"));

    cusplit(&dir)
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "matching.threshold", "300"])
        .assert()
        .failure();

    cusplit(&dir)
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "matching.nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}

#[test]
fn test_config_path() {
    let dir = TempDir::new().unwrap();

    cusplit(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cusplit"))
        .stdout(predicate::str::contains("not created"));
}

#[test]
fn test_batch_summary() {
    let dir = TempDir::new().unwrap();
    write_batch(dir.path());
    fs::write(dir.path().join("empty.txt"), "nessuna intestazione").unwrap();
    let out = dir.path().join("out");
    let pattern = format!("{}/*.txt", dir.path().display());

    cusplit(&dir)
        .args(["batch", &pattern, "--summary", "--output-dir"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed 2 files (2 records)"));

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.starts_with("filename,status,pages,records"));
    assert!(summary.contains("cu_2025.txt,success,4,2"));
    assert!(out.join("cu_2025").join("records.json").exists());
}
