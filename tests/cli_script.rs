use assert_cmd::Command;
use predicates::str::contains;
use regex::Regex;
use tempfile::TempDir;

fn shop_cli(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("shop_cli").unwrap();
    cmd.env("SHOP_CLI_SCRIPT", "1")
        .env("BARBERSHOP_HOME", home.path())
        .env_remove("SHOP_CLI_USER")
        .env_remove("RUST_LOG");
    cmd
}

fn first_number() -> String {
    format!("FAC-{}-00001", chrono::Utc::now().format("%Y"))
}

#[test]
fn script_mode_issues_and_prints_invoices() {
    let home = TempDir::new().unwrap();
    let input = format!(
        "invoice-new Marco Lucia \"Haircut:1:18\" \"Beard trim:1:9.50\" --tax 2.5\n\
         invoice-print {} --by reception\n\
         exit\n",
        first_number()
    );

    let output = shop_cli(&home)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("Created invoice"))
        .stdout(contains("Total: 30.00 EUR"))
        .stdout(contains("print #1"))
        .get_output()
        .stdout
        .clone();

    let text = String::from_utf8(output).unwrap();
    let number = Regex::new(r"FAC-\d{4}-\d{5}").unwrap();
    assert!(number.is_match(&text));

    let stored = std::fs::read_to_string(home.path().join("invoices/invoices.json")).unwrap();
    assert!(stored.contains("\"print_count\": 1"));
    assert!(stored.contains("\"last_printed_by\": \"reception\""));
}

#[test]
fn reprints_are_marked_as_copies() {
    let home = TempDir::new().unwrap();
    let number = first_number();
    let input = format!(
        "invoice-new Marco Lucia Haircut:1:18\ninvoice-print {number}\ninvoice-print {number}\n"
    );

    shop_cli(&home)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("COPY").count(1))
        .stdout(contains("print #2"));
}

#[test]
fn cancelled_invoices_cannot_be_refunded() {
    let home = TempDir::new().unwrap();
    let number = first_number();
    let input = format!(
        "invoice-new Marco Lucia Haircut:1:18\n\
         invoice-cancel {number} client walked out\n\
         invoice-refund {number} changed mind\n\
         invoice-show {number}\n"
    );

    shop_cli(&home)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains(format!("Cancelled {number}.")))
        .stdout(contains("Status: CANCELLED"))
        .stdout(contains("Cancelled: client walked out"))
        .stderr(contains("Invalid operation"));
}

#[test]
fn unknown_commands_get_suggestions() {
    let home = TempDir::new().unwrap();
    shop_cli(&home)
        .write_stdin("invoce-list\n")
        .assert()
        .success()
        .stderr(contains("Unknown command `invoce-list`"))
        .stdout(contains("Suggestion: `invoice-list`?"));
}

#[test]
fn expense_describe_follows_configured_language() {
    let home = TempDir::new().unwrap();
    shop_cli(&home)
        .write_stdin(
            "expense-describe monthly 2 --days 1,15\n\
             config set locale es-ES\n\
             expense-describe weekly 1 --weekdays 0,1,2,3,4,5,6\n\
             expense-describe bogus 3\n",
        )
        .assert()
        .success()
        .stdout(contains("Every 2 months (days 1 and 15)"))
        .stdout(contains("Semanal (todos los días)"))
        .stdout(contains("bogus cada 3"));

    let config = std::fs::read_to_string(home.path().join("config/config.json")).unwrap();
    assert!(config.contains("\"locale\": \"es-ES\""));
}

#[test]
fn invalid_items_report_errors_without_issuing() {
    let home = TempDir::new().unwrap();
    shop_cli(&home)
        .write_stdin("invoice-new Marco Lucia Haircut\ninvoice-new Marco Lucia Haircut:0:18\n")
        .assert()
        .success()
        .stderr(contains("must look like description:quantity:price"))
        .stderr(contains("Validation failed"));

    assert!(!home.path().join("invoices/invoices.json").exists());
}

#[test]
fn unusable_date_formats_are_refused_and_printing_keeps_working() {
    let home = TempDir::new().unwrap();
    let number = first_number();
    let input = format!(
        "invoice-new Marco Lucia Haircut:1:18\n\
         config set date-format %Q\n\
         invoice-show {number}\n"
    );

    shop_cli(&home)
        .write_stdin(input)
        .assert()
        .success()
        .stderr(contains("not a valid date pattern"))
        .stdout(contains(format!("Invoice {number}")));

    let config = std::fs::read_to_string(home.path().join("config/config.json"));
    assert!(config.map_or(true, |text| !text.contains("%Q")));
}

#[test]
fn listing_keeps_invoices_from_an_earlier_prefix() {
    let home = TempDir::new().unwrap();
    let year = chrono::Utc::now().format("%Y").to_string();
    shop_cli(&home)
        .write_stdin(
            "invoice-new Marco Lucia Haircut:1:18\n\
             config set invoice-prefix BAR\n\
             invoice-new Marco Ana Shave:1:9\n\
             invoice-list\n\
             invoice-list --prefix FAC\n",
        )
        .assert()
        .success()
        .stdout(contains(format!("BAR-{year}-00001")))
        .stdout(contains(format!("FAC-{year}-00001")).count(3));
}

#[test]
fn invoice_backups_are_created_and_listed() {
    let home = TempDir::new().unwrap();
    shop_cli(&home)
        .write_stdin(
            "invoice-backups\n\
             invoice-new Marco Lucia Haircut:1:18\n\
             invoice-backup month end\n\
             invoice-backup month end\n\
             invoice-backups\n",
        )
        .assert()
        .success()
        .stdout(contains("No invoice backups yet."))
        .stdout(contains("Invoices backed up as invoices_month-end_"));

    let backups = std::fs::read_dir(home.path().join("invoices/backups"))
        .unwrap()
        .count();
    assert_eq!(backups, 2);
}
