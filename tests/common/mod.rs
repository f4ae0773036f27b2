#![allow(dead_code)]

use ledger_core::application::service::LedgerService;
use ledger_core::infrastructure::in_memory::InMemoryAccountStore;
use std::fs::File;
use std::io::Error;
use std::path::Path;
use std::sync::Arc;

pub const HEADER: [&str; 6] = ["type", "account", "from", "to", "amount", "tx"];

pub fn in_memory_service() -> Arc<LedgerService> {
    Arc::new(LedgerService::new(Box::new(InMemoryAccountStore::new())))
}

/// Writes a batch that opens two funded accounts and ping-pongs `rows`
/// one-unit transfers between them.
pub fn generate_csv(path: &Path, rows: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(HEADER)?;
    wtr.write_record(["open", "left", "", "", "1000", ""])?;
    wtr.write_record(["open", "right", "", "", "1000", ""])?;

    for i in 1..=rows {
        let (from, to) = if i % 2 == 0 {
            ("left", "right")
        } else {
            ("right", "left")
        };
        let tx = format!("tx-{i}");
        wtr.write_record(["transfer", "", from, to, "1", tx.as_str()])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Returns the balance printed for `alias` in the CLI's CSV output.
pub fn balance_of(stdout: &str, alias: &str) -> Option<i64> {
    stdout.lines().skip(1).find_map(|line| {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.get(1) == Some(&alias) {
            fields.get(2)?.parse().ok()
        } else {
            None
        }
    })
}

/// Returns the account id printed for `alias` in the CLI's CSV output.
pub fn id_of(stdout: &str, alias: &str) -> Option<String> {
    stdout.lines().skip(1).find_map(|line| {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.get(1) == Some(&alias) {
            Some(fields[0].to_string())
        } else {
            None
        }
    })
}
