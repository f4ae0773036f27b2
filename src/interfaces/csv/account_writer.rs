use crate::domain::account::Account;
use crate::error::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;

#[derive(Serialize)]
struct AccountRow<'a> {
    account: String,
    alias: &'a str,
    balance: i64,
}

/// Writes final account balances as CSV: `account,alias,balance`.
pub struct AccountWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> AccountWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// `aliases` maps account ids (as strings) to the names used in the batch.
    pub fn write_accounts(
        &mut self,
        accounts: &[Account],
        aliases: &HashMap<String, String>,
    ) -> Result<()> {
        for account in accounts {
            let id = account.id.to_string();
            let alias = aliases.get(&id).map(String::as_str).unwrap_or("");
            self.writer.serialize(AccountRow {
                account: id,
                alias,
                balance: account.balance.value(),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
