use crate::error::{LedgerError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    Open,
    Transfer,
}

/// One raw CSV row: `type, account, from, to, amount, tx`.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
pub struct CommandRecord {
    pub r#type: CommandType,
    pub account: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub amount: Option<i64>,
    pub tx: Option<String>,
}

/// A ledger command ready to be executed.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Command {
    /// Open an account; `alias` names it for later rows of the same batch.
    Open {
        alias: Option<String>,
        initial_balance: i64,
    },
    /// `from`/`to` are aliases or raw account ids.
    Transfer {
        id: Option<String>,
        from: String,
        to: String,
        amount: i64,
    },
}

impl TryFrom<CommandRecord> for Command {
    type Error = LedgerError;

    fn try_from(record: CommandRecord) -> Result<Self> {
        match record.r#type {
            CommandType::Open => Ok(Command::Open {
                alias: record.account,
                initial_balance: record.amount.unwrap_or(0),
            }),
            CommandType::Transfer => {
                let missing =
                    |field: &str| LedgerError::InvalidArgument(format!("transfer row without {field}"));
                Ok(Command::Transfer {
                    id: record.tx,
                    from: record.from.ok_or_else(|| missing("from"))?,
                    to: record.to.ok_or_else(|| missing("to"))?,
                    amount: record.amount.ok_or_else(|| missing("amount"))?,
                })
            }
        }
    }
}

/// Reads ledger commands from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record lengths,
/// yielding commands lazily so large batches are streamed.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader
            .into_deserialize::<CommandRecord>()
            .map(|result| result.map_err(LedgerError::from).and_then(Command::try_from))
    }
}
