use super::csv::command_reader::Command;
use crate::application::service::{LedgerService, ServiceError};
use crate::domain::account::Account;
use std::collections::HashMap;
use tracing::debug;

/// Executes CSV commands against a [`LedgerService`], resolving the
/// run-local aliases given to accounts opened in the same batch.
pub struct BatchRunner {
    service: LedgerService,
    ids_by_alias: HashMap<String, String>,
}

impl BatchRunner {
    pub fn new(service: LedgerService) -> Self {
        Self {
            service,
            ids_by_alias: HashMap::new(),
        }
    }

    fn resolve<'a>(&'a self, reference: &'a str) -> &'a str {
        self.ids_by_alias
            .get(reference)
            .map(String::as_str)
            .unwrap_or(reference)
    }

    pub async fn execute(&mut self, command: Command) -> Result<(), ServiceError> {
        match command {
            Command::Open {
                alias,
                initial_balance,
            } => {
                let id = self.service.create_account(initial_balance).await?;
                if let Some(alias) = alias {
                    debug!(%alias, account = %id, "alias bound");
                    self.ids_by_alias.insert(alias, id);
                }
                Ok(())
            }
            Command::Transfer {
                id,
                from,
                to,
                amount,
            } => {
                let from = self.resolve(&from);
                let to = self.resolve(&to);
                self.service
                    .submit_transfer(id.as_deref(), from, to, amount)
                    .await
                    .map(|_| ())
            }
        }
    }

    /// Consumes the runner and returns every stored account together with
    /// the aliases bound during this run, keyed by account id.
    pub async fn into_results(self) -> Result<(Vec<Account>, HashMap<String, String>), ServiceError> {
        let accounts = self.service.accounts().await?;
        let aliases = self
            .ids_by_alias
            .into_iter()
            .map(|(alias, id)| (id, alias))
            .collect();
        Ok((accounts, aliases))
    }
}
