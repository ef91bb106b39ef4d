//! Automatic retry of restarted units of work
//!
//! A restart leaves a fresh transaction in place under the same client token;
//! the caller's unit of work just has to run again. This helper owns that
//! loop: begin when needed, run, commit, and retry on restartable errors up
//! to a budget.

use crate::manager::TransactionManager;
use tandem_core::{Error, Restartable};

impl TransactionManager {
    /// Run `f` as one transaction, retrying on restart up to `budget` attempts
    ///
    /// Generic over the caller's error type so service layers can thread
    /// their own errors through; anything convertible from [`Error`] that can
    /// answer [`Restartable::is_restartable`] works.
    ///
    /// - begins a transaction when the client has none (after an internal
    ///   restart the fresh transaction is reused)
    /// - commits after `f` succeeds
    /// - on a restartable error, runs `f` again, up to `budget` attempts,
    ///   then surfaces [`Error::BudgetExhausted`]
    /// - on any other error, rolls back best-effort and surfaces it
    pub fn with_retries<T, E, F>(
        &self,
        client: &str,
        budget: usize,
        mut f: F,
    ) -> std::result::Result<T, E>
    where
        E: From<Error> + Restartable + std::fmt::Display,
        F: FnMut(&TransactionManager) -> std::result::Result<T, E>,
    {
        let budget = budget.max(1);
        let mut attempts = 0;
        loop {
            attempts += 1;
            if !self.has_active(client) {
                self.begin(client).map_err(E::from)?;
            }

            let outcome = f(self).and_then(|value| {
                self.commit(client).map_err(E::from)?;
                Ok(value)
            });
            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if e.is_restartable() && attempts < budget => {
                    tracing::info!(client, attempt = attempts, error = %e, "retrying unit of work");
                }
                Err(e) if e.is_restartable() => {
                    let _ = self.rollback(client);
                    return Err(E::from(Error::BudgetExhausted { attempts }));
                }
                Err(e) => {
                    let _ = self.rollback(client);
                    return Err(e);
                }
            }
        }
    }

    /// [`Self::with_retries`] with the configured default budget
    pub fn with_transaction<T, E, F>(&self, client: &str, f: F) -> std::result::Result<T, E>
    where
        E: From<Error> + Restartable + std::fmt::Display,
        F: FnMut(&TransactionManager) -> std::result::Result<T, E>,
    {
        self.with_retries(client, self.config().max_retries, f)
    }
}
