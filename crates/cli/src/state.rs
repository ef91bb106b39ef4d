//! Session state shared by shell, REPL, and pipe modes

use std::sync::Arc;
use tandem_concurrency::{OpRequest, OpResult, Statistics, TransactionManager};
use tandem_core::{Result, TxnId};
use tandem_services::{Bank, Inventory};

/// One interactive session: the manager, the services, and the client token
/// routing every command to the right transaction
pub struct SessionState {
    manager: Arc<TransactionManager>,
    bank: Bank,
    inventory: Inventory,
    client: String,
}

impl SessionState {
    /// Create a session bound to `client`
    pub fn new(manager: Arc<TransactionManager>, client: impl Into<String>) -> Self {
        SessionState {
            bank: Bank::new(Arc::clone(&manager)),
            inventory: Inventory::new(Arc::clone(&manager)),
            manager,
            client: client.into(),
        }
    }

    /// The manager behind this session
    pub fn manager(&self) -> &Arc<TransactionManager> {
        &self.manager
    }

    /// The banking service
    pub fn bank(&self) -> &Bank {
        &self.bank
    }

    /// The inventory service
    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// The active client token
    pub fn client(&self) -> &str {
        &self.client
    }

    /// Switch the client token commands are routed under
    pub fn set_client(&mut self, client: &str) {
        self.client = client.to_string();
    }

    /// Prompt string, marking an open transaction
    pub fn prompt(&self) -> String {
        if self.manager.has_active(&self.client) {
            format!("tandem({})* ", self.client)
        } else {
            format!("tandem({})> ", self.client)
        }
    }

    /// Begin a transaction under the session client
    pub fn begin(&self) -> Result<TxnId> {
        self.manager.begin(&self.client)
    }

    /// Commit the session client's transaction
    pub fn commit(&self) -> Result<()> {
        self.manager.commit(&self.client)
    }

    /// Roll back the session client's transaction
    pub fn rollback(&self) -> Result<()> {
        self.manager.rollback(&self.client)
    }

    /// Execute a raw operation under the session client
    pub fn execute(&self, request: OpRequest) -> Result<OpResult> {
        self.manager.execute(&self.client, request)
    }

    /// Manager counters
    pub fn statistics(&self) -> Statistics {
        self.manager.statistics()
    }
}
