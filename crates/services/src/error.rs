//! Service-layer errors

use tandem_core::{Error, Restartable};
use thiserror::Error as ThisError;

/// Result alias for service operations
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Failures of a business unit of work
///
/// Business rule violations abort the surrounding transaction but are never
/// retried; transaction-layer errors pass through and keep their restart
/// classification.
#[derive(Debug, Clone, ThisError, PartialEq)]
pub enum ServiceError {
    /// Account balance cannot cover the requested amount
    #[error("insufficient funds in account {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Account primary key
        account: i64,
        /// Current balance in minor units
        balance: i64,
        /// Requested amount in minor units
        requested: i64,
    },

    /// Product stock cannot cover the requested quantity
    #[error("insufficient stock for product {product}: in stock {stock}, requested {requested}")]
    InsufficientStock {
        /// Product primary key
        product: i64,
        /// Units in stock
        stock: i64,
        /// Requested units
        requested: i64,
    },

    /// A referenced entity does not exist
    #[error("{entity} {id} does not exist")]
    NotFound {
        /// Entity kind, e.g. "account"
        entity: &'static str,
        /// Primary key looked up
        id: i64,
    },

    /// Transaction-layer failure
    #[error(transparent)]
    Txn(#[from] Error),
}

impl Restartable for ServiceError {
    fn is_restartable(&self) -> bool {
        match self {
            ServiceError::Txn(e) => e.is_restartable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::TxnId;

    #[test]
    fn test_restartability_delegates() {
        let tid = TxnId::new();
        assert!(ServiceError::from(Error::Deadlock { tid }).is_restartable());
        assert!(!ServiceError::InsufficientFunds {
            account: 1,
            balance: 10,
            requested: 20
        }
        .is_restartable());
        assert!(!ServiceError::from(Error::BudgetExhausted { attempts: 3 }).is_restartable());
    }
}
