//! Command structs for engine operations.

/// Move `amount` minor units from one account to another.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferCmd {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
}

impl TransferCmd {
    #[must_use]
    pub fn new(from_account_id: i64, to_account_id: i64, amount: i64) -> Self {
        Self {
            from_account_id,
            to_account_id,
            amount,
        }
    }
}
