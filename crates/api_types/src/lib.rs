use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
}

pub mod account {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub owner: String,
        pub currency: Currency,
    }

    /// Query string of `GET /accounts`.
    ///
    /// `page_id` starts at 1, `page_size` must be between 5 and 10.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountList {
        pub page_id: u64,
        pub page_size: u64,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: i64,
        pub owner: String,
        pub balance: i64,
        pub currency: Currency,
        pub created_at: DateTime<Utc>,
    }
}

pub mod entry {
    use super::*;

    /// Query string of `GET /accounts/{id}/entries`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct EntryList {
        pub page_id: Option<u64>,
        pub page_size: Option<u64>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct EntryView {
        pub id: i64,
        pub account_id: i64,
        pub amount: i64,
        pub created_at: DateTime<Utc>,
    }
}

pub mod transfer {
    use super::*;
    use crate::{account::AccountView, entry::EntryView};

    /// Body of `POST /transfers`.
    ///
    /// Both accounts must be in `currency`; the server never converts.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferNew {
        pub from_account_id: i64,
        pub to_account_id: i64,
        pub amount: i64,
        pub currency: Currency,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TransferView {
        pub id: i64,
        pub from_account_id: i64,
        pub to_account_id: i64,
        pub amount: i64,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TransferCreated {
        pub transfer: TransferView,
        pub from_entry: EntryView,
        pub to_entry: EntryView,
        pub from_account: AccountView,
        pub to_account: AccountView,
    }
}
