//! Conversions from engine values to API views.

use api_types::{
    Currency as ApiCurrency,
    account::AccountView,
    entry::EntryView,
    transfer::{TransferCreated, TransferView},
};
use engine::{Account, Currency, Entry, Transfer, TransferResult};

pub(crate) fn map_currency(currency: Currency) -> ApiCurrency {
    match currency {
        Currency::Usd => ApiCurrency::Usd,
        Currency::Eur => ApiCurrency::Eur,
    }
}

pub(crate) fn engine_currency(currency: ApiCurrency) -> Currency {
    match currency {
        ApiCurrency::Usd => Currency::Usd,
        ApiCurrency::Eur => Currency::Eur,
    }
}

pub(crate) fn account_view(account: Account) -> AccountView {
    AccountView {
        id: account.id,
        owner: account.owner,
        balance: account.balance,
        currency: map_currency(account.currency),
        created_at: account.created_at,
    }
}

pub(crate) fn entry_view(entry: Entry) -> EntryView {
    EntryView {
        id: entry.id,
        account_id: entry.account_id,
        amount: entry.amount,
        created_at: entry.created_at,
    }
}

fn transfer_view(transfer: Transfer) -> TransferView {
    TransferView {
        id: transfer.id,
        from_account_id: transfer.from_account_id,
        to_account_id: transfer.to_account_id,
        amount: transfer.amount,
        created_at: transfer.created_at,
    }
}

pub(crate) fn transfer_created(result: TransferResult) -> TransferCreated {
    TransferCreated {
        transfer: transfer_view(result.transfer),
        from_entry: entry_view(result.from_entry),
        to_entry: entry_view(result.to_entry),
        from_account: account_view(result.from_account),
        to_account: account_view(result.to_account),
    }
}
