//! The module contains `Account` struct and its table.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{Currency, EngineError};

/// An account.
///
/// The balance is an amount of minor units of `currency`. The engine never
/// checks its sign: a transfer may take it below zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Auto-increment identifier. Ids are totally ordered, transfers rely on
    /// that to lock accounts in a stable order.
    pub id: i64,
    pub owner: String,
    pub currency: Currency,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub owner: String,
    pub balance: i64,
    pub currency: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::entries::Entity")]
    Entries,
}

impl Related<super::entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    /// A fresh account row, the database assigns the id.
    pub(crate) fn open(owner: String, currency: Currency) -> Self {
        Self {
            id: ActiveValue::NotSet,
            owner: ActiveValue::Set(owner),
            balance: ActiveValue::Set(0),
            currency: ActiveValue::Set(currency.code().to_string()),
            created_at: ActiveValue::Set(Utc::now()),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            owner: model.owner,
            currency: Currency::try_from(model.currency.as_str())?,
            balance: model.balance,
            created_at: model.created_at,
        })
    }
}
