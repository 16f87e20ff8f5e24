//! Database model for banks.

use diesel::prelude::*;

use creditflow_core::banks::Bank;

#[derive(Queryable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::banks)]
pub struct BankDB {
    pub id: String,
    pub name: String,
    pub trading_name: Option<String>,
}

impl From<BankDB> for Bank {
    fn from(db: BankDB) -> Self {
        Bank {
            id: db.id,
            name: db.name,
            trading_name: db.trading_name,
        }
    }
}
