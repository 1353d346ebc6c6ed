//! Initial database migration.
//!
//! Creates the wallet registry, the append-only ledger and the daily
//! statistics table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(WALLETS_SQL).await?;
        db.execute_unprepared(LEDGER_ENTRIES_SQL).await?;
        db.execute_unprepared(DAILY_STATISTICS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE transfer_kind AS ENUM (
    'sent_external',
    'sent_internal',
    'platform',
    'platform_profit'
);
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY,
    username VARCHAR(150) NOT NULL UNIQUE,
    token_hash VARCHAR(64) NOT NULL UNIQUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const WALLETS_SQL: &str = r"
CREATE TABLE wallets (
    address UUID PRIMARY KEY,
    alias VARCHAR(50) NOT NULL,
    user_id UUID REFERENCES users(id) ON DELETE RESTRICT,
    created TIMESTAMPTZ NOT NULL DEFAULT now(),
    last_updated TIMESTAMPTZ NOT NULL,
    CONSTRAINT unique_user_alias UNIQUE (user_id, alias)
);

CREATE INDEX idx_wallets_user ON wallets(user_id, created);
";

// Entries are never updated or deleted. Direction is carried by the
// wallet columns, so amounts are strictly positive.
const LEDGER_ENTRIES_SQL: &str = r"
CREATE TABLE ledger_entries (
    id BIGSERIAL PRIMARY KEY,
    wallet_from UUID REFERENCES wallets(address) ON DELETE RESTRICT,
    wallet_to UUID REFERENCES wallets(address) ON DELETE RESTRICT,
    kind transfer_kind NOT NULL,
    amount NUMERIC(16, 8) NOT NULL,
    details VARCHAR(250) NOT NULL DEFAULT '',
    extra TEXT NOT NULL DEFAULT '',
    created_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT chk_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_has_wallet CHECK (wallet_from IS NOT NULL OR wallet_to IS NOT NULL)
);

CREATE INDEX idx_ledger_entries_from ON ledger_entries(wallet_from) INCLUDE (amount);
CREATE INDEX idx_ledger_entries_to ON ledger_entries(wallet_to) INCLUDE (amount);
CREATE INDEX idx_ledger_entries_created ON ledger_entries(created_at DESC, id DESC);
";

const DAILY_STATISTICS_SQL: &str = r"
CREATE TABLE daily_statistics (
    date DATE PRIMARY KEY,
    transactions BIGINT NOT NULL DEFAULT 0,
    profit NUMERIC(16, 8) NOT NULL DEFAULT 0
);
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS daily_statistics CASCADE;
DROP TABLE IF EXISTS ledger_entries CASCADE;
DROP TABLE IF EXISTS wallets CASCADE;
DROP TABLE IF EXISTS users CASCADE;
DROP TYPE IF EXISTS transfer_kind;
";
