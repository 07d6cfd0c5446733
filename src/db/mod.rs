use anyhow::Result;
use rusqlite::{Connection, TransactionBehavior};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub mod models;
pub mod store;

pub use store::Store;

/// Thread-safe SQLite handle (single connection with mutex).
///
/// Every write goes through [`Database::write`], which runs the closure in an
/// immediate transaction while holding the connection lock. Ledger mutations
/// and correct-answer reversals are therefore serialized and all-or-nothing.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the SQLite database at the given path
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // A panic mid-transaction drops the transaction, which rolls it back, so
    // the connection behind a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run read-only repository queries.
    pub fn read<T>(
        &self,
        f: impl FnOnce(&Store<'_>) -> crate::error::Result<T>,
    ) -> crate::error::Result<T> {
        let conn = self.lock();
        f(&Store::new(&conn))
    }

    /// Run repository mutations in one transaction; any error rolls back
    /// everything the closure did.
    pub fn write<T>(
        &self,
        f: impl FnOnce(&Store<'_>) -> crate::error::Result<T>,
    ) -> crate::error::Result<T> {
        let mut conn = self.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&Store::new(&tx))?;
        tx.commit()?;
        Ok(out)
    }
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS)
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS games (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    league_id     INTEGER NOT NULL,
    name          TEXT    NOT NULL,
    external_id   TEXT,
    state         TEXT    NOT NULL DEFAULT 'scheduled',
    start_time    TEXT    NOT NULL,
    team_a_score  INTEGER,
    team_b_score  INTEGER,
    prop_limit    INTEGER NOT NULL DEFAULT 2,
    graded        INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS players (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    league_id  INTEGER NOT NULL,
    name       TEXT    NOT NULL,
    points     REAL    NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS winner_loser_props (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    game_id          INTEGER NOT NULL,
    question         TEXT    NOT NULL,
    is_mandatory     INTEGER NOT NULL DEFAULT 1,
    favorite_team    TEXT    NOT NULL,
    favorite_team_id TEXT,
    favorite_points  REAL    NOT NULL,
    favorite_score   INTEGER,
    underdog_team    TEXT    NOT NULL,
    underdog_team_id TEXT,
    underdog_points  REAL    NOT NULL,
    underdog_score   INTEGER,
    winning_team_id  TEXT,
    correct_answer   TEXT,
    FOREIGN KEY (game_id) REFERENCES games(id)
);

CREATE TABLE IF NOT EXISTS over_under_props (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    game_id        INTEGER NOT NULL,
    question       TEXT    NOT NULL,
    is_mandatory   INTEGER NOT NULL DEFAULT 0,
    player_name    TEXT,
    player_id      TEXT,
    stat_type      TEXT,
    line_value     REAL,
    current_value  REAL,
    over_points    REAL    NOT NULL,
    under_points   REAL    NOT NULL,
    correct_answer TEXT,
    FOREIGN KEY (game_id) REFERENCES games(id)
);

CREATE TABLE IF NOT EXISTS variable_option_props (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    game_id        INTEGER NOT NULL,
    question       TEXT    NOT NULL,
    is_mandatory   INTEGER NOT NULL DEFAULT 0,
    -- JSON array of correct choices
    correct_answer TEXT,
    FOREIGN KEY (game_id) REFERENCES games(id)
);

CREATE TABLE IF NOT EXISTS variable_option_choices (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    prop_id  INTEGER NOT NULL,
    choice   TEXT    NOT NULL,
    points   REAL    NOT NULL,
    FOREIGN KEY (prop_id) REFERENCES variable_option_props(id)
);

CREATE TABLE IF NOT EXISTS anytime_td_props (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    game_id        INTEGER NOT NULL,
    question       TEXT    NOT NULL,
    is_mandatory   INTEGER NOT NULL DEFAULT 0,
    -- JSON array of player names who hit their line
    correct_answer TEXT,
    FOREIGN KEY (game_id) REFERENCES games(id)
);

CREATE TABLE IF NOT EXISTS anytime_td_options (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    prop_id     INTEGER NOT NULL,
    player_name TEXT    NOT NULL,
    td_line     REAL    NOT NULL DEFAULT 0.5,
    points      REAL    NOT NULL,
    current_tds INTEGER DEFAULT 0,
    FOREIGN KEY (prop_id) REFERENCES anytime_td_props(id)
);

CREATE TABLE IF NOT EXISTS answers (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    player_id    INTEGER NOT NULL,
    prop_kind    TEXT    NOT NULL,
    prop_id      INTEGER NOT NULL,
    answer       TEXT    NOT NULL,
    submitted_at TEXT    NOT NULL,
    UNIQUE (player_id, prop_kind, prop_id),
    FOREIGN KEY (player_id) REFERENCES players(id)
);

CREATE TABLE IF NOT EXISTS prop_selections (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    player_id  INTEGER NOT NULL,
    game_id    INTEGER NOT NULL,
    prop_kind  TEXT    NOT NULL,
    prop_id    INTEGER NOT NULL,
    UNIQUE (player_id, game_id, prop_kind, prop_id),
    FOREIGN KEY (player_id) REFERENCES players(id),
    FOREIGN KEY (game_id) REFERENCES games(id)
);

CREATE TABLE IF NOT EXISTS point_awards (
    player_id   INTEGER NOT NULL,
    prop_kind   TEXT    NOT NULL,
    prop_id     INTEGER NOT NULL,
    answer      TEXT    NOT NULL,
    points      REAL    NOT NULL,
    awarded_at  TEXT    NOT NULL,
    PRIMARY KEY (player_id, prop_kind, prop_id),
    FOREIGN KEY (player_id) REFERENCES players(id)
);

CREATE INDEX IF NOT EXISTS idx_games_poll ON games(state, start_time);
CREATE INDEX IF NOT EXISTS idx_answers_prop ON answers(prop_kind, prop_id);
CREATE INDEX IF NOT EXISTS idx_selections_player_game ON prop_selections(player_id, game_id);
CREATE INDEX IF NOT EXISTS idx_awards_prop ON point_awards(prop_kind, prop_id);
"#;
