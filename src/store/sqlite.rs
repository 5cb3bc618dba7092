use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

const COMMUNITY_COLUMNS: &str = "c.id, c.name, c.description, c.meeting_day, c.meeting_time, \
     c.trust_level, c.member_count, c.location_city, c.location_state, c.location_lat, \
     c.location_lng, c.tags, c.leader_id, c.contact_info, c.created_at, c.updated_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens a private in-memory database, mostly useful for tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

// Fixed-width so that text ordering matches chronological ordering.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn community_from_row(row: &Row<'_>) -> rusqlite::Result<Community> {
    let trust_level = row
        .get::<_, String>(5)?
        .parse::<TrustLevel>()
        .map_err(|e| conversion_error(5, e))?;
    let tags: Vec<String> =
        serde_json::from_str(&row.get::<_, String>(11)?).map_err(|e| conversion_error(11, e))?;
    let contact_info = match row.get::<_, Option<String>>(13)? {
        Some(raw) => Some(serde_json::from_str(&raw).map_err(|e| conversion_error(13, e))?),
        None => None,
    };

    Ok(Community {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        meeting_day: row.get(3)?,
        meeting_time: row.get(4)?,
        trust_level,
        member_count: row.get(6)?,
        location_city: row.get(7)?,
        location_state: row.get(8)?,
        location_lat: row.get(9)?,
        location_lng: row.get(10)?,
        tags,
        leader_id: row.get(12)?,
        contact_info,
        created_at: parse_datetime(&row.get::<_, String>(14)?),
        updated_at: parse_datetime(&row.get::<_, String>(15)?),
    })
}

fn membership_from_row(row: &Row<'_>) -> rusqlite::Result<Membership> {
    Ok(Membership {
        community_id: row.get(0)?,
        user_id: row.get(1)?,
        role: row
            .get::<_, String>(2)?
            .parse()
            .map_err(|e| conversion_error(2, e))?,
        joined_at: parse_datetime(&row.get::<_, String>(3)?),
    })
}

fn token_from_row(row: &Row<'_>) -> rusqlite::Result<Token> {
    Ok(Token {
        id: row.get(0)?,
        token_hash: row.get(1)?,
        token_lookup: row.get(2)?,
        is_admin: row.get(3)?,
        user_id: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        expires_at: row.get::<_, Option<String>>(6)?.map(|s| parse_datetime(&s)),
        last_used_at: row.get::<_, Option<String>>(7)?.map(|s| parse_datetime(&s)),
    })
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(&self, user: &User) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO users (id, display_name, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                user.id,
                user.display_name,
                format_datetime(&user.created_at),
                format_datetime(&user.updated_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, display_name, created_at, updated_at FROM users WHERE id = ?1",
            params![id],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    display_name: row.get(1)?,
                    created_at: parse_datetime(&row.get::<_, String>(2)?),
                    updated_at: parse_datetime(&row.get::<_, String>(3)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, display_name, created_at, updated_at FROM users ORDER BY display_name",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(User {
                id: row.get(0)?,
                display_name: row.get(1)?,
                created_at: parse_datetime(&row.get::<_, String>(2)?),
                updated_at: parse_datetime(&row.get::<_, String>(3)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Token operations

    fn create_token(&self, token: &Token) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO tokens (id, token_hash, token_lookup, is_admin, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                token.id,
                token.token_hash,
                token.token_lookup,
                token.is_admin,
                token.user_id,
                format_datetime(&token.created_at),
                token.expires_at.as_ref().map(format_datetime),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::TokenLookupCollision),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, token_hash, token_lookup, is_admin, user_id, created_at, expires_at, last_used_at
             FROM tokens WHERE token_lookup = ?1",
            params![lookup],
            token_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn update_token_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE tokens SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    fn has_admin_token(&self) -> Result<bool> {
        let conn = self.conn();
        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM tokens WHERE is_admin = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // Community operations

    fn create_community(&self, community: &Community) -> Result<()> {
        let tags = serde_json::to_string(&community.tags)?;
        let contact_info = community
            .contact_info
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let inserted = tx.execute(
            "INSERT INTO communities (
                id, name, description, meeting_day, meeting_time, trust_level, member_count,
                location_city, location_state, location_lat, location_lng, tags, leader_id,
                contact_info, created_at, updated_at
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                community.id,
                community.name,
                community.description,
                community.meeting_day,
                community.meeting_time,
                community.trust_level.as_str(),
                community.location_city,
                community.location_state,
                community.location_lat,
                community.location_lng,
                tags,
                community.leader_id,
                contact_info,
                format_datetime(&community.created_at),
                format_datetime(&community.updated_at),
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_constraint_violation(&e) => return Err(Error::AlreadyExists),
            Err(e) => return Err(Error::from(e)),
        }

        tx.execute(
            "INSERT INTO community_members (community_id, user_id, role, joined_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                community.id,
                community.leader_id,
                MemberRole::Leader.as_str(),
                format_datetime(&community.created_at),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn get_community(&self, id: &str) -> Result<Option<Community>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {COMMUNITY_COLUMNS} FROM communities c WHERE c.id = ?1"),
            params![id],
            community_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_communities(&self) -> Result<Vec<Community>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {COMMUNITY_COLUMNS} FROM communities c ORDER BY c.created_at DESC, c.id DESC"
        ))?;

        let rows = stmt.query_map([], community_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Membership operations

    fn add_member(&self, community_id: &str, user_id: &str, role: MemberRole) -> Result<()> {
        let now = format_datetime(&Utc::now());
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let inserted = tx.execute(
            "INSERT INTO community_members (community_id, user_id, role, joined_at)
             SELECT id, ?2, ?3, ?4 FROM communities WHERE id = ?1",
            params![community_id, user_id, role.as_str(), now],
        );

        match inserted {
            Ok(0) => return Err(Error::NotFound),
            Ok(_) => {}
            Err(e) if is_constraint_violation(&e) => return Err(Error::AlreadyExists),
            Err(e) => return Err(Error::from(e)),
        }

        tx.execute(
            "UPDATE communities SET member_count = member_count + 1, updated_at = ?2 WHERE id = ?1",
            params![community_id, now],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn remove_member(&self, community_id: &str, user_id: &str) -> Result<bool> {
        let now = format_datetime(&Utc::now());
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let removed = tx.execute(
            "DELETE FROM community_members WHERE community_id = ?1 AND user_id = ?2",
            params![community_id, user_id],
        )?;

        if removed > 0 {
            tx.execute(
                "UPDATE communities SET member_count = MAX(member_count - 1, 0), updated_at = ?2
                 WHERE id = ?1",
                params![community_id, now],
            )?;
        }

        tx.commit()?;
        Ok(removed > 0)
    }

    fn get_membership(&self, community_id: &str, user_id: &str) -> Result<Option<Membership>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT community_id, user_id, role, joined_at FROM community_members
             WHERE community_id = ?1 AND user_id = ?2",
            params![community_id, user_id],
            membership_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_members(&self, community_id: &str) -> Result<Vec<Membership>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT community_id, user_id, role, joined_at FROM community_members
             WHERE community_id = ?1 ORDER BY joined_at, user_id",
        )?;

        let rows = stmt.query_map(params![community_id], membership_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_user_communities(&self, user_id: &str) -> Result<Vec<UserCommunity>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {COMMUNITY_COLUMNS}, m.role
             FROM community_members m
             JOIN communities c ON c.id = m.community_id
             WHERE m.user_id = ?1
             ORDER BY m.joined_at DESC, c.id"
        ))?;

        let rows = stmt.query_map(params![user_id], |row| {
            let community = community_from_row(row)?;
            let role = row
                .get::<_, String>(16)?
                .parse()
                .map_err(|e| conversion_error(16, e))?;
            Ok(UserCommunity { community, role })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn count_members(&self, community_id: &str) -> Result<i64> {
        let conn = self.conn();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM community_members WHERE community_id = ?1",
            params![community_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn reconcile_member_count(&self, community_id: &str) -> Result<i64> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let rows = tx.execute(
            "UPDATE communities
             SET member_count = (SELECT COUNT(*) FROM community_members WHERE community_id = ?1)
             WHERE id = ?1",
            params![community_id],
        )?;
        if rows == 0 {
            return Err(Error::NotFound);
        }

        let count: i64 = tx.query_row(
            "SELECT member_count FROM communities WHERE id = ?1",
            params![community_id],
            |row| row.get(0),
        )?;

        tx.commit()?;
        Ok(count)
    }
}
