use crate::model::{ContactEvent, Lead, LeadMeta, StorageError};
use crate::reconcile;
use chrono::Utc;
use rusqlite::{params, Connection, Row};

/// Substring filters for lead listing, all optional and AND-combined.
#[derive(Debug, Default, Clone)]
pub struct LeadFilter {
    pub name_contains: Option<String>,
    pub city_contains: Option<String>,
    pub type_contains: Option<String>,
}

pub struct SqliteStorage {
    conn: Connection,
}

const LEAD_COLUMNS: &str = "id, name, address, lat, lng, phone, email, website, \
     instagram, linkedin, city, business_type, source, meta";

impl SqliteStorage {
    /// Opens the database file and runs migrations.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| rusqlite::Error::InvalidPath(e.to_string().into()))?;
            }
        }
        Self::init(Connection::open(db_path)?)
    }

    /// In-memory database, used by tests and dry runs.
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS leads (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                address TEXT NOT NULL DEFAULT '',
                lat REAL,
                lng REAL,
                phone TEXT,
                email TEXT,
                website TEXT,
                instagram TEXT,
                linkedin TEXT,
                city TEXT NOT NULL DEFAULT '',
                business_type TEXT NOT NULL DEFAULT '',
                source TEXT NOT NULL DEFAULT '',
                meta TEXT NOT NULL DEFAULT '{}',
                last_updated TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_leads_name ON leads(name);
            ",
        )?;

        // Auto-migrations for columns added after the first release.
        Self::migrate_add_column_if_missing(&conn, "leads", "city", "TEXT NOT NULL DEFAULT ''")?;
        Self::migrate_add_column_if_missing(
            &conn,
            "leads",
            "business_type",
            "TEXT NOT NULL DEFAULT ''",
        )?;

        Ok(Self { conn })
    }

    /// Checks for a column and adds it to the table when absent.
    fn migrate_add_column_if_missing(
        conn: &Connection,
        table: &str,
        column: &str,
        column_def: &str,
    ) -> Result<(), StorageError> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
        let existing_columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<_, _>>()?;

        if !existing_columns.iter().any(|c| c == column) {
            let alter_sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def);
            conn.execute(&alter_sql, [])?;
        }

        Ok(())
    }

    /// Inserts a new lead or merges into an existing match (see `reconcile`).
    /// Returns the persisted id and whether a new row was created. Re-running
    /// with identical input never creates a duplicate and never drops contact
    /// history.
    pub fn upsert(&mut self, lead: &Lead) -> Result<(i64, bool), StorageError> {
        let name = lead.name.trim();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM leads WHERE name = ?1",
            LEAD_COLUMNS
        ))?;
        let stored: Vec<Lead> = stmt
            .query_map(params![name], Self::map_lead)?
            .collect::<Result<_, _>>()?;
        drop(stmt);

        match reconcile::find_match(&stored, &lead.name, &lead.address) {
            Some(idx) => {
                let mut existing = stored[idx].clone();
                reconcile::merge(&mut existing, lead);
                let id = existing.id.expect("stored lead always has an id");
                self.write_lead(id, &existing)?;
                Ok((id, false))
            }
            None => {
                // Fresh record: empty contact history regardless of input.
                let mut fresh = lead.clone();
                fresh.meta.contacted = false;
                fresh.meta.contact_history.clear();
                fresh.meta.last_contacted = None;
                let id = self.insert_lead(&fresh)?;
                Ok((id, true))
            }
        }
    }

    fn insert_lead(&self, lead: &Lead) -> Result<i64, StorageError> {
        let meta = serde_json::to_string(&lead.meta)?;
        self.conn.execute(
            "INSERT INTO leads (
                name, address, lat, lng, phone, email, website,
                instagram, linkedin, city, business_type, source, meta, last_updated
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                lead.name.trim(),
                &lead.address,
                lead.lat,
                lead.lng,
                &lead.phone,
                &lead.email,
                &lead.website,
                &lead.instagram,
                &lead.linkedin,
                &lead.city,
                &lead.business_type,
                &lead.source,
                meta,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn write_lead(&self, id: i64, lead: &Lead) -> Result<(), StorageError> {
        let meta = serde_json::to_string(&lead.meta)?;
        self.conn.execute(
            "UPDATE leads SET
                name = ?1, address = ?2, lat = ?3, lng = ?4, phone = ?5,
                email = ?6, website = ?7, instagram = ?8, linkedin = ?9,
                city = ?10, business_type = ?11, source = ?12, meta = ?13,
                last_updated = ?14
             WHERE id = ?15",
            params![
                lead.name.trim(),
                &lead.address,
                lead.lat,
                lead.lng,
                &lead.phone,
                &lead.email,
                &lead.website,
                &lead.instagram,
                &lead.linkedin,
                &lead.city,
                &lead.business_type,
                &lead.source,
                meta,
                Utc::now().to_rfc3339(),
                id,
            ],
        )?;
        Ok(())
    }

    /// Lists leads matching the filters, most recently updated first.
    pub fn fetch(&self, filter: &LeadFilter) -> Result<Vec<Lead>, StorageError> {
        let mut sql = format!("SELECT {} FROM leads", LEAD_COLUMNS);
        let mut where_parts = Vec::new();
        let mut args: Vec<String> = Vec::new();
        if let Some(name) = &filter.name_contains {
            where_parts.push("name LIKE ?");
            args.push(format!("%{}%", name));
        }
        if let Some(city) = &filter.city_contains {
            where_parts.push("city LIKE ?");
            args.push(format!("%{}%", city));
        }
        if let Some(btype) = &filter.type_contains {
            where_parts.push("business_type LIKE ?");
            args.push(format!("%{}%", btype));
        }
        if !where_parts.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_parts.join(" AND "));
        }
        sql.push_str(" ORDER BY last_updated DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args), Self::map_lead)?;
        let mut leads = Vec::new();
        for lead in rows {
            leads.push(lead?);
        }
        Ok(leads)
    }

    pub fn fetch_by_id(&self, id: i64) -> Result<Lead, StorageError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM leads WHERE id = ?1",
            LEAD_COLUMNS
        ))?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => Ok(Self::map_lead(row)?),
            None => Err(StorageError::NotFound(id)),
        }
    }

    /// Appends a contact event and flips the contacted flag. Prior events are
    /// never removed.
    pub fn mark_contacted(
        &mut self,
        id: i64,
        method: &str,
        contact_email: Option<&str>,
        note: Option<&str>,
    ) -> Result<LeadMeta, StorageError> {
        let mut lead = self.fetch_by_id(id)?;
        let event = ContactEvent {
            timestamp: Utc::now(),
            method: method.to_string(),
            email: contact_email.map(str::to_string),
            note: note.map(str::to_string),
        };
        lead.meta.last_contacted = Some(event.timestamp);
        lead.meta.contact_history.push(event);
        lead.meta.contacted = true;
        self.write_lead(id, &lead)?;
        Ok(lead.meta)
    }

    pub fn delete(&mut self, id: i64) -> Result<(), StorageError> {
        let affected = self
            .conn
            .execute("DELETE FROM leads WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(StorageError::NotFound(id));
        }
        Ok(())
    }

    fn map_lead(row: &Row) -> Result<Lead, rusqlite::Error> {
        let meta_str: String = row.get(13)?;
        let meta: LeadMeta = serde_json::from_str(&meta_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(13, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Lead {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            address: row.get(2)?,
            lat: row.get(3)?,
            lng: row.get(4)?,
            phone: row.get(5)?,
            email: row.get(6)?,
            website: row.get(7)?,
            instagram: row.get(8)?,
            linkedin: row.get(9)?,
            city: row.get(10)?,
            business_type: row.get(11)?,
            source: row.get(12)?,
            meta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(name: &str, address: &str) -> Lead {
        Lead {
            id: None,
            name: name.to_string(),
            address: address.to_string(),
            lat: Some(23.02),
            lng: Some(72.57),
            phone: None,
            email: None,
            website: None,
            instagram: None,
            linkedin: None,
            city: "Ahmedabad".to_string(),
            business_type: "dental clinic".to_string(),
            source: "composite".to_string(),
            meta: LeadMeta::default(),
        }
    }

    #[test]
    fn upsert_is_idempotent() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        let l = lead("Blue Cafe", "45 Main Street, Ahmedabad");

        let (id1, created1) = storage.upsert(&l).unwrap();
        let (id2, created2) = storage.upsert(&l).unwrap();
        assert!(created1);
        assert!(!created2);
        assert_eq!(id1, id2);
        assert_eq!(storage.fetch(&LeadFilter::default()).unwrap().len(), 1);
    }

    #[test]
    fn upsert_does_not_clobber_known_phone() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        let mut first = lead("Blue Cafe", "45 Main Street, Ahmedabad");
        first.phone = Some("123456".to_string());
        let (id, _) = storage.upsert(&first).unwrap();

        let mut second = lead("Blue Cafe", "45 Main Street, Ahmedabad");
        second.phone = None;
        storage.upsert(&second).unwrap();
        assert_eq!(
            storage.fetch_by_id(id).unwrap().phone.as_deref(),
            Some("123456")
        );

        // The inverse direction fills the blank.
        let mut third = lead("Blue Cafe", "45 Main Street, Ahmedabad");
        third.email = Some("hi@bluecafe.example".to_string());
        storage.upsert(&third).unwrap();
        assert_eq!(
            storage.fetch_by_id(id).unwrap().email.as_deref(),
            Some("hi@bluecafe.example")
        );
    }

    #[test]
    fn upsert_preserves_contact_history() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        let (id, _) = storage
            .upsert(&lead("Blue Cafe", "45 Main Street, Ahmedabad"))
            .unwrap();
        storage
            .mark_contacted(id, "email", Some("hi@bluecafe.example"), None)
            .unwrap();

        storage
            .upsert(&lead("Blue Cafe", "45 Main Street, Ahmedabad"))
            .unwrap();
        let stored = storage.fetch_by_id(id).unwrap();
        assert!(stored.meta.contacted);
        assert_eq!(stored.meta.contact_history.len(), 1);
    }

    #[test]
    fn insert_ignores_incoming_history() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        let mut l = lead("Blue Cafe", "45 Main Street, Ahmedabad");
        l.meta.contacted = true;
        l.meta.contact_history.push(ContactEvent {
            timestamp: Utc::now(),
            method: "email".to_string(),
            email: None,
            note: None,
        });
        let (id, created) = storage.upsert(&l).unwrap();
        assert!(created);
        let stored = storage.fetch_by_id(id).unwrap();
        assert!(!stored.meta.contacted);
        assert!(stored.meta.contact_history.is_empty());
    }

    #[test]
    fn mark_contacted_twice_appends() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        let (id, _) = storage
            .upsert(&lead("Blue Cafe", "45 Main Street, Ahmedabad"))
            .unwrap();

        storage.mark_contacted(id, "email", None, None).unwrap();
        let meta = storage
            .mark_contacted(id, "phone", None, Some("left voicemail"))
            .unwrap();
        assert_eq!(meta.contact_history.len(), 2);
        assert!(meta.contacted);
        assert_eq!(meta.last_contacted, Some(meta.contact_history[1].timestamp));
    }

    #[test]
    fn mark_contacted_unknown_id_is_not_found() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        let err = storage.mark_contacted(42, "email", None, None).unwrap_err();
        assert!(matches!(err, StorageError::NotFound(42)));
    }

    #[test]
    fn delete_missing_is_not_found() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        assert!(matches!(
            storage.delete(7).unwrap_err(),
            StorageError::NotFound(7)
        ));

        let (id, _) = storage
            .upsert(&lead("Blue Cafe", "45 Main Street, Ahmedabad"))
            .unwrap();
        storage.delete(id).unwrap();
        assert!(storage.fetch(&LeadFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn fetch_filters_by_substring() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        storage
            .upsert(&lead("Blue Cafe", "45 Main Street, Ahmedabad"))
            .unwrap();
        let mut other = lead("Red Salon", "9 Side Road, Rajkot");
        other.city = "Rajkot".to_string();
        other.business_type = "salon".to_string();
        storage.upsert(&other).unwrap();

        let filter = LeadFilter {
            city_contains: Some("Ahmedabad".to_string()),
            ..Default::default()
        };
        let rows = storage.fetch(&filter).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Blue Cafe");

        let filter = LeadFilter {
            type_contains: Some("salon".to_string()),
            name_contains: Some("Red".to_string()),
            ..Default::default()
        };
        assert_eq!(storage.fetch(&filter).unwrap().len(), 1);
    }
}
