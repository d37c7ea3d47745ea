//! Exposure source backed by a SQLite mirror of the observatory database.
//!
//! Expects an `exposure` table:
//!
//! ```text
//! id INTEGER, exptime REAL, filter TEXT, date TEXT (ISO-8601, UTC),
//! qc_teff REAL, ra REAL, declination REAL, object TEXT,
//! flavor TEXT, propid TEXT
//! ```

use std::path::Path;

use rusqlite::{Connection, OpenFlags, params};

use crate::ingest::parse_time;

use super::{ExposureRow, ExposureSource, ExtractError, NightRange, Result, night_of};

const EXPOSURE_QUERY: &str = "
    SELECT id, exptime, filter, date, qc_teff, ra, declination, COALESCE(object, '')
    FROM exposure
    WHERE flavor = 'object'
      AND propid = ?1
      AND qc_teff > 0
    ORDER BY id";

pub struct SqliteExposureSource {
    conn: Connection,
}

impl SqliteExposureSource {
    /// Open an existing database read-only.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }
}

impl ExposureSource for SqliteExposureSource {
    fn exposures(&self, propid: &str, nights: NightRange) -> Result<Vec<ExposureRow>> {
        let mut stmt = self.conn.prepare(EXPOSURE_QUERY)?;
        let raw = stmt.query_map(params![propid], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, f64>(6)?,
                row.get::<_, String>(7)?,
            ))
        })?;

        let mut exposures = Vec::new();
        for row in raw {
            let (id, exptime, filter, date, qc_teff, ra, dec, object) = row?;
            let date = parse_time(&date).map_err(|source| ExtractError::ExposureDate {
                id,
                value: date.clone(),
                source,
            })?;
            if !nights.contains(night_of(date)) {
                continue;
            }
            exposures.push(ExposureRow {
                id,
                exptime,
                filter,
                date,
                qc_teff,
                ra,
                dec,
                object,
            });
        }
        Ok(exposures)
    }
}
