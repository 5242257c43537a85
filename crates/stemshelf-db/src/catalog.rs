//! Read-only catalog queries.
//!
//! Each function runs exactly one parameterized statement on the connection
//! it is handed and shapes the rows for the HTTP layer.

use std::collections::BTreeMap;

use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Number, Value};

use crate::error::StoreError;

/// Returns every artist name, sorted ascending. Duplicate names are kept.
pub fn artist_names(conn: &Connection) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare("SELECT name FROM artist ORDER BY name")?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(names)
}

/// Returns every song row with all of its columns, keyed by column name.
///
/// Values keep their stored SQLite type.
///
/// # Errors
///
/// Returns `StoreError::UnrepresentableValue` if a row holds a BLOB, a
/// non-finite REAL or TEXT that is not valid UTF-8.
pub fn songs(conn: &Connection) -> Result<Vec<Map<String, Value>>, StoreError> {
    let mut stmt = conn.prepare("SELECT * FROM songs")?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = stmt.query([])?;
    let mut songs = Vec::new();
    while let Some(row) = rows.next()? {
        let mut song = Map::new();
        for (idx, column) in columns.iter().enumerate() {
            song.insert(column.clone(), column_value(column, row.get_ref(idx)?)?);
        }
        songs.push(song);
    }

    Ok(songs)
}

fn column_value(column: &str, value: ValueRef<'_>) -> Result<Value, StoreError> {
    let unrepresentable = |kind| StoreError::UnrepresentableValue {
        column: column.to_string(),
        kind,
    };

    match value {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(i) => Ok(Value::from(i)),
        ValueRef::Real(f) => Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| unrepresentable("non-finite REAL")),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|text| Value::String(text.to_string()))
            .map_err(|_| unrepresentable("non-UTF-8 TEXT")),
        ValueRef::Blob(_) => Err(unrepresentable("BLOB")),
    }
}

/// Picks one song by the named artist uniformly at random.
///
/// Returns `None` when the artist is unknown or has no songs.
pub fn random_song_by_artist(
    conn: &Connection,
    artist_name: &str,
) -> Result<Option<String>, StoreError> {
    let song = conn
        .query_row(
            "SELECT s.name AS song_name
             FROM songs s
             JOIN artist a ON s.artist_id = a.id
             WHERE a.name = ?1
             ORDER BY RANDOM()
             LIMIT 1",
            params![artist_name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(song)
}

/// Returns the names of all songs by the named artist in insertion order.
pub fn songs_by_artist(conn: &Connection, artist_name: &str) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT s.name AS song_name
         FROM songs s
         JOIN artist a ON s.artist_id = a.id
         WHERE a.name = ?1
         ORDER BY s.id",
    )?;
    let songs = stmt
        .query_map(params![artist_name], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(songs)
}

/// Returns the isolated tracks of one song as a `track_type -> filename` map.
///
/// When several tracks share a type, the one with the highest id wins.
pub fn isolated_tracks(
    conn: &Connection,
    song_name: &str,
    artist_name: &str,
) -> Result<BTreeMap<String, String>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT it.track_type, it.filename
         FROM isolated_tracks it
         JOIN songs s ON it.song_id = s.id
         JOIN artist a ON s.artist_id = a.id
         WHERE s.name = ?1 AND a.name = ?2
         ORDER BY it.track_type, it.id",
    )?;

    let mut tracks = BTreeMap::new();
    let rows = stmt.query_map(params![song_name, artist_name], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (track_type, filename) = row?;
        tracks.insert(track_type, filename);
    }

    Ok(tracks)
}
