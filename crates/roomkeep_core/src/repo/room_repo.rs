//! Room aggregate repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Read rooms with their bed, bathroom and picture lines.
//! - Write the room row and its dependent lines as one transaction.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Every write path runs inside a single `BEGIN IMMEDIATE` transaction;
//!   an error on any statement rolls back the whole aggregate write.
//! - Deletion removes child rows before the parent row.
//! - Read paths reject invalid persisted flags instead of masking them.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::room::{
    Amenities, BathroomLine, BedLine, Room, RoomId, RoomSummary, RoomView, AMENITY_COLUMNS,
};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ROOM_SELECT_SQL: &str = "SELECT
    roomId,
    userId,
    roomName,
    capacity,
    description,
    roomType,
    price,
    thumbnail,
    isOccupied,
    hasWifi,
    hasKitchen,
    hasTV,
    hasShower,
    hasAircon,
    hasGrill,
    hasRefrigerator,
    hasHeater
FROM rooms";

const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    (
        "rooms",
        &[
            "roomId",
            "userId",
            "roomName",
            "capacity",
            "description",
            "roomType",
            "price",
            "thumbnail",
            "isOccupied",
            "hasWifi",
            "hasKitchen",
            "hasTV",
            "hasShower",
            "hasAircon",
            "hasGrill",
            "hasRefrigerator",
            "hasHeater",
        ],
    ),
    ("roombed", &["roomId", "bedType", "count"]),
    ("roomBathroom", &["roomId", "bathRoomType", "count"]),
    ("roomsPictures", &["roomId", "picture"]),
];

pub type RoomRepoResult<T> = Result<T, RoomRepoError>;

/// Repository error for room persistence and query operations.
#[derive(Debug)]
pub enum RoomRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target room row does not exist.
    NotFound(RoomId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RoomRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "room not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "room repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "room repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "room repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted room data: {message}"),
        }
    }
}

impl Error for RoomRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RoomRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RoomRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// How an edit treats existing bed lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BedWrite<'a> {
    /// Leave bed lines untouched.
    Keep,
    /// Insert the given lines after the existing ones.
    Append(&'a [BedLine]),
    /// Delete existing lines, then insert the given ones.
    Replace(&'a [BedLine]),
}

/// One aggregate edit, applied atomically by [`RoomRepository::update_room`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomUpdate<'a> {
    /// Merged room row. `room_id`, `user_id` and `is_occupied` are not written.
    pub room: &'a Room,
    pub beds: BedWrite<'a>,
    /// `Some` replaces the whole picture set; `None` keeps it.
    pub pictures: Option<&'a [String]>,
}

/// Repository interface for room aggregate operations.
pub trait RoomRepository {
    /// Lists every room as a summary with its pictures.
    fn list_rooms(&self) -> RoomRepoResult<Vec<RoomSummary>>;
    /// Loads the full aggregate for one room.
    fn get_room(&self, room_id: &str) -> RoomRepoResult<Option<RoomView>>;
    /// Inserts the room row, its bed lines and its pictures.
    fn create_room(&self, room: &Room, beds: &[BedLine], pictures: &[String])
        -> RoomRepoResult<()>;
    /// Rewrites room attributes and applies line changes.
    fn update_room(&self, update: &RoomUpdate<'_>) -> RoomRepoResult<()>;
    /// Deletes the room and every dependent line. Unknown ids are a no-op.
    fn delete_room(&self, room_id: &str) -> RoomRepoResult<()>;
}

/// SQLite-backed room repository.
pub struct SqliteRoomRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRoomRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RoomRepoResult<Self> {
        ensure_room_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl RoomRepository for SqliteRoomRepository<'_> {
    fn list_rooms(&self) -> RoomRepoResult<Vec<RoomSummary>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        let mut rooms = Vec::new();
        {
            let mut stmt = tx.prepare(
                "SELECT
                    roomId,
                    roomName,
                    userId,
                    capacity,
                    price,
                    thumbnail,
                    isOccupied
                 FROM rooms
                 ORDER BY roomName ASC, roomId ASC;",
            )?;

            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let room_id: String = row.get("roomId")?;
                let pictures = load_pictures(&tx, &room_id)?;
                rooms.push(RoomSummary {
                    room_name: row.get("roomName")?,
                    user_id: row.get("userId")?,
                    capacity: row.get("capacity")?,
                    price: row.get("price")?,
                    thumbnail: row.get("thumbnail")?,
                    is_occupied: parse_flag(row, "isOccupied")?,
                    pictures,
                    room_id,
                });
            }
        }
        tx.commit()?;

        Ok(rooms)
    }

    fn get_room(&self, room_id: &str) -> RoomRepoResult<Option<RoomView>> {
        // One read transaction so the row and its lines come from one snapshot.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        let room = tx
            .query_row(
                &format!("{ROOM_SELECT_SQL} WHERE roomId = ?1;"),
                [room_id],
                |row| Ok(parse_room_row(row)),
            )
            .optional()?
            .transpose()?;

        let Some(room) = room else {
            return Ok(None);
        };

        let view = RoomView {
            bed_details: load_bed_lines(&tx, room_id)?,
            bathroom_details: load_bathroom_lines(&tx, room_id)?,
            pictures: load_pictures(&tx, room_id)?,
            room,
        };
        tx.commit()?;

        Ok(Some(view))
    }

    fn create_room(
        &self,
        room: &Room,
        beds: &[BedLine],
        pictures: &[String],
    ) -> RoomRepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let [has_wifi, has_kitchen, has_tv, has_shower, has_aircon, has_grill, has_refrigerator, has_heater] =
            room.amenities.to_array().map(bool_to_int);
        tx.execute(
            "INSERT INTO rooms (
                roomId,
                userId,
                roomName,
                capacity,
                description,
                roomType,
                price,
                thumbnail,
                isOccupied,
                hasWifi,
                hasKitchen,
                hasTV,
                hasShower,
                hasAircon,
                hasGrill,
                hasRefrigerator,
                hasHeater
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17);",
            params![
                room.room_id.as_str(),
                room.user_id.as_str(),
                room.room_name.as_str(),
                room.capacity,
                room.description.as_deref(),
                room.room_type.as_str(),
                room.price,
                room.thumbnail.as_deref(),
                bool_to_int(room.is_occupied),
                has_wifi,
                has_kitchen,
                has_tv,
                has_shower,
                has_aircon,
                has_grill,
                has_refrigerator,
                has_heater,
            ],
        )?;
        insert_bed_lines(&tx, &room.room_id, beds)?;
        insert_pictures(&tx, &room.room_id, pictures)?;

        tx.commit()?;
        Ok(())
    }

    fn update_room(&self, update: &RoomUpdate<'_>) -> RoomRepoResult<()> {
        let room = update.room;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let [has_wifi, has_kitchen, has_tv, has_shower, has_aircon, has_grill, has_refrigerator, has_heater] =
            room.amenities.to_array().map(bool_to_int);
        let changed = tx.execute(
            "UPDATE rooms
             SET
                roomName = ?2,
                capacity = ?3,
                description = ?4,
                roomType = ?5,
                price = ?6,
                thumbnail = ?7,
                hasWifi = ?8,
                hasKitchen = ?9,
                hasTV = ?10,
                hasShower = ?11,
                hasAircon = ?12,
                hasGrill = ?13,
                hasRefrigerator = ?14,
                hasHeater = ?15
             WHERE roomId = ?1;",
            params![
                room.room_id.as_str(),
                room.room_name.as_str(),
                room.capacity,
                room.description.as_deref(),
                room.room_type.as_str(),
                room.price,
                room.thumbnail.as_deref(),
                has_wifi,
                has_kitchen,
                has_tv,
                has_shower,
                has_aircon,
                has_grill,
                has_refrigerator,
                has_heater,
            ],
        )?;
        if changed == 0 {
            return Err(RoomRepoError::NotFound(room.room_id.clone()));
        }

        match update.beds {
            BedWrite::Keep => {}
            BedWrite::Append(lines) => insert_bed_lines(&tx, &room.room_id, lines)?,
            BedWrite::Replace(lines) => {
                tx.execute("DELETE FROM roombed WHERE roomId = ?1;", [room.room_id.as_str()])?;
                insert_bed_lines(&tx, &room.room_id, lines)?;
            }
        }

        if let Some(pictures) = update.pictures {
            tx.execute(
                "DELETE FROM roomsPictures WHERE roomId = ?1;",
                [room.room_id.as_str()],
            )?;
            insert_pictures(&tx, &room.room_id, pictures)?;
        }

        tx.commit()?;
        Ok(())
    }

    fn delete_room(&self, room_id: &str) -> RoomRepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for sql in [
            "DELETE FROM roombed WHERE roomId = ?1;",
            "DELETE FROM roomBathroom WHERE roomId = ?1;",
            "DELETE FROM roomsPictures WHERE roomId = ?1;",
            "DELETE FROM rooms WHERE roomId = ?1;",
        ] {
            tx.execute(sql, [room_id])?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn insert_bed_lines(conn: &Connection, room_id: &str, lines: &[BedLine]) -> RoomRepoResult<()> {
    let mut stmt =
        conn.prepare_cached("INSERT INTO roombed (roomId, bedType, count) VALUES (?1, ?2, ?3);")?;
    for line in lines {
        stmt.execute(params![room_id, line.bed_type.as_str(), line.count])?;
    }
    Ok(())
}

fn insert_pictures(conn: &Connection, room_id: &str, pictures: &[String]) -> RoomRepoResult<()> {
    let mut stmt =
        conn.prepare_cached("INSERT INTO roomsPictures (roomId, picture) VALUES (?1, ?2);")?;
    for picture in pictures {
        stmt.execute(params![room_id, picture.as_str()])?;
    }
    Ok(())
}

fn load_bed_lines(conn: &Connection, room_id: &str) -> RoomRepoResult<Vec<BedLine>> {
    let mut stmt = conn.prepare(
        "SELECT bedType, count
         FROM roombed
         WHERE roomId = ?1
         ORDER BY rowid ASC;",
    )?;
    let mut rows = stmt.query([room_id])?;
    let mut lines = Vec::new();
    while let Some(row) = rows.next()? {
        lines.push(BedLine {
            bed_type: row.get("bedType")?,
            count: row.get("count")?,
        });
    }
    Ok(lines)
}

fn load_bathroom_lines(conn: &Connection, room_id: &str) -> RoomRepoResult<Vec<BathroomLine>> {
    let mut stmt = conn.prepare(
        "SELECT bathRoomType, count
         FROM roomBathroom
         WHERE roomId = ?1
         ORDER BY rowid ASC;",
    )?;
    let mut rows = stmt.query([room_id])?;
    let mut lines = Vec::new();
    while let Some(row) = rows.next()? {
        lines.push(BathroomLine {
            bath_room_type: row.get("bathRoomType")?,
            count: row.get("count")?,
        });
    }
    Ok(lines)
}

fn load_pictures(conn: &Connection, room_id: &str) -> RoomRepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT picture
         FROM roomsPictures
         WHERE roomId = ?1
         ORDER BY rowid ASC;",
    )?;
    let mut rows = stmt.query([room_id])?;
    let mut pictures = Vec::new();
    while let Some(row) = rows.next()? {
        pictures.push(row.get(0)?);
    }
    Ok(pictures)
}

fn parse_room_row(row: &Row<'_>) -> RoomRepoResult<Room> {
    let mut flags = [false; 8];
    for (flag, column) in flags.iter_mut().zip(AMENITY_COLUMNS) {
        *flag = parse_flag(row, column)?;
    }

    Ok(Room {
        room_id: row.get("roomId")?,
        user_id: row.get("userId")?,
        room_name: row.get("roomName")?,
        capacity: row.get("capacity")?,
        room_type: row.get("roomType")?,
        price: row.get("price")?,
        description: row.get("description")?,
        thumbnail: row.get("thumbnail")?,
        is_occupied: parse_flag(row, "isOccupied")?,
        amenities: Amenities::from_array(flags),
    })
}

fn parse_flag(row: &Row<'_>, column: &str) -> RoomRepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RoomRepoError::InvalidData(format!(
            "invalid boolean value `{other}` in rooms.{column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_room_connection_ready(conn: &Connection) -> RoomRepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RoomRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in REQUIRED_COLUMNS {
        if !table_exists(conn, table)? {
            return Err(RoomRepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RoomRepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RoomRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RoomRepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
