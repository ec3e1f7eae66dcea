use roomkeep_core::db::open_db_in_memory;
use roomkeep_core::{
    BedDetailsPolicy, BedLine, CreateRoomInput, RoomPatch, RoomService, RoomServiceError,
    RoomUploads, SqliteRoomRepository, StoredPathResolver, UploadedFile, ROOM_CREATED_MESSAGE,
    ROOM_DELETED_MESSAGE, ROOM_UPDATED_MESSAGE,
};
use rusqlite::Connection;
use std::error::Error;

type Service<'conn> = RoomService<SqliteRoomRepository<'conn>, StoredPathResolver>;

fn service(conn: &Connection) -> Service<'_> {
    RoomService::new(
        SqliteRoomRepository::try_new(conn).unwrap(),
        StoredPathResolver::new(),
    )
}

fn ocean_view_input() -> CreateRoomInput {
    serde_json::from_str(
        r#"{
            "roomName": "Ocean View",
            "userId": "u1",
            "capacity": 2,
            "roomType": "suite",
            "price": 150,
            "bedDetails": "[{\"bedType\":\"queen\",\"bedCount\":1}]",
            "hasWifi": true
        }"#,
    )
    .unwrap()
}

fn uploads(pictures: &[&str], thumbnail: Option<&str>) -> RoomUploads {
    RoomUploads {
        pictures: pictures.iter().map(|path| UploadedFile::new(*path)).collect(),
        thumbnail: thumbnail.map(UploadedFile::new),
    }
}

fn patch(json: &str) -> RoomPatch {
    serde_json::from_str(json).unwrap()
}

fn queen(count: i64) -> BedLine {
    BedLine {
        bed_type: "queen".to_string(),
        count,
    }
}

#[test]
fn create_ocean_view_and_read_it_back() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let created = service
        .create_room(
            ocean_view_input(),
            &uploads(&["uploads/a.jpg", "uploads/b.jpg"], Some("uploads/t.jpg")),
        )
        .unwrap();
    assert_eq!(created.message, ROOM_CREATED_MESSAGE);
    assert!(!created.room_id.is_empty());

    let view = service.get_room(&created.room_id).unwrap();
    assert_eq!(view.room.room_name, "Ocean View");
    assert_eq!(view.room.user_id, "u1");
    assert_eq!(view.room.capacity, 2);
    assert_eq!(view.room.price, 150.0);
    assert_eq!(view.room.thumbnail.as_deref(), Some("uploads/t.jpg"));
    assert!(!view.room.is_occupied);
    assert!(view.room.amenities.has_wifi);
    assert!(!view.room.amenities.has_tv);
    assert_eq!(view.bed_details, vec![queen(1)]);
    assert_eq!(view.pictures, vec!["uploads/a.jpg", "uploads/b.jpg"]);
}

#[test]
fn create_generates_distinct_ids() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let first = service
        .create_room(ocean_view_input(), &RoomUploads::default())
        .unwrap();
    let second = service
        .create_room(ocean_view_input(), &RoomUploads::default())
        .unwrap();
    assert_ne!(first.room_id, second.room_id);
    assert_eq!(service.list_rooms().unwrap().len(), 2);
}

#[test]
fn create_without_bed_details_stores_no_lines() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let mut input = ocean_view_input();
    input.bed_details = None;

    let created = service.create_room(input, &RoomUploads::default()).unwrap();

    let view = service.get_room(&created.room_id).unwrap();
    assert!(view.bed_details.is_empty());
    assert!(view.pictures.is_empty());
    assert_eq!(view.room.thumbnail, None);
}

#[test]
fn create_rejects_missing_required_field() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let mut input = ocean_view_input();
    input.room_name = None;

    let err = service
        .create_room(input, &RoomUploads::default())
        .unwrap_err();
    assert!(matches!(err, RoomServiceError::InvalidInput(ref message) if message.contains("roomName")));
    assert!(service.list_rooms().unwrap().is_empty());
}

#[test]
fn create_rejects_out_of_range_values() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut zero_capacity = ocean_view_input();
    zero_capacity.capacity = Some(0);
    assert_eq!(
        service
            .create_room(zero_capacity, &RoomUploads::default())
            .unwrap_err()
            .code(),
        "invalid_input"
    );

    let mut negative_price = ocean_view_input();
    negative_price.price = Some(-1.0);
    assert_eq!(
        service
            .create_room(negative_price, &RoomUploads::default())
            .unwrap_err()
            .code(),
        "invalid_input"
    );
}

#[test]
fn create_rejects_malformed_bed_details() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let mut input = ocean_view_input();
    input.bed_details = Some("not json".into());

    let err = service
        .create_room(input, &RoomUploads::default())
        .unwrap_err();
    assert!(matches!(err, RoomServiceError::InvalidInput(_)));
    assert!(service.list_rooms().unwrap().is_empty());
}

#[test]
fn create_is_atomic_when_a_bed_insert_fails() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    conn.execute_batch(
        "CREATE TRIGGER block_bed_insert BEFORE INSERT ON roombed
         BEGIN SELECT RAISE(ABORT, 'bed insert blocked'); END;",
    )
    .unwrap();

    let err = service
        .create_room(ocean_view_input(), &uploads(&["uploads/a.jpg"], None))
        .unwrap_err();
    assert!(matches!(err, RoomServiceError::StoreUnavailable(_)));
    assert!(!err.to_string().contains("bed insert blocked"));
    assert!(err.source().is_some());
    assert!(service.list_rooms().unwrap().is_empty());
}

#[test]
fn get_unknown_room_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service.get_room("missing").unwrap_err();
    assert!(matches!(err, RoomServiceError::NotFound(ref id) if id == "missing"));
    assert_eq!(err.code(), "not_found");
}

#[test]
fn edit_price_only_keeps_every_other_field() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service
        .create_room(
            ocean_view_input(),
            &uploads(&["uploads/a.jpg"], Some("uploads/t.jpg")),
        )
        .unwrap();
    let before = service.get_room(&created.room_id).unwrap();

    let edited = service
        .edit_room(&created.room_id, patch(r#"{"price":175}"#), &RoomUploads::default())
        .unwrap();
    assert_eq!(edited.message, ROOM_UPDATED_MESSAGE);
    assert_eq!(edited.room_id, created.room_id);

    let after = service.get_room(&created.room_id).unwrap();
    assert_eq!(after.room.price, 175.0);
    assert_eq!(after.room.room_name, before.room.room_name);
    assert_eq!(after.room.capacity, before.room.capacity);
    assert_eq!(after.room.amenities, before.room.amenities);
    assert_eq!(after.room.thumbnail, before.room.thumbnail);
    assert_eq!(after.bed_details, before.bed_details);
    assert_eq!(after.pictures, before.pictures);
}

#[test]
fn edit_applies_falsy_supplied_values() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let mut input = ocean_view_input();
    input.description = Some("sea facing".to_string());
    let created = service.create_room(input, &RoomUploads::default()).unwrap();

    service
        .edit_room(
            &created.room_id,
            patch(r#"{"hasWifi":false,"price":0,"description":null}"#),
            &RoomUploads::default(),
        )
        .unwrap();

    let room = service.get_room(&created.room_id).unwrap().room;
    assert!(!room.amenities.has_wifi);
    assert_eq!(room.price, 0.0);
    assert_eq!(room.description, None);
}

#[test]
fn edit_accepts_empty_strings_for_text_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service
        .create_room(ocean_view_input(), &RoomUploads::default())
        .unwrap();

    service
        .edit_room(
            &created.room_id,
            patch(r#"{"roomName":"","roomType":""}"#),
            &RoomUploads::default(),
        )
        .unwrap();

    let room = service.get_room(&created.room_id).unwrap().room;
    assert_eq!(room.room_name, "");
    assert_eq!(room.room_type, "");
    assert_eq!(room.capacity, 2);
}

#[test]
fn create_accepts_empty_room_name() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let mut input = ocean_view_input();
    input.room_name = Some(String::new());

    let created = service.create_room(input, &RoomUploads::default()).unwrap();

    let view = service.get_room(&created.room_id).unwrap();
    assert_eq!(view.room.room_name, "");
    assert_eq!(view.room.room_type, "suite");
}

#[test]
fn edit_ignores_owner_and_occupancy_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service
        .create_room(ocean_view_input(), &RoomUploads::default())
        .unwrap();

    service
        .edit_room(
            &created.room_id,
            patch(r#"{"userId":"u2","isOccupied":true,"roomName":"Harbor View"}"#),
            &RoomUploads::default(),
        )
        .unwrap();

    let room = service.get_room(&created.room_id).unwrap().room;
    assert_eq!(room.room_name, "Harbor View");
    assert_eq!(room.user_id, "u1");
    assert!(!room.is_occupied);
}

#[test]
fn append_policy_accumulates_bed_lines() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service
        .create_room(ocean_view_input(), &RoomUploads::default())
        .unwrap();

    let edit = r#"{"bedDetails":[{"bedType":"queen","bedCount":1}]}"#;
    service
        .edit_room(&created.room_id, patch(edit), &RoomUploads::default())
        .unwrap();
    service
        .edit_room(&created.room_id, patch(edit), &RoomUploads::default())
        .unwrap();
    assert_eq!(
        service.get_room(&created.room_id).unwrap().bed_details,
        vec![queen(1), queen(1), queen(1)]
    );

    service
        .edit_room(&created.room_id, patch(r#"{"capacity":3}"#), &RoomUploads::default())
        .unwrap();
    assert_eq!(
        service.get_room(&created.room_id).unwrap().bed_details.len(),
        3
    );
}

#[test]
fn replace_policy_swaps_bed_lines() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn).with_bed_policy(BedDetailsPolicy::Replace);
    let created = service
        .create_room(ocean_view_input(), &RoomUploads::default())
        .unwrap();

    service
        .edit_room(
            &created.room_id,
            patch(r#"{"bedDetails":"[{\"bedType\":\"queen\",\"bedCount\":2}]"}"#),
            &RoomUploads::default(),
        )
        .unwrap();
    assert_eq!(
        service.get_room(&created.room_id).unwrap().bed_details,
        vec![queen(2)]
    );

    service
        .edit_room(&created.room_id, patch(r#"{"bedDetails":[]}"#), &RoomUploads::default())
        .unwrap();
    assert!(service
        .get_room(&created.room_id)
        .unwrap()
        .bed_details
        .is_empty());
}

#[test]
fn edit_with_malformed_bed_details_changes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service
        .create_room(ocean_view_input(), &RoomUploads::default())
        .unwrap();

    let err = service
        .edit_room(
            &created.room_id,
            patch(r#"{"price":999,"bedDetails":"[{\"bedType\":"}"#),
            &RoomUploads::default(),
        )
        .unwrap_err();
    assert!(matches!(err, RoomServiceError::InvalidInput(_)));

    let view = service.get_room(&created.room_id).unwrap();
    assert_eq!(view.room.price, 150.0);
    assert_eq!(view.bed_details, vec![queen(1)]);
}

#[test]
fn edit_rejects_invalid_merged_values() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service
        .create_room(ocean_view_input(), &RoomUploads::default())
        .unwrap();

    let err = service
        .edit_room(&created.room_id, patch(r#"{"capacity":0}"#), &RoomUploads::default())
        .unwrap_err();
    assert!(matches!(err, RoomServiceError::InvalidInput(_)));
    assert_eq!(service.get_room(&created.room_id).unwrap().room.capacity, 2);
}

#[test]
fn edit_unknown_room_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service
        .edit_room("missing", patch(r#"{"price":175}"#), &RoomUploads::default())
        .unwrap_err();
    assert!(matches!(err, RoomServiceError::NotFound(_)));
}

#[test]
fn edit_replaces_pictures_and_thumbnail_only_when_uploaded() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service
        .create_room(
            ocean_view_input(),
            &uploads(&["uploads/old.jpg"], Some("uploads/old-thumb.jpg")),
        )
        .unwrap();

    service
        .edit_room(&created.room_id, patch("{}"), &RoomUploads::default())
        .unwrap();
    let view = service.get_room(&created.room_id).unwrap();
    assert_eq!(view.pictures, vec!["uploads/old.jpg"]);
    assert_eq!(view.room.thumbnail.as_deref(), Some("uploads/old-thumb.jpg"));

    service
        .edit_room(
            &created.room_id,
            patch("{}"),
            &uploads(&["uploads/new1.jpg", "uploads/new2.jpg"], None),
        )
        .unwrap();
    let view = service.get_room(&created.room_id).unwrap();
    assert_eq!(view.pictures, vec!["uploads/new1.jpg", "uploads/new2.jpg"]);
    assert_eq!(view.room.thumbnail.as_deref(), Some("uploads/old-thumb.jpg"));

    service
        .edit_room(
            &created.room_id,
            patch("{}"),
            &uploads(&[], Some("uploads/new-thumb.jpg")),
        )
        .unwrap();
    let view = service.get_room(&created.room_id).unwrap();
    assert_eq!(view.pictures, vec!["uploads/new1.jpg", "uploads/new2.jpg"]);
    assert_eq!(view.room.thumbnail.as_deref(), Some("uploads/new-thumb.jpg"));
}

#[test]
fn delete_removes_room_then_get_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service
        .create_room(ocean_view_input(), &uploads(&["uploads/a.jpg"], None))
        .unwrap();

    assert_eq!(service.delete_room(&created.room_id).unwrap(), ROOM_DELETED_MESSAGE);
    assert!(matches!(
        service.get_room(&created.room_id),
        Err(RoomServiceError::NotFound(_))
    ));
}

#[test]
fn delete_unknown_room_succeeds() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    assert_eq!(service.delete_room("missing").unwrap(), ROOM_DELETED_MESSAGE);
}

#[test]
fn failed_delete_reports_deletion_failed_and_keeps_aggregate() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service
        .create_room(ocean_view_input(), &uploads(&["uploads/a.jpg"], None))
        .unwrap();
    conn.execute_batch(
        "CREATE TRIGGER block_picture_delete BEFORE DELETE ON roomsPictures
         BEGIN SELECT RAISE(ABORT, 'picture delete blocked'); END;",
    )
    .unwrap();

    let err = service.delete_room(&created.room_id).unwrap_err();
    assert!(matches!(
        err,
        RoomServiceError::DeletionFailed { ref room_id, .. } if *room_id == created.room_id
    ));
    assert_eq!(err.code(), "deletion_failed");

    let view = service.get_room(&created.room_id).unwrap();
    assert_eq!(view.bed_details, vec![queen(1)]);
    assert_eq!(view.pictures, vec!["uploads/a.jpg"]);
}
