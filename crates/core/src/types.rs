/// All entity identifiers are UUIDv4, assigned by the store on insert.
pub type EntityId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
