use redb::TableDefinition;

/// Users: user_id -> User (msgpack)
pub const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Unique index: normalized email -> user_id
pub const USER_EMAILS: TableDefinition<&str, &str> = TableDefinition::new("user_emails");

/// Device-local session: fixed key -> Session (msgpack)
pub const DEVICE_SESSION: TableDefinition<&str, &[u8]> = TableDefinition::new("device_session");
