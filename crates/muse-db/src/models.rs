/// Credentials row from either the `users` or the `artists` table.
/// Messages leave the DB layer as `muse_types::models::Message` since their
/// columns carry no storage-only data.
pub struct AccountRow {
    pub id: i64,
    pub name: String,
    pub password: String,
}
