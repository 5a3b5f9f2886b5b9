/// Outcome of an insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertResult {
    /// Number of rows inserted.
    pub rows_affected: u64,

    /// Identifier generated for the first inserted row.
    pub inserted_id: Option<i64>,
}

/// Outcome of an update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateResult {
    /// Number of rows updated.
    pub rows_affected: u64,
}

/// Outcome of a delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteResult {
    /// Number of rows deleted.
    pub rows_affected: u64,
}

/// A row inserted by an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertInsert {
    /// Position of the row in the upserted data.
    pub index: usize,

    /// Identifier generated for the row.
    pub id: Option<i64>,
}

/// Outcome of an upsert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertResult {
    /// Rows that had no match and were inserted.
    pub inserts: Vec<UpsertInsert>,

    /// Positions of rows that matched an existing row.
    pub updates: Vec<usize>,

    /// Total number of rows inserted or updated.
    pub rows_affected: u64,
}

impl UpsertResult {
    /// Identifier generated for the first inserted row.
    #[must_use]
    pub fn inserted_id(&self) -> Option<i64> {
        self.inserts.first().and_then(|insert| insert.id)
    }
}
