/// Table metadata for a model: which database it lives in, the table it maps to
/// and its primary key columns.
///
/// Descriptors are immutable. Models usually build theirs once, behind a
/// `LazyLock`, and hand out a `&'static` reference:
///
/// ```ignore
/// fn descriptor() -> &'static ModelDescriptor {
///     static DESCRIPTOR: LazyLock<ModelDescriptor> = LazyLock::new(|| {
///         ModelDescriptor::new("db1", "first_one").with_alias("fo").with_primary_key_names(["id"])
///     });
///     &DESCRIPTOR
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    database: String,
    table_name: String,
    table_alias: Option<String>,
    primary_key_names: Vec<String>,
}

impl ModelDescriptor {
    /// Creates a descriptor for `table_name` in `database`.
    #[must_use]
    pub fn new(database: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table_name: table_name.into(),
            table_alias: None,
            primary_key_names: Vec::new(),
        }
    }

    /// Returns a copy using `alias` for the table in select queries.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.table_alias = Some(alias.into());
        self
    }

    /// Returns a copy with the given primary key columns, in declaration order.
    #[must_use]
    pub fn with_primary_key_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Database identifier passed to the connection provider.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Table alias, if any.
    #[must_use]
    pub fn table_alias(&self) -> Option<&str> {
        self.table_alias.as_deref()
    }

    /// Primary key column names.
    #[must_use]
    pub fn primary_key_names(&self) -> &[String] {
        &self.primary_key_names
    }

    /// The primary key column when exactly one is declared.
    #[must_use]
    pub fn single_primary_key(&self) -> Option<&str> {
        match self.primary_key_names.as_slice() {
            [pk] => Some(pk),
            _ => None,
        }
    }

    /// Name used to qualify columns in select queries: the alias when set, otherwise
    /// the table name.
    #[must_use]
    pub fn qualifier(&self) -> &str {
        self.table_alias.as_deref().unwrap_or(&self.table_name)
    }
}

#[cfg(test)]
mod tests {
    use super::ModelDescriptor;

    #[test]
    fn accessors() {
        let descriptor = ModelDescriptor::new("db1", "first_one").with_alias("fo");

        assert_eq!(descriptor.database(), "db1");
        assert_eq!(descriptor.table_name(), "first_one");
        assert_eq!(descriptor.table_alias(), Some("fo"));
        assert_eq!(descriptor.qualifier(), "fo");
        assert!(descriptor.primary_key_names().is_empty());
    }

    #[test]
    fn qualifier_without_alias() {
        let descriptor = ModelDescriptor::new("db2", "second_two");
        assert_eq!(descriptor.table_alias(), None);
        assert_eq!(descriptor.qualifier(), "second_two");
    }

    #[test]
    fn primary_keys() {
        let base = ModelDescriptor::new("db1", "enrollments");
        let single = base.clone().with_primary_key_names(["id"]);
        let composite = base.clone().with_primary_key_names(["student_id", "course_id"]);

        // the original is unchanged
        assert!(base.primary_key_names().is_empty());
        assert_eq!(base.single_primary_key(), None);

        assert_eq!(single.single_primary_key(), Some("id"));
        assert_eq!(composite.primary_key_names(), ["student_id", "course_id"]);
        assert_eq!(composite.single_primary_key(), None);
    }
}
