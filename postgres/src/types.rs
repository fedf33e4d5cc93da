use pg_escape::quote_identifier;
use std::fmt;

/// The schema Postgres puts unqualified tables into.
pub const DEFAULT_SCHEMA: &str = "public";

/// A fully qualified Postgres table name consisting of a schema and table name.
///
/// This type represents a table identifier in Postgres, which requires both a schema name
/// and a table name. It provides methods for formatting the name in different contexts.
#[derive(Debug, Clone, Eq, PartialEq, PartialOrd, Ord)]
pub struct TableName {
    /// The schema name containing the table
    pub schema: String,
    /// The name of the table within the schema
    pub name: String,
}

impl TableName {
    pub fn new(schema: String, name: String) -> TableName {
        Self { schema, name }
    }

    /// Returns the table name as a properly quoted Postgres identifier.
    ///
    /// This method ensures the schema and table names are properly escaped according to
    /// Postgres identifier quoting rules.
    pub fn as_quoted_identifier(&self) -> String {
        let quoted_schema = quote_identifier(&self.schema);
        let quoted_name = quote_identifier(&self.name);

        format!("{quoted_schema}.{quoted_name}")
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{0}.{1}", self.schema, self.name))
    }
}

/// Parses a table name, defaulting the schema to [`DEFAULT_SCHEMA`] when the
/// value carries no `schema.` prefix.
impl From<&str> for TableName {
    fn from(value: &str) -> Self {
        match value.split_once('.') {
            Some((schema, name)) => TableName::new(schema.to_owned(), name.to_owned()),
            None => TableName::new(DEFAULT_SCHEMA.to_owned(), value.to_owned()),
        }
    }
}

impl From<String> for TableName {
    fn from(value: String) -> Self {
        value.as_str().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_name_defaults_to_public_schema() {
        let table: TableName = "products".into();

        assert_eq!(table.schema, "public");
        assert_eq!(table.name, "products");
        assert_eq!(table.as_quoted_identifier(), "public.products");
    }

    #[test]
    fn test_qualified_name_keeps_schema() {
        let table: TableName = "staging.products".into();

        assert_eq!(table.schema, "staging");
        assert_eq!(table.to_string(), "staging.products");
    }

    #[test]
    fn test_mixed_case_names_are_quoted() {
        let table = TableName::new("public".to_owned(), "Products".to_owned());

        assert_eq!(table.as_quoted_identifier(), r#"public."Products""#);
    }
}
