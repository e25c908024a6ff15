use sqlx::PgPool;

/// A database that receives image rows.
#[derive(Debug, Clone)]
pub struct DbTarget {
    /// Redacted label used in logs, e.g. `localhost:5432/postgres`.
    pub label: String,
    pub pool: PgPool,
}

impl DbTarget {
    #[must_use]
    pub fn new(label: impl Into<String>, pool: PgPool) -> Self {
        Self {
            label: label.into(),
            pool,
        }
    }
}

/// The primary database plus any mirrors kept in sync with it.
///
/// Primary failures fail the image; mirror failures are only counted.
#[derive(Debug, Clone)]
pub struct Targets {
    pub primary: DbTarget,
    pub mirrors: Vec<DbTarget>,
}

impl Targets {
    #[must_use]
    pub fn primary_only(primary: DbTarget) -> Self {
        Self {
            primary,
            mirrors: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_mirror(mut self, mirror: DbTarget) -> Self {
        self.mirrors.push(mirror);
        self
    }

    #[must_use]
    pub fn has_mirrors(&self) -> bool {
        !self.mirrors.is_empty()
    }
}
