//! PostgreSQL Repository Implementations
//!
//! Repositories are implemented on `kernel`'s `PgUnitOfWork`, so every query
//! runs on the connection of the transaction the use case opened.

use chrono::{DateTime, Utc};
use kernel::id::{PrincipalId, RoleId};
use kernel::uow::postgres::{PgTransactionManager, PgUnitOfWork};

use crate::domain::entity::{
    principal::{NewPrincipal, Principal, PrincipalCredentials},
    role::Role,
};
use crate::domain::repository::{PrincipalRepository, RoleRepository};
use crate::domain::value_object::{
    email::Email, role_name::RoleName, user_name::UserName, user_password::UserPassword,
};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed auth store
pub type PgAuthStore = PgTransactionManager;

const EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_active_key";
const USERNAME_UNIQUE_CONSTRAINT: &str = "users_username_active_key";

// Must not lock an existing row: every signup provisions its role
const INSERT_ROLE_IF_ABSENT: &str = r#"
    INSERT INTO roles (name)
    VALUES ($1)
    ON CONFLICT (name) DO NOTHING
"#;

const FIND_ROLE_BY_NAME: &str = r#"
    SELECT id, name, created_at, updated_at
    FROM roles
    WHERE name = $1
"#;

/// Map a unique violation to `AlreadyExists`, anything else to `Database`
fn map_insert_error(err: sqlx::Error, fallback: &str) -> AuthError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            let message = match db.constraint() {
                Some(EMAIL_UNIQUE_CONSTRAINT) => "Email already registered",
                Some(USERNAME_UNIQUE_CONSTRAINT) => "Username already taken",
                _ => fallback,
            };
            AuthError::AlreadyExists(message.to_string())
        }
        _ => AuthError::Database(err),
    }
}

// ============================================================================
// Principal Repository Implementation
// ============================================================================

impl PrincipalRepository for PgUnitOfWork {
    async fn exists_by_email(&mut self, email: &Email) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE email = $1 AND deleted_at IS NULL
            )
            "#,
        )
        .bind(email.as_str())
        .fetch_one(self.conn())
        .await?;

        Ok(exists)
    }

    async fn find_by_id(&mut self, id: PrincipalId) -> AuthResult<Option<Principal>> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT
                u.id,
                u.username,
                u.email,
                u.created_at,
                u.updated_at,
                r.id AS role_id,
                r.name AS role_name,
                r.created_at AS role_created_at,
                r.updated_at AS role_updated_at
            FROM users u
            JOIN roles r ON r.id = u.role_id
            WHERE u.id = $1 AND u.deleted_at IS NULL
            "#,
        )
        .bind(id.value())
        .fetch_optional(self.conn())
        .await?;

        Ok(row.map(PrincipalRow::into_principal))
    }

    async fn find_credentials_by_email(
        &mut self,
        email: &Email,
    ) -> AuthResult<Option<PrincipalCredentials>> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            r#"
            SELECT id, password_hash
            FROM users
            WHERE email = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(self.conn())
        .await?;

        row.map(CredentialsRow::into_credentials).transpose()
    }

    async fn insert(&mut self, new: NewPrincipal, role: &Role) -> AuthResult<Principal> {
        let row = sqlx::query_as::<_, InsertedRow>(
            r#"
            INSERT INTO users (username, email, password_hash, role_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at, updated_at
            "#,
        )
        .bind(new.username.as_str())
        .bind(new.email.as_str())
        .bind(new.password_hash.as_phc_string())
        .bind(role.id.value())
        .fetch_one(self.conn())
        .await
        .map_err(|e| map_insert_error(e, "Email or username already registered"))?;

        Ok(Principal {
            id: PrincipalId::new(row.id),
            username: new.username,
            email: new.email,
            role: role.clone(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ============================================================================
// Role Repository Implementation
// ============================================================================

impl RoleRepository for PgUnitOfWork {
    async fn get_or_create(&mut self, name: &RoleName) -> AuthResult<Role> {
        sqlx::query(INSERT_ROLE_IF_ABSENT)
            .bind(name.as_str())
            .execute(self.conn())
            .await?;

        let row = sqlx::query_as::<_, RoleRow>(FIND_ROLE_BY_NAME)
            .bind(name.as_str())
            .fetch_one(self.conn())
            .await?;

        Ok(row.into_role())
    }

    async fn create(&mut self, name: &RoleName) -> AuthResult<Role> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            INSERT INTO roles (name)
            VALUES ($1)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(name.as_str())
        .fetch_one(self.conn())
        .await
        .map_err(|e| map_insert_error(e, "Role already exists"))?;

        Ok(row.into_role())
    }

    async fn find_by_principal(&mut self, id: PrincipalId) -> AuthResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT r.id, r.name, r.created_at, r.updated_at
            FROM roles r
            JOIN users u ON u.role_id = r.id
            WHERE u.id = $1 AND u.deleted_at IS NULL
            "#,
        )
        .bind(id.value())
        .fetch_optional(self.conn())
        .await?;

        Ok(row.map(RoleRow::into_role))
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct PrincipalRow {
    id: i64,
    username: String,
    email: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    role_id: i64,
    role_name: String,
    role_created_at: DateTime<Utc>,
    role_updated_at: DateTime<Utc>,
}

impl PrincipalRow {
    fn into_principal(self) -> Principal {
        Principal {
            id: PrincipalId::new(self.id),
            username: UserName::from_db(self.username),
            email: Email::from_db(self.email),
            role: Role {
                id: RoleId::new(self.role_id),
                name: RoleName::from_db(self.role_name),
                created_at: self.role_created_at,
                updated_at: self.role_updated_at,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    id: i64,
    password_hash: String,
}

impl CredentialsRow {
    fn into_credentials(self) -> AuthResult<PrincipalCredentials> {
        Ok(PrincipalCredentials {
            id: PrincipalId::new(self.id),
            password_hash: UserPassword::from_phc_string(self.password_hash)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct InsertedRow {
    id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct RoleRow {
    id: i64,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRow {
    fn into_role(self) -> Role {
        Role {
            id: RoleId::new(self.id),
            name: RoleName::from_db(self.name),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    const IDENTITY_MIGRATION: &str =
        include_str!("../../../../../database/migrations/0001_identity.sql");

    #[derive(Debug)]
    struct ConstraintViolation {
        kind: ErrorKind,
        constraint: Option<&'static str>,
    }

    impl fmt::Display for ConstraintViolation {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "constraint violation")
        }
    }

    impl StdError for ConstraintViolation {}

    impl DatabaseError for ConstraintViolation {
        fn message(&self) -> &str {
            "constraint violation"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed("23505"))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }

        fn kind(&self) -> ErrorKind {
            match self.kind {
                ErrorKind::UniqueViolation => ErrorKind::UniqueViolation,
                ErrorKind::ForeignKeyViolation => ErrorKind::ForeignKeyViolation,
                ErrorKind::NotNullViolation => ErrorKind::NotNullViolation,
                ErrorKind::CheckViolation => ErrorKind::CheckViolation,
                _ => ErrorKind::Other,
            }
        }
    }

    fn unique_violation(constraint: Option<&'static str>) -> sqlx::Error {
        sqlx::Error::Database(Box::new(ConstraintViolation {
            kind: ErrorKind::UniqueViolation,
            constraint,
        }))
    }

    fn already_exists_message(err: AuthError) -> String {
        match err {
            AuthError::AlreadyExists(message) => message,
            other => panic!("expected AlreadyExists, got {other:?}"),
        }
    }

    #[test]
    fn test_unique_constraints_match_migration() {
        for constraint in [EMAIL_UNIQUE_CONSTRAINT, USERNAME_UNIQUE_CONSTRAINT] {
            let declaration = format!("CREATE UNIQUE INDEX IF NOT EXISTS {constraint}");
            assert!(
                IDENTITY_MIGRATION.contains(&declaration),
                "{constraint} is not declared by the identity migration"
            );
        }
    }

    #[test]
    fn test_unique_violation_messages() {
        let err = map_insert_error(unique_violation(Some(EMAIL_UNIQUE_CONSTRAINT)), "fallback");
        assert_eq!(already_exists_message(err), "Email already registered");

        let err = map_insert_error(
            unique_violation(Some(USERNAME_UNIQUE_CONSTRAINT)),
            "fallback",
        );
        assert_eq!(already_exists_message(err), "Username already taken");

        let violation = unique_violation(Some("roles_name_key"));
        let err = map_insert_error(violation, "Role already exists");
        assert_eq!(already_exists_message(err), "Role already exists");
    }

    #[test]
    fn test_other_database_errors_are_not_conflicts() {
        let err = sqlx::Error::Database(Box::new(ConstraintViolation {
            kind: ErrorKind::CheckViolation,
            constraint: Some("users_deleted_consistent"),
        }));
        let err = map_insert_error(err, "fallback");
        assert!(matches!(err, AuthError::Database(_)));

        let err = map_insert_error(sqlx::Error::RowNotFound, "fallback");
        assert!(matches!(err, AuthError::Database(_)));
    }

    #[test]
    fn test_role_provisioning_takes_no_row_lock() {
        assert!(INSERT_ROLE_IF_ABSENT.contains("ON CONFLICT (name) DO NOTHING"));
        assert!(!INSERT_ROLE_IF_ABSENT.contains("DO UPDATE"));
        assert!(!FIND_ROLE_BY_NAME.contains("FOR UPDATE"));
        assert!(!FIND_ROLE_BY_NAME.contains("FOR SHARE"));
    }
}
