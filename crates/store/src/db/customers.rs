//! Customer repository.

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::instrument;

use storehouse_core::{CustomerId, Email, Membership};

use super::{RepositoryError, map_delete_error, map_write_error};
use crate::models::{CreateCustomerInput, Customer, UpdateCustomerInput};

/// Columns decoded by [`CustomerRow`], for a `store_customer` aliased `cu`.
pub(crate) const CUSTOMER_COLUMNS: &str = r"
    cu.id, cu.first_name, cu.last_name, cu.email, cu.phone, cu.birth_date, cu.membership
";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CustomerRow {
    id: i32,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    birth_date: Option<NaiveDate>,
    membership: Membership,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = RepositoryError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: CustomerId::new(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            email,
            phone: row.phone,
            birth_date: row.birth_date,
            membership: row.membership,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already taken.
    /// Returns `RepositoryError::Invalid` if validation fails.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create(&self, input: &CreateCustomerInput) -> Result<Customer, RepositoryError> {
        input.validate()?;

        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            INSERT INTO store_customer
                (first_name, last_name, email, phone, birth_date, membership)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, first_name, last_name, email, phone, birth_date, membership
            ",
        )
        .bind(input.first_name.trim())
        .bind(input.last_name.trim())
        .bind(input.email.as_str())
        .bind(input.phone.trim())
        .bind(input.birth_date)
        .bind(input.membership)
        .fetch_one(self.pool)
        .await
        .map_err(map_write_error)?;

        row.try_into()
    }

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM store_customer cu WHERE cu.id = ?"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a customer by email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM store_customer cu WHERE cu.email = ?"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List all customers ordered by first then last name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored email is invalid.
    pub async fn list(&self) -> Result<Vec<Customer>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM store_customer cu ORDER BY cu.first_name, cu.last_name, cu.id"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Number of orders placed by a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn orders_count(&self, id: CustomerId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM store_order WHERE customer_id = ?")
            .bind(id.as_i32())
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Update a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new email is already taken.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: CustomerId,
        input: &UpdateCustomerInput,
    ) -> Result<Customer, RepositoryError> {
        input.validate()?;

        let (set_birth_date, birth_date) = match input.birth_date {
            Some(date) => (true, date),
            None => (false, None),
        };

        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            UPDATE store_customer
            SET
                first_name = COALESCE(?, first_name),
                last_name = COALESCE(?, last_name),
                email = COALESCE(?, email),
                phone = COALESCE(?, phone),
                birth_date = CASE WHEN ? THEN ? ELSE birth_date END,
                membership = COALESCE(?, membership)
            WHERE id = ?
            RETURNING id, first_name, last_name, email, phone, birth_date, membership
            ",
        )
        .bind(input.first_name.as_deref().map(str::trim))
        .bind(input.last_name.as_deref().map(str::trim))
        .bind(input.email.as_ref().map(Email::as_str))
        .bind(input.phone.as_deref().map(str::trim))
        .bind(set_birth_date)
        .bind(birth_date)
        .bind(input.membership)
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await
        .map_err(map_write_error)?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Change the membership tier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer doesn't exist.
    pub async fn set_membership(
        &self,
        id: CustomerId,
        membership: Membership,
    ) -> Result<Customer, RepositoryError> {
        self.update(
            id,
            &UpdateCustomerInput {
                membership: Some(membership),
                ..UpdateCustomerInput::default()
            },
        )
        .await
    }

    /// Delete a customer; their addresses go with them.
    ///
    /// # Returns
    ///
    /// Returns `true` if the customer was deleted, `false` if they didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Protected` while the customer has orders.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: CustomerId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM store_customer WHERE id = ?")
            .bind(id.as_i32())
            .execute(self.pool)
            .await
            .map_err(|e| map_delete_error("customer", e))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete several customers at once; all or nothing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Protected` if any of them has orders.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn delete_many(&self, ids: &[CustomerId]) -> Result<u64, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(CustomerId::as_i32).collect();
        super::delete_many(self.pool, "store_customer", &ids).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_support;

    fn input(first: &str, email: &str) -> CreateCustomerInput {
        CreateCustomerInput {
            first_name: first.to_owned(),
            last_name: "Smith".to_owned(),
            email: Email::parse(email).unwrap(),
            phone: "555-0100".to_owned(),
            birth_date: None,
            membership: Membership::default(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let pool = test_support::pool().await;
        let repo = CustomerRepository::new(&pool);
        repo.create(&input("Ann", "ann@example.com")).await.unwrap();

        let err = repo
            .create(&input("Other", "ann@EXAMPLE.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_membership_round_trip() {
        let pool = test_support::pool().await;
        let repo = CustomerRepository::new(&pool);
        let created = repo.create(&input("Ann", "ann@example.com")).await.unwrap();
        assert_eq!(created.membership, Membership::Bronze);

        let gold = repo.set_membership(created.id, Membership::Gold).await.unwrap();
        assert_eq!(gold.membership, Membership::Gold);

        let code: String = sqlx::query_scalar("SELECT membership FROM store_customer WHERE id = ?")
            .bind(created.id.as_i32())
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(code, "G");
    }

    #[tokio::test]
    async fn test_update_birth_date() {
        let pool = test_support::pool().await;
        let repo = CustomerRepository::new(&pool);
        let created = repo.create(&input("Ann", "ann@example.com")).await.unwrap();
        let date = NaiveDate::from_ymd_opt(1990, 5, 17).unwrap();

        let updated = repo
            .update(
                created.id,
                &UpdateCustomerInput {
                    birth_date: Some(Some(date)),
                    ..UpdateCustomerInput::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.birth_date, Some(date));

        let found = repo
            .get_by_email(&Email::parse("ann@example.com").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.birth_date, Some(date));
    }

    #[tokio::test]
    async fn test_list_orders_by_name() {
        let pool = test_support::pool().await;
        let repo = CustomerRepository::new(&pool);
        repo.create(&input("Zoe", "zoe@example.com")).await.unwrap();
        repo.create(&input("Ann", "ann@example.com")).await.unwrap();

        let names: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.first_name)
            .collect();
        assert_eq!(names, vec!["Ann", "Zoe"]);
    }
}
