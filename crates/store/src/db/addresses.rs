//! Address repository.

use sqlx::SqlitePool;
use tracing::instrument;

use storehouse_core::{AddressId, CustomerId};

use super::{RepositoryError, map_write_error};
use crate::models::{Address, CreateAddressInput};

#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: i32,
    street: String,
    city: String,
    zip_code: Option<String>,
    customer_id: i32,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: AddressId::new(row.id),
            street: row.street,
            city: row.city,
            zip_code: row.zip_code,
            customer_id: CustomerId::new(row.customer_id),
        }
    }
}

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if validation fails or the customer
    /// does not exist.
    #[instrument(skip(self, input), fields(customer_id = %input.customer_id))]
    pub async fn create(&self, input: &CreateAddressInput) -> Result<Address, RepositoryError> {
        input.validate()?;

        let row = sqlx::query_as::<_, AddressRow>(
            r"
            INSERT INTO store_address (street, city, zip_code, customer_id)
            VALUES (?, ?, ?, ?)
            RETURNING id, street, city, zip_code, customer_id
            ",
        )
        .bind(input.street.trim())
        .bind(input.city.trim())
        .bind(input.zip_code.as_deref().map(str::trim))
        .bind(input.customer_id.as_i32())
        .fetch_one(self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(row.into())
    }

    /// Addresses of a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(
            r"
            SELECT id, street, city, zip_code, customer_id
            FROM store_address
            WHERE customer_id = ?
            ORDER BY id
            ",
        )
        .bind(customer_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Delete an address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: AddressId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM store_address WHERE id = ?")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storehouse_core::{Email, Membership};

    use super::*;
    use crate::db::CustomerRepository;
    use crate::db::test_support;
    use crate::models::CreateCustomerInput;

    #[tokio::test]
    async fn test_addresses_follow_customer() {
        let pool = test_support::pool().await;
        let customers = CustomerRepository::new(&pool);
        let customer = customers
            .create(&CreateCustomerInput {
                first_name: "Ann".to_owned(),
                last_name: "Lee".to_owned(),
                email: Email::parse("ann@example.com").unwrap(),
                phone: "1".to_owned(),
                birth_date: None,
                membership: Membership::Bronze,
            })
            .await
            .unwrap();

        let repo = AddressRepository::new(&pool);
        repo.create(&CreateAddressInput {
            street: "1 Main St".to_owned(),
            city: "Springfield".to_owned(),
            zip_code: Some("12345".to_owned()),
            customer_id: customer.id,
        })
        .await
        .unwrap();
        assert_eq!(repo.list_for_customer(customer.id).await.unwrap().len(), 1);

        assert!(customers.delete(customer.id).await.unwrap());
        assert!(repo.list_for_customer(customer.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zip_code_length() {
        let pool = test_support::pool().await;
        let result = AddressRepository::new(&pool)
            .create(&CreateAddressInput {
                street: "1 Main St".to_owned(),
                city: "Springfield".to_owned(),
                zip_code: Some("12345-67890".to_owned()),
                customer_id: CustomerId::new(1),
            })
            .await;
        assert!(matches!(result, Err(RepositoryError::Invalid(_))));
    }
}
