//! Diesel/SQLite implementation of the record store gateway.

use chrono::Utc;
use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::client::{Client, NewClient, UpdateClient};
use crate::domain::rut::Rut;
use crate::models::client::{ClientChanges, ClientRow, NewClientRow};
use crate::repository::errors::RepositoryResult;
use crate::repository::{ClientListQuery, ClientReader, ClientWriter};

/// Diesel implementation of [`ClientReader`] and [`ClientWriter`].
pub struct DieselClientRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> DieselClientRepository<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }
}

/// Applies the AND-composed filter set on top of the active-record scope.
fn filtered(
    query: &ClientListQuery,
) -> crate::schema::clients::BoxedQuery<'static, diesel::sqlite::Sqlite> {
    use crate::schema::clients;

    let mut q = clients::table
        .filter(clients::is_active.eq(true))
        .into_boxed();

    if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        // SQLite LIKE is case-insensitive, giving ILIKE-style substring
        // semantics over the three searchable columns.
        let pattern = format!("%{term}%");
        q = q.filter(
            clients::legal_name
                .like(pattern.clone())
                .nullable()
                .or(clients::tax_id.like(pattern.clone()).nullable())
                .or(clients::email.like(pattern)),
        );
    }
    if let Some(city) = &query.city {
        q = q.filter(clients::city.eq(city.clone()));
    }
    if let Some(activity) = &query.activity {
        q = q.filter(clients::business_activity.eq(activity.clone()));
    }

    q
}

impl ClientReader for DieselClientRepository<'_> {
    fn get_by_id(&self, id: i32) -> RepositoryResult<Option<Client>> {
        use crate::schema::clients;

        let mut conn = self.pool.get()?;
        let row = clients::table
            .find(id)
            .select(ClientRow::as_select())
            .first::<ClientRow>(&mut conn)
            .optional()?;

        Ok(row.map(Into::into))
    }

    fn list(&self, query: &ClientListQuery) -> RepositoryResult<(usize, Vec<Client>)> {
        use crate::schema::clients;

        let mut conn = self.pool.get()?;

        let total: i64 = filtered(query).count().get_result(&mut conn)?;

        let mut page_query = filtered(query)
            .order((clients::created_at.desc(), clients::id.desc()));

        if let Some(pagination) = &query.pagination {
            let page = pagination.page.max(1) as i64;
            let per_page = pagination.per_page.max(1) as i64;
            page_query = page_query
                .limit(per_page)
                .offset((page - 1) * per_page);
        }

        let items = page_query
            .load::<ClientRow>(&mut conn)?
            .into_iter()
            .map(Into::into)
            .collect();

        Ok((total as usize, items))
    }

    fn list_all(&self) -> RepositoryResult<Vec<Client>> {
        use crate::schema::clients;

        let mut conn = self.pool.get()?;
        let rows = clients::table
            .filter(clients::is_active.eq(true))
            .order((clients::created_at.desc(), clients::id.desc()))
            .select(ClientRow::as_select())
            .load::<ClientRow>(&mut conn)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn exists_by_tax_id(&self, tax_id: &Rut, exclude_id: Option<i32>) -> RepositoryResult<bool> {
        use crate::schema::clients;
        use diesel::dsl::exists;

        let mut conn = self.pool.get()?;
        let base = clients::table
            .filter(clients::tax_id.eq(tax_id.as_str()))
            .filter(clients::is_active.eq(true));

        let found = match exclude_id {
            Some(id) => diesel::select(exists(base.filter(clients::id.ne(id))))
                .get_result(&mut conn)?,
            None => diesel::select(exists(base)).get_result(&mut conn)?,
        };

        Ok(found)
    }
}

impl ClientWriter for DieselClientRepository<'_> {
    fn create(&self, new_client: &NewClient) -> RepositoryResult<Client> {
        use crate::schema::clients;

        let mut conn = self.pool.get()?;
        let row = NewClientRow::from_domain(new_client, Utc::now().naive_utc());

        let created = diesel::insert_into(clients::table)
            .values(&row)
            .returning(ClientRow::as_returning())
            .get_result::<ClientRow>(&mut conn)?;

        Ok(created.into())
    }

    fn update(&self, client_id: i32, updates: &UpdateClient) -> RepositoryResult<Client> {
        use crate::schema::clients;

        let mut conn = self.pool.get()?;
        let changes = ClientChanges::from_domain(updates, Utc::now().naive_utc());

        let updated = diesel::update(clients::table.find(client_id))
            .set(&changes)
            .returning(ClientRow::as_returning())
            .get_result::<ClientRow>(&mut conn)?;

        Ok(updated.into())
    }

    fn soft_delete(&self, client_id: i32) -> RepositoryResult<()> {
        use crate::schema::clients;

        let mut conn = self.pool.get()?;

        // Already-inactive or unknown ids update zero rows, which is fine.
        diesel::update(
            clients::table
                .find(client_id)
                .filter(clients::is_active.eq(true)),
        )
        .set((
            clients::is_active.eq(false),
            clients::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

        Ok(())
    }
}
