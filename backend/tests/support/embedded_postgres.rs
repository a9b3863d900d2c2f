//! Database preparation and seeding for the embedded PostgreSQL suites.
//!
//! - Databases are dropped and recreated through `postgres`, outside any
//!   Diesel transaction, since `DROP DATABASE` refuses to run in one.
//! - The schema comes from the embedded Diesel migrations, so tests run
//!   against exactly what ships.
//! - [`Seeder`] writes users and cafes with plain SQL; the cafe port has no
//!   write operations.

use cafehub::domain::{Amenity, CafeId, UserId};
use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use pg_embedded_setup_unpriv::TestCluster;
use postgres::{Client, NoTls};
use uuid::Uuid;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Render a `postgres` error with its SQLSTATE, detail and hint.
///
/// `postgres::Error`'s `Display` collapses server errors to `db error`.
pub fn format_postgres_error(error: &postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };
    let mut summary = format!(
        "postgres error {:?}: {}",
        db_error.code(),
        db_error.message()
    );
    if let Some(detail) = db_error.detail() {
        summary.push_str("; detail: ");
        summary.push_str(detail);
    }
    if let Some(hint) = db_error.hint() {
        summary.push_str("; hint: ");
        summary.push_str(hint);
    }
    summary
}

/// Drop `name` if present and create it empty.
pub fn reset_database(cluster: &TestCluster, name: &str) -> Result<(), String> {
    let admin_url = cluster.connection().database_url("postgres");
    let mut client =
        Client::connect(&admin_url, NoTls).map_err(|err| format_postgres_error(&err))?;
    client
        .batch_execute(&format!("DROP DATABASE IF EXISTS \"{name}\" WITH (FORCE)"))
        .map_err(|err| format_postgres_error(&err))?;
    client
        .batch_execute(&format!("CREATE DATABASE \"{name}\""))
        .map_err(|err| format_postgres_error(&err))?;
    Ok(())
}

/// Apply every pending migration to the database at `url`.
pub fn migrate_schema(url: &str) -> Result<(), String> {
    let mut conn = PgConnection::establish(url).map_err(|err| format!("connect: {err}"))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|err| format!("migrate: {err}"))?;
    Ok(())
}

/// A cafe row to seed; defaults to an active Austin cafe with a 10 to 25
/// budget at the origin.
#[derive(Debug, Clone)]
pub struct CafeSeed {
    pub name: String,
    pub city: String,
    pub min_budget: i32,
    pub max_budget: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub is_active: bool,
    pub amenities: Vec<Amenity>,
}

impl CafeSeed {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            city: "Austin".to_owned(),
            min_budget: 10,
            max_budget: 25,
            latitude: 0.0,
            longitude: 0.0,
            is_active: true,
            amenities: Vec::new(),
        }
    }

    pub fn city(mut self, city: &str) -> Self {
        self.city = city.to_owned();
        self
    }

    pub fn budget(mut self, min: i32, max: i32) -> Self {
        self.min_budget = min;
        self.max_budget = max;
        self
    }

    pub fn coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }

    pub fn amenity(mut self, amenity: Amenity) -> Self {
        self.amenities.push(amenity);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// Plain-SQL writer for users and cafes.
pub struct Seeder {
    client: Client,
    owner: Option<UserId>,
}

impl Seeder {
    pub fn connect(url: &str) -> Result<Self, String> {
        let client = Client::connect(url, NoTls).map_err(|err| format_postgres_error(&err))?;
        Ok(Self {
            client,
            owner: None,
        })
    }

    /// Insert a customer and return their id.
    pub fn user(&mut self, name: &str) -> Result<UserId, String> {
        let id = Uuid::new_v4();
        let email = format!("{id}@example.com");
        self.client
            .execute(
                "INSERT INTO users (id, name, email, role) VALUES ($1, $2, $3, 'CUSTOMER')",
                &[&id, &name, &email],
            )
            .map_err(|err| format_postgres_error(&err))?;
        Ok(UserId::from_uuid(id))
    }

    fn owner(&mut self) -> Result<Uuid, String> {
        if let Some(owner) = &self.owner {
            return Ok(*owner.as_uuid());
        }
        let owner = self.user("Owner")?;
        let uuid = *owner.as_uuid();
        self.owner = Some(owner);
        Ok(uuid)
    }

    /// Insert a cafe with its amenities and return its id.
    pub fn cafe(&mut self, seed: &CafeSeed) -> Result<CafeId, String> {
        let owner = self.owner()?;
        let id = Uuid::new_v4();
        self.client
            .execute(
                "INSERT INTO cafes (id, owner_id, name, address, city, state, zip_code, \
                 latitude, longitude, phone, email, min_budget, max_budget, is_active) \
                 VALUES ($1, $2, $3, '1 Main St', $4, 'TX', '78701', $5, $6, '555-0100', \
                 'hello@example.com', $7::INT4, $8::INT4, $9)",
                &[
                    &id,
                    &owner,
                    &seed.name,
                    &seed.city,
                    &seed.latitude,
                    &seed.longitude,
                    &seed.min_budget,
                    &seed.max_budget,
                    &seed.is_active,
                ],
            )
            .map_err(|err| format_postgres_error(&err))?;
        for amenity in &seed.amenities {
            self.client
                .execute(
                    "INSERT INTO cafe_amenities (cafe_id, amenity) VALUES ($1, $2)",
                    &[&id, &amenity.as_str()],
                )
                .map_err(|err| format_postgres_error(&err))?;
        }
        Ok(CafeId::from_uuid(id))
    }
}
