//! PostgreSQL-backed [`ClinicStore`].

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use super::{ClinicStore, Result, StoreError};
use crate::ids::uuidv7;
use crate::models::auth::{NewUser, Principal, Role, User, UserUpdate, UserWithPassword};
use crate::models::clinic::{
    Appointment, AppointmentFilter, AppointmentUpdate, DashboardStats, InventoryItem,
    InventoryUpdate, Invoice, InvoiceFilter, InvoiceUpdate, NewAppointment, NewInventoryItem,
    NewInvoice, NewTreatment, Treatment, TreatmentFilter,
};

/// Maximum time to wait for a pooled connection.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

const USER_COLUMNS: &str = "id, email, first_name, last_name, phone, role, date_of_birth, \
     address, created_at, updated_at";

const INVENTORY_COLUMNS: &str = "id, name, category, current_stock, min_stock, max_stock, unit, \
     supplier, cost, expiry_date, created_at, updated_at";

const TREATMENT_COLUMNS: &str = "id, patient_id, dentist_id, appointment_id, kind, description, \
     notes, cost, date, status, created_at, updated_at";

/// Appointment projection with patient/dentist names, reading from `source` aliased `a`.
fn appointment_select(source: &str) -> String {
    format!(
        "SELECT a.id, a.patient_id, a.dentist_id, a.date, a.time, a.kind, a.status, a.notes, \
         a.duration, \
         p.first_name || ' ' || p.last_name AS patient_name, \
         d.first_name || ' ' || d.last_name AS dentist_name, \
         a.created_at, a.updated_at \
         FROM {source} \
         LEFT JOIN users p ON p.id = a.patient_id \
         LEFT JOIN users d ON d.id = a.dentist_id"
    )
}

/// Invoice projection with patient name/email, reading from `source` aliased `i`.
fn invoice_select(source: &str) -> String {
    format!(
        "SELECT i.id, i.patient_id, i.appointment_id, i.amount, i.description, i.status, \
         i.due_date, i.paid_date, \
         p.first_name || ' ' || p.last_name AS patient_name, \
         p.email AS patient_email, \
         i.created_at, i.updated_at \
         FROM {source} \
         LEFT JOIN users p ON p.id = i.patient_id"
    )
}

/// Replace the password in a connection URL with `****` for logging.
pub fn mask_password(url: &str) -> String {
    let Some(scheme_end) = url.find("://").map(|i| i + 3) else {
        return url.to_string();
    };
    let Some(at) = url[scheme_end..].find('@').map(|i| i + scheme_end) else {
        return url.to_string();
    };
    match url[scheme_end..at].find(':').map(|i| i + scheme_end) {
        Some(colon) => format!("{}:****{}", &url[..colon], &url[at..]),
        None => url.to_string(),
    }
}

/// [`ClinicStore`] over a sqlx PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `url`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        info!(url = %mask_password(url), max_connections, "connecting to PostgreSQL");
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply embedded migrations.
    pub async fn migrate(&self) -> Result<()> {
        crate::migrate::migrate(&self.pool).await?;
        Ok(())
    }
}

fn not_found(kind: &str, id: Uuid) -> StoreError {
    StoreError::NotFound(format!("{kind} {id}"))
}

#[async_trait]
impl ClinicStore for PgStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("PostgreSQL pool closed");
    }

    // -- users --------------------------------------------------------------

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserWithPassword>> {
        let sql = format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1");
        let row = sqlx::query_as::<_, UserWithPassword>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {USER_COLUMNS} FROM users"));
        if let Some(role) = role {
            qb.push(" WHERE role = ").push_bind(role);
        }
        qb.push(" ORDER BY created_at");
        let rows = qb.build_query_as::<User>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn count_users(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let sql = format!(
            "INSERT INTO users \
             (id, email, password_hash, first_name, last_name, phone, role, date_of_birth, address) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(uuidv7())
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.phone)
            .bind(user.role)
            .bind(user.date_of_birth)
            .bind(&user.address)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<User> {
        let sql = format!(
            "UPDATE users SET \
             email = COALESCE($2, email), \
             password_hash = COALESCE($3, password_hash), \
             first_name = COALESCE($4, first_name), \
             last_name = COALESCE($5, last_name), \
             phone = COALESCE($6, phone), \
             role = COALESCE($7, role), \
             date_of_birth = COALESCE($8, date_of_birth), \
             address = COALESCE($9, address), \
             updated_at = now() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(update.email)
            .bind(update.password_hash)
            .bind(update.first_name)
            .bind(update.last_name)
            .bind(update.phone)
            .bind(update.role)
            .bind(update.date_of_birth)
            .bind(update.address)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("user", id))
    }

    async fn delete_user(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found("user", id));
        }
        Ok(())
    }

    // -- appointments -------------------------------------------------------

    async fn list_appointments(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>> {
        let mut qb = QueryBuilder::<Postgres>::new(appointment_select("appointments a"));
        qb.push(" WHERE TRUE");
        if let Some(id) = filter.patient_id {
            qb.push(" AND a.patient_id = ").push_bind(id);
        }
        if let Some(id) = filter.dentist_id {
            qb.push(" AND a.dentist_id = ").push_bind(id);
        }
        if let Some(date) = filter.date {
            qb.push(" AND a.date = ").push_bind(date);
        }
        qb.push(" ORDER BY a.date, a.time");
        let rows = qb
            .build_query_as::<Appointment>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>> {
        let sql = format!("{} WHERE a.id = $1", appointment_select("appointments a"));
        let row = sqlx::query_as::<_, Appointment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create_appointment(&self, appointment: NewAppointment) -> Result<Appointment> {
        let sql = format!(
            "WITH a AS ( \
             INSERT INTO appointments \
             (id, patient_id, dentist_id, date, time, kind, status, notes, duration) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *) {}",
            appointment_select("a")
        );
        let row = sqlx::query_as::<_, Appointment>(&sql)
            .bind(uuidv7())
            .bind(appointment.patient_id)
            .bind(appointment.dentist_id)
            .bind(appointment.date)
            .bind(&appointment.time)
            .bind(&appointment.kind)
            .bind(appointment.status)
            .bind(&appointment.notes)
            .bind(appointment.duration)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_appointment(
        &self,
        id: Uuid,
        update: AppointmentUpdate,
    ) -> Result<Appointment> {
        let sql = format!(
            "WITH a AS ( \
             UPDATE appointments SET \
             patient_id = COALESCE($2, patient_id), \
             dentist_id = COALESCE($3, dentist_id), \
             date = COALESCE($4, date), \
             time = COALESCE($5, time), \
             kind = COALESCE($6, kind), \
             status = COALESCE($7, status), \
             notes = COALESCE($8, notes), \
             duration = COALESCE($9, duration), \
             updated_at = now() \
             WHERE id = $1 RETURNING *) {}",
            appointment_select("a")
        );
        sqlx::query_as::<_, Appointment>(&sql)
            .bind(id)
            .bind(update.patient_id)
            .bind(update.dentist_id)
            .bind(update.date)
            .bind(update.time)
            .bind(update.kind)
            .bind(update.status)
            .bind(update.notes)
            .bind(update.duration)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("appointment", id))
    }

    async fn delete_appointment(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found("appointment", id));
        }
        Ok(())
    }

    // -- inventory ----------------------------------------------------------

    async fn list_inventory(&self) -> Result<Vec<InventoryItem>> {
        let sql = format!("SELECT {INVENTORY_COLUMNS} FROM inventory_items ORDER BY name");
        let rows = sqlx::query_as::<_, InventoryItem>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn create_inventory_item(&self, item: NewInventoryItem) -> Result<InventoryItem> {
        let sql = format!(
            "INSERT INTO inventory_items \
             (id, name, category, current_stock, min_stock, max_stock, unit, supplier, cost, expiry_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {INVENTORY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, InventoryItem>(&sql)
            .bind(uuidv7())
            .bind(&item.name)
            .bind(&item.category)
            .bind(item.current_stock)
            .bind(item.min_stock)
            .bind(item.max_stock)
            .bind(&item.unit)
            .bind(&item.supplier)
            .bind(item.cost)
            .bind(item.expiry_date)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_inventory_item(
        &self,
        id: Uuid,
        update: InventoryUpdate,
    ) -> Result<InventoryItem> {
        let sql = format!(
            "UPDATE inventory_items SET \
             name = COALESCE($2, name), \
             category = COALESCE($3, category), \
             current_stock = COALESCE($4, current_stock), \
             min_stock = COALESCE($5, min_stock), \
             max_stock = COALESCE($6, max_stock), \
             unit = COALESCE($7, unit), \
             supplier = COALESCE($8, supplier), \
             cost = COALESCE($9, cost), \
             expiry_date = COALESCE($10, expiry_date), \
             updated_at = now() \
             WHERE id = $1 \
             RETURNING {INVENTORY_COLUMNS}"
        );
        sqlx::query_as::<_, InventoryItem>(&sql)
            .bind(id)
            .bind(update.name)
            .bind(update.category)
            .bind(update.current_stock)
            .bind(update.min_stock)
            .bind(update.max_stock)
            .bind(update.unit)
            .bind(update.supplier)
            .bind(update.cost)
            .bind(update.expiry_date)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("inventory item", id))
    }

    async fn delete_inventory_item(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found("inventory item", id));
        }
        Ok(())
    }

    // -- invoices -----------------------------------------------------------

    async fn list_invoices(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>> {
        let mut qb = QueryBuilder::<Postgres>::new(invoice_select("invoices i"));
        qb.push(" WHERE TRUE");
        if let Some(id) = filter.patient_id {
            qb.push(" AND i.patient_id = ").push_bind(id);
        }
        if let Some(status) = filter.status {
            qb.push(" AND i.status = ").push_bind(status);
        }
        qb.push(" ORDER BY i.due_date, i.created_at");
        let rows = qb.build_query_as::<Invoice>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn create_invoice(&self, invoice: NewInvoice) -> Result<Invoice> {
        let sql = format!(
            "WITH i AS ( \
             INSERT INTO invoices \
             (id, patient_id, appointment_id, amount, description, status, due_date, paid_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *) {}",
            invoice_select("i")
        );
        let row = sqlx::query_as::<_, Invoice>(&sql)
            .bind(uuidv7())
            .bind(invoice.patient_id)
            .bind(invoice.appointment_id)
            .bind(invoice.amount)
            .bind(&invoice.description)
            .bind(invoice.status)
            .bind(invoice.due_date)
            .bind(invoice.paid_date)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_invoice(&self, id: Uuid, update: InvoiceUpdate) -> Result<Invoice> {
        let sql = format!(
            "WITH i AS ( \
             UPDATE invoices SET \
             appointment_id = COALESCE($2, appointment_id), \
             amount = COALESCE($3, amount), \
             description = COALESCE($4, description), \
             status = COALESCE($5, status), \
             due_date = COALESCE($6, due_date), \
             paid_date = COALESCE($7, paid_date), \
             updated_at = now() \
             WHERE id = $1 RETURNING *) {}",
            invoice_select("i")
        );
        sqlx::query_as::<_, Invoice>(&sql)
            .bind(id)
            .bind(update.appointment_id)
            .bind(update.amount)
            .bind(update.description)
            .bind(update.status)
            .bind(update.due_date)
            .bind(update.paid_date)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("invoice", id))
    }

    // -- treatments ---------------------------------------------------------

    async fn list_treatments(&self, filter: &TreatmentFilter) -> Result<Vec<Treatment>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {TREATMENT_COLUMNS} FROM treatments WHERE TRUE"
        ));
        if let Some(id) = filter.patient_id {
            qb.push(" AND patient_id = ").push_bind(id);
        }
        if let Some(id) = filter.dentist_id {
            qb.push(" AND dentist_id = ").push_bind(id);
        }
        qb.push(" ORDER BY date DESC, created_at DESC");
        let rows = qb
            .build_query_as::<Treatment>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn create_treatment(&self, treatment: NewTreatment) -> Result<Treatment> {
        let sql = format!(
            "INSERT INTO treatments \
             (id, patient_id, dentist_id, appointment_id, kind, description, notes, cost, date, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {TREATMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Treatment>(&sql)
            .bind(uuidv7())
            .bind(treatment.patient_id)
            .bind(treatment.dentist_id)
            .bind(treatment.appointment_id)
            .bind(&treatment.kind)
            .bind(&treatment.description)
            .bind(&treatment.notes)
            .bind(treatment.cost)
            .bind(treatment.date)
            .bind(treatment.status)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    // -- dashboard ----------------------------------------------------------

    async fn dashboard_stats(
        &self,
        principal: &Principal,
        today: NaiveDate,
    ) -> Result<DashboardStats> {
        let stats = match principal.role {
            Role::Admin => {
                let (
                    total_patients,
                    total_staff,
                    today_appointments,
                    monthly_revenue,
                    low_stock_alerts,
                ) = sqlx::query_as::<_, (i64, i64, i64, f64, i64)>(
                        "SELECT \
                         (SELECT COUNT(*) FROM users WHERE role = 'patient'), \
                         (SELECT COUNT(*) FROM users WHERE role <> 'patient'), \
                         (SELECT COUNT(*) FROM appointments WHERE date = $1), \
                         (SELECT COALESCE(SUM(amount), 0)::float8 FROM invoices \
                            WHERE status = 'paid' \
                              AND date_trunc('month', paid_date) = date_trunc('month', $1::date)), \
                         (SELECT COUNT(*) FROM inventory_items WHERE current_stock <= min_stock)",
                    )
                    .bind(today)
                    .fetch_one(&self.pool)
                    .await?;
                DashboardStats::Admin {
                    total_patients,
                    total_staff,
                    today_appointments,
                    monthly_revenue,
                    low_stock_alerts,
                }
            }
            Role::Dentist => {
                let (today_appointments, total_patients, pending_reports) =
                    sqlx::query_as::<_, (i64, i64, i64)>(
                        "SELECT \
                         (SELECT COUNT(*) FROM appointments WHERE dentist_id = $1 AND date = $2), \
                         (SELECT COUNT(DISTINCT patient_id) FROM appointments WHERE dentist_id = $1), \
                         (SELECT COUNT(*) FROM treatments \
                            WHERE dentist_id = $1 AND status <> 'completed')",
                    )
                    .bind(principal.id)
                    .bind(today)
                    .fetch_one(&self.pool)
                    .await?;
                DashboardStats::Dentist {
                    today_appointments,
                    total_patients,
                    pending_reports,
                }
            }
            Role::Receptionist => {
                let (today_appointments, pending_invoices, overdue_invoices) =
                    sqlx::query_as::<_, (i64, i64, i64)>(
                        "SELECT \
                         (SELECT COUNT(*) FROM appointments WHERE date = $1), \
                         (SELECT COUNT(*) FROM invoices WHERE status = 'pending'), \
                         (SELECT COUNT(*) FROM invoices WHERE status = 'overdue')",
                    )
                    .bind(today)
                    .fetch_one(&self.pool)
                    .await?;
                DashboardStats::Receptionist {
                    today_appointments,
                    pending_invoices,
                    overdue_invoices,
                }
            }
            Role::Patient => {
                let (upcoming_appointments, outstanding_balance) =
                    sqlx::query_as::<_, (i64, f64)>(
                        "SELECT \
                         (SELECT COUNT(*) FROM appointments WHERE patient_id = $1 AND date >= $2), \
                         (SELECT COALESCE(SUM(amount), 0)::float8 FROM invoices \
                            WHERE patient_id = $1 AND status IN ('pending', 'overdue'))",
                    )
                    .bind(principal.id)
                    .bind(today)
                    .fetch_one(&self.pool)
                    .await?;
                DashboardStats::Patient {
                    upcoming_appointments,
                    outstanding_balance,
                }
            }
        };
        Ok(stats)
    }
}
