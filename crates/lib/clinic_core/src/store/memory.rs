//! In-process [`ClinicStore`] on `DashMap`s.
//!
//! Used by the integration tests and for local runs without a database.
//! Each map entry is one record; there are no cross-record
//! transactions, matching the single-record guarantees of the SQL backend.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use super::{ClinicStore, Result, StoreError};
use crate::ids::uuidv7;
use crate::models::auth::{NewUser, Principal, Role, User, UserUpdate, UserWithPassword};
use crate::models::clinic::{
    Appointment, AppointmentFilter, AppointmentUpdate, DashboardStats, InventoryItem,
    InventoryUpdate, Invoice, InvoiceFilter, InvoiceStatus, InvoiceUpdate, NewAppointment,
    NewInventoryItem, NewInvoice, NewTreatment, Treatment, TreatmentFilter, TreatmentStatus,
};

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, UserWithPassword>,
    /// Unique email index.
    emails: DashMap<String, Uuid>,
    appointments: DashMap<Uuid, Appointment>,
    inventory: DashMap<Uuid, InventoryItem>,
    invoices: DashMap<Uuid, Invoice>,
    treatments: DashMap<Uuid, Treatment>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn display_name(&self, id: Uuid) -> Option<String> {
        self.users.get(&id).map(|u| u.user.display_name())
    }

    /// Fill in the joined patient/dentist names.
    fn with_names(&self, mut appointment: Appointment) -> Appointment {
        appointment.patient_name = self.display_name(appointment.patient_id);
        appointment.dentist_name = appointment.dentist_id.and_then(|id| self.display_name(id));
        appointment
    }

    fn with_patient(&self, mut invoice: Invoice) -> Invoice {
        if let Some(patient) = self.users.get(&invoice.patient_id) {
            invoice.patient_name = Some(patient.user.display_name());
            invoice.patient_email = Some(patient.user.email.clone());
        } else {
            invoice.patient_name = None;
            invoice.patient_email = None;
        }
        invoice
    }
}

fn not_found(kind: &str, id: Uuid) -> StoreError {
    StoreError::NotFound(format!("{kind} {id}"))
}

fn email_taken(email: &str) -> StoreError {
    StoreError::Conflict(format!("email {email} already registered"))
}

#[async_trait]
impl ClinicStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) {}

    // -- users --------------------------------------------------------------

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserWithPassword>> {
        let Some(id) = self.emails.get(email).map(|e| *e.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.user.clone()))
    }

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>> {
        let mut users: Vec<User> = self
            .users
            .iter()
            .filter(|u| role.is_none_or(|r| u.user.role == r))
            .map(|u| u.user.clone())
            .collect();
        users.sort_by_key(|u| (u.created_at, u.id));
        Ok(users)
    }

    async fn count_users(&self) -> Result<i64> {
        Ok(self.users.len() as i64)
    }

    async fn create_user(&self, new: NewUser) -> Result<User> {
        let id = uuidv7();
        match self.emails.entry(new.email.clone()) {
            Entry::Occupied(_) => return Err(email_taken(&new.email)),
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }
        let now = Utc::now();
        let user = User {
            id,
            email: new.email,
            first_name: new.first_name,
            last_name: new.last_name,
            phone: new.phone,
            role: new.role,
            date_of_birth: new.date_of_birth,
            address: new.address,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(
            id,
            UserWithPassword {
                user: user.clone(),
                password_hash: new.password_hash,
            },
        );
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<User> {
        let mut entry = self.users.get_mut(&id).ok_or_else(|| not_found("user", id))?;
        if let Some(email) = update.email
            && email != entry.user.email
        {
            match self.emails.entry(email.clone()) {
                Entry::Occupied(_) => return Err(email_taken(&email)),
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
            self.emails.remove(&entry.user.email);
            entry.user.email = email;
        }
        if let Some(hash) = update.password_hash {
            entry.password_hash = hash;
        }
        let user = &mut entry.user;
        if let Some(v) = update.first_name {
            user.first_name = v;
        }
        if let Some(v) = update.last_name {
            user.last_name = v;
        }
        if update.phone.is_some() {
            user.phone = update.phone;
        }
        if let Some(v) = update.role {
            user.role = v;
        }
        if update.date_of_birth.is_some() {
            user.date_of_birth = update.date_of_birth;
        }
        if update.address.is_some() {
            user.address = update.address;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete_user(&self, id: Uuid) -> Result<()> {
        let (_, removed) = self.users.remove(&id).ok_or_else(|| not_found("user", id))?;
        self.emails.remove(&removed.user.email);
        Ok(())
    }

    // -- appointments -------------------------------------------------------

    async fn list_appointments(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>> {
        let mut rows: Vec<Appointment> = self
            .appointments
            .iter()
            .filter(|a| filter.matches(a.value()))
            .map(|a| a.value().clone())
            .collect();
        rows.sort_by(|a, b| (a.date, &a.time).cmp(&(b.date, &b.time)));
        Ok(rows.into_iter().map(|a| self.with_names(a)).collect())
    }

    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>> {
        let row = self.appointments.get(&id).map(|a| a.value().clone());
        Ok(row.map(|a| self.with_names(a)))
    }

    async fn create_appointment(&self, new: NewAppointment) -> Result<Appointment> {
        let now = Utc::now();
        let appointment = Appointment {
            id: uuidv7(),
            patient_id: new.patient_id,
            dentist_id: new.dentist_id,
            date: new.date,
            time: new.time,
            kind: new.kind,
            status: new.status,
            notes: new.notes,
            duration: new.duration,
            patient_name: None,
            dentist_name: None,
            created_at: now,
            updated_at: now,
        };
        self.appointments.insert(appointment.id, appointment.clone());
        Ok(self.with_names(appointment))
    }

    async fn update_appointment(
        &self,
        id: Uuid,
        update: AppointmentUpdate,
    ) -> Result<Appointment> {
        let updated = {
            let mut a = self
                .appointments
                .get_mut(&id)
                .ok_or_else(|| not_found("appointment", id))?;
            if let Some(v) = update.patient_id {
                a.patient_id = v;
            }
            if update.dentist_id.is_some() {
                a.dentist_id = update.dentist_id;
            }
            if let Some(v) = update.date {
                a.date = v;
            }
            if let Some(v) = update.time {
                a.time = v;
            }
            if let Some(v) = update.kind {
                a.kind = v;
            }
            if let Some(v) = update.status {
                a.status = v;
            }
            if update.notes.is_some() {
                a.notes = update.notes;
            }
            if let Some(v) = update.duration {
                a.duration = v;
            }
            a.updated_at = Utc::now();
            a.clone()
        };
        Ok(self.with_names(updated))
    }

    async fn delete_appointment(&self, id: Uuid) -> Result<()> {
        self.appointments
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("appointment", id))
    }

    // -- inventory ----------------------------------------------------------

    async fn list_inventory(&self) -> Result<Vec<InventoryItem>> {
        let mut items: Vec<InventoryItem> =
            self.inventory.iter().map(|i| i.value().clone()).collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn create_inventory_item(&self, new: NewInventoryItem) -> Result<InventoryItem> {
        let now = Utc::now();
        let item = InventoryItem {
            id: uuidv7(),
            name: new.name,
            category: new.category,
            current_stock: new.current_stock,
            min_stock: new.min_stock,
            max_stock: new.max_stock,
            unit: new.unit,
            supplier: new.supplier,
            cost: new.cost,
            expiry_date: new.expiry_date,
            created_at: now,
            updated_at: now,
        };
        self.inventory.insert(item.id, item.clone());
        Ok(item)
    }

    async fn update_inventory_item(
        &self,
        id: Uuid,
        update: InventoryUpdate,
    ) -> Result<InventoryItem> {
        let mut item = self
            .inventory
            .get_mut(&id)
            .ok_or_else(|| not_found("inventory item", id))?;
        if let Some(v) = update.name {
            item.name = v;
        }
        if let Some(v) = update.category {
            item.category = v;
        }
        if let Some(v) = update.current_stock {
            item.current_stock = v;
        }
        if let Some(v) = update.min_stock {
            item.min_stock = v;
        }
        if let Some(v) = update.max_stock {
            item.max_stock = v;
        }
        if let Some(v) = update.unit {
            item.unit = v;
        }
        if update.supplier.is_some() {
            item.supplier = update.supplier;
        }
        if let Some(v) = update.cost {
            item.cost = v;
        }
        if update.expiry_date.is_some() {
            item.expiry_date = update.expiry_date;
        }
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn delete_inventory_item(&self, id: Uuid) -> Result<()> {
        self.inventory
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("inventory item", id))
    }

    // -- invoices -----------------------------------------------------------

    async fn list_invoices(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>> {
        let mut rows: Vec<Invoice> = self
            .invoices
            .iter()
            .filter(|i| filter.matches(i.value()))
            .map(|i| i.value().clone())
            .collect();
        rows.sort_by_key(|i| (i.due_date, i.created_at));
        Ok(rows.into_iter().map(|i| self.with_patient(i)).collect())
    }

    async fn create_invoice(&self, new: NewInvoice) -> Result<Invoice> {
        let now = Utc::now();
        let invoice = Invoice {
            id: uuidv7(),
            patient_id: new.patient_id,
            appointment_id: new.appointment_id,
            amount: new.amount,
            description: new.description,
            status: new.status,
            due_date: new.due_date,
            paid_date: new.paid_date,
            patient_name: None,
            patient_email: None,
            created_at: now,
            updated_at: now,
        };
        self.invoices.insert(invoice.id, invoice.clone());
        Ok(self.with_patient(invoice))
    }

    async fn update_invoice(&self, id: Uuid, update: InvoiceUpdate) -> Result<Invoice> {
        let updated = {
            let mut invoice = self
                .invoices
                .get_mut(&id)
                .ok_or_else(|| not_found("invoice", id))?;
            if update.appointment_id.is_some() {
                invoice.appointment_id = update.appointment_id;
            }
            if let Some(v) = update.amount {
                invoice.amount = v;
            }
            if let Some(v) = update.description {
                invoice.description = v;
            }
            if let Some(v) = update.status {
                invoice.status = v;
            }
            if let Some(v) = update.due_date {
                invoice.due_date = v;
            }
            if update.paid_date.is_some() {
                invoice.paid_date = update.paid_date;
            }
            invoice.updated_at = Utc::now();
            invoice.clone()
        };
        Ok(self.with_patient(updated))
    }

    // -- treatments ---------------------------------------------------------

    async fn list_treatments(&self, filter: &TreatmentFilter) -> Result<Vec<Treatment>> {
        let mut rows: Vec<Treatment> = self
            .treatments
            .iter()
            .filter(|t| filter.matches(t.value()))
            .map(|t| t.value().clone())
            .collect();
        rows.sort_by(|a, b| (b.date, b.created_at).cmp(&(a.date, a.created_at)));
        Ok(rows)
    }

    async fn create_treatment(&self, new: NewTreatment) -> Result<Treatment> {
        let now = Utc::now();
        let treatment = Treatment {
            id: uuidv7(),
            patient_id: new.patient_id,
            dentist_id: new.dentist_id,
            appointment_id: new.appointment_id,
            kind: new.kind,
            description: new.description,
            notes: new.notes,
            cost: new.cost,
            date: new.date,
            status: new.status,
            created_at: now,
            updated_at: now,
        };
        self.treatments.insert(treatment.id, treatment.clone());
        Ok(treatment)
    }

    // -- dashboard ----------------------------------------------------------

    async fn dashboard_stats(
        &self,
        principal: &Principal,
        today: NaiveDate,
    ) -> Result<DashboardStats> {
        let count_appointments = |pred: &dyn Fn(&Appointment) -> bool| {
            self.appointments.iter().filter(|a| pred(a.value())).count() as i64
        };
        let count_invoices = |status: InvoiceStatus| {
            self.invoices.iter().filter(|i| i.status == status).count() as i64
        };

        let stats = match principal.role {
            Role::Admin => {
                let total_patients = self
                    .users
                    .iter()
                    .filter(|u| u.user.role == Role::Patient)
                    .count() as i64;
                let monthly_revenue = self
                    .invoices
                    .iter()
                    .filter(|i| {
                        i.status == InvoiceStatus::Paid
                            && i.paid_date.is_some_and(|d| {
                                d.year() == today.year() && d.month() == today.month()
                            })
                    })
                    .map(|i| i.amount)
                    .sum();
                DashboardStats::Admin {
                    total_patients,
                    total_staff: self.users.len() as i64 - total_patients,
                    today_appointments: count_appointments(&|a| a.date == today),
                    monthly_revenue,
                    low_stock_alerts: self.inventory.iter().filter(|i| i.is_low_stock()).count()
                        as i64,
                }
            }
            Role::Dentist => {
                let mine = |a: &Appointment| a.dentist_id == Some(principal.id);
                let mut patients: Vec<Uuid> = self
                    .appointments
                    .iter()
                    .filter(|a| mine(a.value()))
                    .map(|a| a.patient_id)
                    .collect();
                patients.sort_unstable();
                patients.dedup();
                DashboardStats::Dentist {
                    today_appointments: count_appointments(&|a| mine(a) && a.date == today),
                    total_patients: patients.len() as i64,
                    pending_reports: self
                        .treatments
                        .iter()
                        .filter(|t| {
                            t.dentist_id == principal.id && t.status != TreatmentStatus::Completed
                        })
                        .count() as i64,
                }
            }
            Role::Receptionist => DashboardStats::Receptionist {
                today_appointments: count_appointments(&|a| a.date == today),
                pending_invoices: count_invoices(InvoiceStatus::Pending),
                overdue_invoices: count_invoices(InvoiceStatus::Overdue),
            },
            Role::Patient => DashboardStats::Patient {
                upcoming_appointments: count_appointments(&|a| {
                    a.patient_id == principal.id && a.date >= today
                }),
                outstanding_balance: self
                    .invoices
                    .iter()
                    .filter(|i| i.patient_id == principal.id && i.status.is_outstanding())
                    .map(|i| i.amount)
                    .sum(),
            },
        };
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::clinic::AppointmentStatus;

    fn new_user(email: &str, role: Role) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: "hash".into(),
            first_name: "Jo".into(),
            last_name: "Doe".into(),
            phone: None,
            role,
            date_of_birth: None,
            address: None,
        }
    }

    fn new_appointment(patient_id: Uuid, dentist_id: Option<Uuid>, date: NaiveDate) -> NewAppointment {
        NewAppointment {
            patient_id,
            dentist_id,
            date,
            time: "09:00".into(),
            kind: "Cleaning".into(),
            status: AppointmentStatus::Scheduled,
            notes: None,
            duration: 30,
        }
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store.create_user(new_user("a@clinic.com", Role::Patient)).await.unwrap();
        let err = store
            .create_user(new_user("a@clinic.com", Role::Dentist))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(1, store.count_users().await.unwrap());
    }

    #[tokio::test]
    async fn email_change_moves_index() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("old@clinic.com", Role::Patient)).await.unwrap();
        store
            .update_user(
                user.id,
                UserUpdate {
                    email: Some("new@clinic.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(store.find_user_by_email("old@clinic.com").await.unwrap().is_none());
        assert!(store.find_user_by_email("new@clinic.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn appointments_carry_names_and_filter() {
        let store = MemoryStore::new();
        let patient = store.create_user(new_user("p@clinic.com", Role::Patient)).await.unwrap();
        let dentist = store.create_user(new_user("d@clinic.com", Role::Dentist)).await.unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 5, 4).unwrap();
        store
            .create_appointment(new_appointment(patient.id, Some(dentist.id), day))
            .await
            .unwrap();
        store
            .create_appointment(new_appointment(uuidv7(), None, day))
            .await
            .unwrap();

        let filter = AppointmentFilter {
            dentist_id: Some(dentist.id),
            ..Default::default()
        };
        let rows = store.list_appointments(&filter).await.unwrap();
        assert_eq!(1, rows.len());
        assert_eq!(Some("Jo Doe".to_string()), rows[0].patient_name);
        assert_eq!(Some("Jo Doe".to_string()), rows[0].dentist_name);
    }

    #[tokio::test]
    async fn patient_stats_count_future_and_outstanding() {
        let store = MemoryStore::new();
        let patient = store.create_user(new_user("p@clinic.com", Role::Patient)).await.unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 5, 4).unwrap();
        let yesterday = today.pred_opt().unwrap();
        store
            .create_appointment(new_appointment(patient.id, None, today))
            .await
            .unwrap();
        store
            .create_appointment(new_appointment(patient.id, None, yesterday))
            .await
            .unwrap();
        for (amount, status) in [
            (100.0, InvoiceStatus::Pending),
            (50.0, InvoiceStatus::Overdue),
            (999.0, InvoiceStatus::Paid),
        ] {
            store
                .create_invoice(NewInvoice {
                    patient_id: patient.id,
                    appointment_id: None,
                    amount,
                    description: "Visit".into(),
                    status,
                    due_date: today,
                    paid_date: None,
                })
                .await
                .unwrap();
        }

        let stats = store
            .dashboard_stats(&patient.principal(), today)
            .await
            .unwrap();
        assert_eq!(
            DashboardStats::Patient {
                upcoming_appointments: 1,
                outstanding_balance: 150.0,
            },
            stats
        );
    }

    #[tokio::test]
    async fn missing_records_are_not_found() {
        let store = MemoryStore::new();
        let id = uuidv7();
        assert!(matches!(
            store.delete_appointment(id).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.update_invoice(id, InvoiceUpdate::default()).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
