//! Role-scoped query filters and per-endpoint write allow-sets.
//!
//! Patients and dentists only ever see records they own; the server
//! overrides whatever owner id the client asked for. Admins and receptionists
//! get the client's filter as-is.

use uuid::Uuid;

use crate::models::auth::{Principal, Role};
use crate::models::clinic::{
    Appointment, AppointmentFilter, AppointmentUpdate, InvoiceFilter, TreatmentFilter,
};

/// Who may create, update or delete inventory items.
pub const INVENTORY_WRITERS: &[Role] = &[Role::Admin, Role::Receptionist];

/// Who may create or update invoices.
pub const INVOICE_WRITERS: &[Role] = &[Role::Admin, Role::Receptionist];

/// Who may manage user accounts.
pub const USER_ADMINS: &[Role] = &[Role::Admin];

/// Who may record treatments.
pub const TREATMENT_WRITERS: &[Role] = &[Role::Admin, Role::Dentist];

pub fn permits(principal: &Principal, allowed: &[Role]) -> bool {
    allowed.contains(&principal.role)
}

pub fn scope_appointments(principal: &Principal, requested: AppointmentFilter) -> AppointmentFilter {
    match principal.role {
        Role::Patient => AppointmentFilter {
            patient_id: Some(principal.id),
            dentist_id: None,
            date: requested.date,
        },
        Role::Dentist => AppointmentFilter {
            patient_id: None,
            dentist_id: Some(principal.id),
            date: requested.date,
        },
        Role::Admin | Role::Receptionist => requested,
    }
}

pub fn scope_invoices(principal: &Principal, requested: InvoiceFilter) -> InvoiceFilter {
    match principal.role {
        Role::Patient => InvoiceFilter {
            patient_id: Some(principal.id),
            status: requested.status,
        },
        _ => requested,
    }
}

pub fn scope_treatments(principal: &Principal, requested: TreatmentFilter) -> TreatmentFilter {
    match principal.role {
        Role::Patient => TreatmentFilter {
            patient_id: Some(principal.id),
            dentist_id: None,
        },
        Role::Dentist => TreatmentFilter {
            patient_id: requested.patient_id,
            dentist_id: Some(principal.id),
        },
        Role::Admin | Role::Receptionist => requested,
    }
}

/// Owner ids for a new appointment: `(patient_id, dentist_id)`.
///
/// A patient always books for themself; a dentist always books into their
/// own calendar.
pub fn appointment_owners(
    principal: &Principal,
    patient_id: Option<Uuid>,
    dentist_id: Option<Uuid>,
) -> (Option<Uuid>, Option<Uuid>) {
    match principal.role {
        Role::Patient => (Some(principal.id), dentist_id),
        Role::Dentist => (patient_id, Some(principal.id)),
        Role::Admin | Role::Receptionist => (patient_id, dentist_id),
    }
}

/// Whether `principal` may update or delete `appointment`.
pub fn can_modify_appointment(principal: &Principal, appointment: &Appointment) -> bool {
    match principal.role {
        Role::Admin | Role::Receptionist => true,
        Role::Patient => appointment.patient_id == principal.id,
        Role::Dentist => appointment.dentist_id == Some(principal.id),
    }
}

/// Drop owner reassignments the caller is not entitled to make.
pub fn restrict_appointment_update(principal: &Principal, update: &mut AppointmentUpdate) {
    match principal.role {
        Role::Patient => update.patient_id = None,
        Role::Dentist => update.dentist_id = None,
        Role::Admin | Role::Receptionist => {}
    }
}
