// libs/booking-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use shared_models::auth::Role;

use crate::models::{AppointmentStatus, BookingError};

/// Status-transition rules for appointment updates.
///
/// Each role has an ordered list of statuses it may set. The list doubles as
/// a total order by position: a transition is allowed only when the requested
/// status sits at or after the current status in the caller's list. A
/// consequence kept on purpose is that a doctor can never leave CANCELLED
/// (it precedes COMPLETED and NO_SHOW positionally) and cannot revert
/// CONFIRMED back to PENDING.
pub struct AppointmentLifecycleService;

const DOCTOR_STATUS_ORDER: [AppointmentStatus; 5] = [
    AppointmentStatus::Pending,
    AppointmentStatus::Confirmed,
    AppointmentStatus::Cancelled,
    AppointmentStatus::Completed,
    AppointmentStatus::NoShow,
];

const PATIENT_STATUS_ORDER: [AppointmentStatus; 2] =
    [AppointmentStatus::Pending, AppointmentStatus::Cancelled];

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Ordered status list the given role may set.
    pub fn allowed_statuses(&self, role: Role) -> &'static [AppointmentStatus] {
        match role {
            Role::Doctor => &DOCTOR_STATUS_ORDER,
            _ => &PATIENT_STATUS_ORDER,
        }
    }

    /// Validate a requested transition for a caller role.
    pub fn validate_transition(
        &self,
        role: Role,
        current: AppointmentStatus,
        requested: AppointmentStatus,
    ) -> Result<(), BookingError> {
        debug!(
            "Validating status transition {} -> {} for role {}",
            current, requested, role
        );

        let order = self.allowed_statuses(role);

        let requested_pos = match order.iter().position(|s| *s == requested) {
            Some(pos) => pos,
            None => {
                warn!("Status {} not permitted for role {}", requested, role);
                return Err(BookingError::InvalidStatus(format!(
                    "Invalid status. Must be one of: {}",
                    Self::order_list(order)
                )));
            }
        };

        // The current status can sit outside the caller's list (e.g. a patient
        // looking at a CONFIRMED appointment); position() then yields None and
        // the transition is rejected as out of order.
        let current_pos = order.iter().position(|s| *s == current);

        match current_pos {
            Some(pos) if pos <= requested_pos => Ok(()),
            _ => {
                warn!(
                    "Out-of-order status transition {} -> {} for role {}",
                    current, requested, role
                );
                Err(BookingError::InvalidStatus(format!(
                    "Invalid status. Must be in this order and one of: {}",
                    Self::order_list(order)
                )))
            }
        }
    }

    fn order_list(order: &[AppointmentStatus]) -> String {
        order
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
