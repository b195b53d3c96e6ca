use crate::auth::Actor;
use crate::errors::AppError;

/// Everything an authenticated caller can ask of the scheduler. Each
/// transition and admin surface consults this single table instead of
/// sprinkling role checks around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CancelBooking,
    CompleteBooking,
    ReopenBooking,
    OverrideBookingStatus,
    ManageJobs,
    ManagePet,
    ViewBooking,
}

/// `owner_id` is the owning user of the resource, where the action has one.
pub fn authorize(actor: &Actor, action: Action, owner_id: Option<&str>) -> Result<(), AppError> {
    let allowed = match action {
        Action::CancelBooking | Action::ManagePet | Action::ViewBooking => {
            actor.is_admin() || owner_id == Some(actor.id.as_str())
        }
        Action::CompleteBooking
        | Action::ReopenBooking
        | Action::OverrideBookingStatus
        | Action::ManageJobs => actor.is_admin(),
    };

    if allowed {
        Ok(())
    } else {
        Err(AppError::Forbidden(match action {
            Action::CancelBooking => "only the booking owner or an admin may cancel".to_string(),
            Action::CompleteBooking => "only an admin may complete a booking".to_string(),
            Action::ReopenBooking => "only an admin may reopen a booking".to_string(),
            Action::OverrideBookingStatus => "only an admin may override status".to_string(),
            Action::ManageJobs => "only an admin may manage jobs".to_string(),
            Action::ManagePet => "only the pet owner or an admin may do this".to_string(),
            Action::ViewBooking => "only the booking owner or an admin may view it".to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn actor(id: &str, role: Role) -> Actor {
        Actor {
            id: id.to_string(),
            role,
        }
    }

    #[test]
    fn test_owner_may_cancel_own_booking() {
        let a = actor("u-1", Role::Customer);
        assert!(authorize(&a, Action::CancelBooking, Some("u-1")).is_ok());
    }

    #[test]
    fn test_other_customer_may_not_cancel() {
        let a = actor("u-2", Role::Customer);
        let err = authorize(&a, Action::CancelBooking, Some("u-1")).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_admin_may_do_everything() {
        let a = actor("admin-1", Role::Admin);
        for action in [
            Action::CancelBooking,
            Action::CompleteBooking,
            Action::ReopenBooking,
            Action::OverrideBookingStatus,
            Action::ManageJobs,
            Action::ManagePet,
            Action::ViewBooking,
        ] {
            assert!(authorize(&a, action, Some("someone-else")).is_ok());
        }
    }

    #[test]
    fn test_customer_may_not_complete_or_reopen() {
        let a = actor("u-1", Role::Customer);
        // Not even on their own booking.
        assert!(authorize(&a, Action::CompleteBooking, Some("u-1")).is_err());
        assert!(authorize(&a, Action::ReopenBooking, Some("u-1")).is_err());
        assert!(authorize(&a, Action::OverrideBookingStatus, Some("u-1")).is_err());
        assert!(authorize(&a, Action::ManageJobs, None).is_err());
    }
}
