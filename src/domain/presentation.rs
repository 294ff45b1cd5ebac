use super::session::CheckoutStatus;

/// Icon shown next to the payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIcon {
    Card,
    Spinner,
    Clock,
    Check,
    Cross,
    Alert,
}

/// Everything a front end needs to render the current payment status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    pub icon: StatusIcon,
    pub badge: Option<&'static str>,
    pub headline: &'static str,
    pub detail: Option<&'static str>,
}

impl StatusView {
    pub fn for_status(status: Option<CheckoutStatus>) -> Self {
        let (icon, badge, headline, detail) = match status {
            None => (StatusIcon::Card, None, "", None),
            Some(CheckoutStatus::Initiating) => (
                StatusIcon::Spinner,
                Some("Initiating"),
                "Initiating payment...",
                None,
            ),
            Some(CheckoutStatus::Pending) => (
                StatusIcon::Clock,
                Some("Pending"),
                "Waiting for payment confirmation...",
                Some("Please check your phone and enter M-Pesa PIN"),
            ),
            Some(CheckoutStatus::Completed) => (
                StatusIcon::Check,
                Some("Completed"),
                "Payment completed successfully!",
                Some("Your service request has been processed"),
            ),
            Some(CheckoutStatus::Failed) => {
                (StatusIcon::Cross, Some("Failed"), "Payment failed", None)
            }
            Some(CheckoutStatus::Timeout) => {
                (StatusIcon::Alert, Some("Timeout"), "Payment timeout", None)
            }
        };

        Self {
            icon,
            badge,
            headline,
            detail,
        }
    }
}
