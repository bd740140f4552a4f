use crate::models::ServiceKind;

/// Number of sub-form steps each service kind walks through.
pub fn total_steps(kind: ServiceKind) -> u32 {
    match kind {
        ServiceKind::Flights => 3,
        ServiceKind::Hotel => 2,
        ServiceKind::Car => 2,
        ServiceKind::Activities => 2,
    }
}
