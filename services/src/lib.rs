//! Business rules that sit between the HTTP layer and the entities: the
//! check-in orchestrator, the face verification seam, lecturer session
//! lifecycle and the attendance views built on top of the ledger.

pub mod attendance;
pub mod check_in;
pub mod session_lifecycle;
pub mod verification;
