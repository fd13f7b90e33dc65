//! `SeaORM` entity definitions.

pub mod branches;
pub mod clusters;
pub mod qr_codes;
pub mod qr_scans;
pub mod regions;
pub mod session_first_seen;
pub mod social_clicks;
