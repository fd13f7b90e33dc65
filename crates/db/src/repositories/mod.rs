//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod activity;
pub mod analytics;
pub mod hierarchy;
pub mod qr_code;
pub mod session_claim;

pub use activity::{
    ActivityRepository, ClientDetails, GPS_UPDATE_WINDOW_MINUTES, NewScan, NewSocialClick,
};
pub use analytics::{AnalyticsRepository, QrScanCounts, SocialCounts, SocialScope};
pub use hierarchy::{
    CreateBranchInput, CreateClusterInput, CreateRegionInput, HierarchyError, HierarchyRepository,
    UpdateBranchInput, UpdateClusterInput, UpdateRegionInput,
};
pub use qr_code::{
    ActiveQrCode, CreateQrCodeInput, QrCodeError, QrCodeRepository, UpdateQrCodeInput,
};
pub use session_claim::SeaOrmClaimStore;
