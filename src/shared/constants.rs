/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Global administrator, may manage every catalogue entry
pub const ROLE_SUPER_ADMIN: &str = "super_admin";

/// Catalogue administrator, may create, edit and delete districts and panchayats
pub const ROLE_ADMIN: &str = "admin";

// =============================================================================
// IMAGE FOLDERS
// =============================================================================

pub const DISTRICT_IMAGE_FOLDER: &str = "districts";

pub const GRAM_PANCHAYAT_IMAGE_FOLDER: &str = "gram-panchayats";
