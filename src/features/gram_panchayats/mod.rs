//! Gram panchayats, each belonging to a district.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | GET | `/api/gram-panchayats` | No | Paginated list, `districtId` / `status` / `search` filters |
//! | GET | `/api/gram-panchayat/{id}` | No | Detail with parent district |
//! | POST | `/api/gram-panchayats` | Admin | Create (JSON or multipart) |
//! | PUT | `/api/gram-panchayat/{id}` | Admin | Partial update (JSON or multipart) |
//! | DELETE | `/api/gram-panchayat/{id}` | Admin | Delete with header image cleanup |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use services::GramPanchayatService;
