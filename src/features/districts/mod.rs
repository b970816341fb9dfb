//! District catalogue: public browsing and admin management.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | GET | `/api/districts` | No | Paginated list, `status` / `search` filters |
//! | GET | `/api/districts/map` | No | Map markers for active districts |
//! | GET | `/api/districts/slug/{slug}` | No | District detail by slug |
//! | GET | `/api/district/{id}` | No | District detail by id |
//! | POST | `/api/districts` | Admin | Create (JSON or multipart) |
//! | PUT | `/api/district/{id}` | Admin | Partial update (JSON or multipart) |
//! | DELETE | `/api/district/{id}` | Admin | Cascading delete |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use services::DistrictService;
