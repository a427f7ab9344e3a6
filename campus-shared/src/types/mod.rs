//! Wire types shared by every campus service.

pub mod api;
pub mod auth;
pub mod event;
pub mod pagination;

pub use api::{ApiErrorDetail, ApiErrorResponse, ApiResponse, HealthCheck, HealthResponse, HealthStatus};
pub use auth::{AuthUser, Claims, UserRole};
pub use event::Event;
pub use pagination::{Paginated, PaginationParams};
