// ============================================================================
// Ordering Domain - order lifecycle
// ============================================================================
//
// - model.rs    - Order entity, OrderItem, OrderStatus, Address
// - events.rs   - OrderEvent
// - errors.rs   - OrderError
// - commands.rs - PlaceOrder, ConfirmOrder, ShipOrder, ...
// - queries.rs  - GetOrderById, ListCustomerOrders
// - dto.rs      - OrderDto
// - handlers.rs - OrderHandlers and registration
//
// Lifecycle: Pending → Confirmed → Shipped → Delivered
//            Pending | Confirmed → Cancelled
//
// ============================================================================

pub mod commands;
pub mod dto;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod model;
pub mod queries;

pub use commands::*;
pub use dto::*;
pub use errors::*;
pub use events::*;
pub use handlers::{register, OrderHandlers};
pub use model::*;
pub use queries::*;
