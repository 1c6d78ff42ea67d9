pub mod money;
pub mod order;
pub mod product;
pub mod user;

pub use order::{NewOrderLine, Order, OrderItem, OrderItemRow, OrderOwner, OrderRow, SalesSummary};
pub use product::{Product, ProductFields, ProductFilter};
pub use user::{NewUser, Role, RoleAssignment, User, UserRecord};
