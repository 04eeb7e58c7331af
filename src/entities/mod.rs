/// Persistence entities for the storefront
pub mod cart;
pub mod cart_item;
pub mod gym;
pub mod payment;
pub mod program;
pub mod purchased_program;
pub mod user;

// Re-export entities
pub use cart::{Entity as Cart, Model as CartModel};
pub use cart_item::{Entity as CartItem, Model as CartItemModel};
pub use gym::{Entity as Gym, Model as GymModel};
pub use payment::{Entity as Payment, Model as PaymentModel};
pub use program::{Entity as Program, Model as ProgramModel, ProgramLevel};
pub use purchased_program::{Entity as PurchasedProgram, Model as PurchasedProgramModel};
pub use user::{Entity as User, Model as UserModel, UserRole};
