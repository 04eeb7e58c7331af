pub mod cart_state;

pub use cart_state::{CartLine, CartState};
