pub mod catalog;
pub mod import;
pub mod membership;
pub mod recipes;
pub mod shopping_list;
pub mod subscriptions;
pub mod users;

pub use catalog::*;
pub use import::*;
pub use membership::*;
pub use recipes::*;
pub use shopping_list::*;
pub use subscriptions::*;
pub use users::*;
