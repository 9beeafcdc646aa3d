pub mod utils;

mod config;
mod import;
mod shopping_list;
mod subscriptions;
