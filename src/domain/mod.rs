pub mod repository;
pub mod todo_item;
