pub mod todo_item_service;
mod todo_item_service_tests;
