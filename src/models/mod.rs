pub mod todo;
pub mod user;

pub use todo::{
    CreatedTodo, NewTodoRequest, Scope, Todo, TodosPage, UNKNOWN_OWNER, UpdateTodoRequest,
};
pub use user::{User, UsersPage};
