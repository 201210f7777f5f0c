// Task and shortlist tracking, plus the user stage transitions they drive.
// Queries are generic over `PgExecutor` so the chat action executor can run them
// inside its transaction and the REST handlers can run them on the pool.

pub mod handlers;
pub mod shortlist;
pub mod stage;
pub mod tasks;
