// Counsellor: fit scoring, the ACTION/PARAMS reply protocol, the advisor backends
// and the executor that applies advisor actions to a student's tasks and shortlist.

pub mod actions;
pub mod advisor;
pub mod context;
pub mod executor;
pub mod fit_scoring;
pub mod handlers;
pub mod history;
pub mod prompts;
