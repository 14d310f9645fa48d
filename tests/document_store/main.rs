
mod concurrency;
mod eviction;
mod lifecycle;
mod search;
mod undo;
