pub(crate) mod job;
pub(crate) mod worker_pool;
