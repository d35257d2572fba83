pub(crate) mod buffer_pool;
