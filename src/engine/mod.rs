pub(crate) mod reconstructor;
pub(crate) mod sink;
