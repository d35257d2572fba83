pub(crate) mod layout;
pub(crate) mod pixel;
pub(crate) mod scale;
pub(crate) mod unpremul;
