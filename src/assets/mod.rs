pub(crate) mod image;
pub(crate) mod text;
