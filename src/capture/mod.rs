pub(crate) mod config;
pub(crate) mod renderer;
pub(crate) mod session;
