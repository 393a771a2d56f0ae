pub(crate) mod config;
pub(crate) mod css;
pub(crate) mod presenter;
pub(crate) mod state;
