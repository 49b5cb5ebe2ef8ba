pub(crate) mod optimize;
pub(crate) mod validate;
