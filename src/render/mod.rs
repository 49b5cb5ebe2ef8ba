pub(crate) mod compositor;
pub(crate) mod mobile;
pub(crate) mod text;
