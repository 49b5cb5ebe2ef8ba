pub(crate) mod external;
pub(crate) mod fallback;
pub(crate) mod mask;
pub(crate) mod orchestrator;
pub(crate) mod progress;
