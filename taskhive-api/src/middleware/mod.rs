/// Middleware modules for the API server
///
/// Identity verification lives in `crate::app` next to the router; this
/// module holds the standalone tower layers.

pub mod security;
