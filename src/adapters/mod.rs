pub mod api_errors;
pub mod http;
#[cfg(feature = "mock-psp")]
pub mod mock_psp;
pub mod psp_http;
