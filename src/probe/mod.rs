pub mod backend;
pub mod connectivity;

pub use connectivity::{ProbeResult, probe_client, probe_sites, probe_url};
