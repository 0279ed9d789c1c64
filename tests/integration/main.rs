//! Integration tests for chaturbapi
//! These run the clients against a local HTTP server through the real reqwest transport

mod test_harness;

mod events_poller_test;
mod stats_client_test;
