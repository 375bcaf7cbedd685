//! Clients for external services

pub mod artist_search_client;

pub use artist_search_client::ArtistSearchClient;
