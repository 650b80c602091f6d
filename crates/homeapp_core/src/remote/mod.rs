//! Remote collaborators reached over the network.

pub mod advice_client;
